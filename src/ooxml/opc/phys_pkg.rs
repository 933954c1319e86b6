//! Physical (ZIP) container of an OPC package.
//!
//! Reading decompresses every member up front into a name-keyed map, since
//! the package graph touches nearly all of them anyway. Writing deflates each
//! member into an in-memory archive.

use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// All members of a ZIP-based package, keyed by member name.
pub struct PhysPkgReader {
    members: BTreeMap<String, Vec<u8>>,
}

impl PhysPkgReader {
    /// Decompress every file member of the archive in `data`.
    ///
    /// Directory entries are skipped.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut members = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            members.insert(file.name().trim_start_matches('/').to_string(), blob);
        }

        Ok(Self { members })
    }

    /// Content of the member backing `pack_uri`, if present.
    #[inline]
    pub fn blob_for(&self, pack_uri: &PackURI) -> Option<&[u8]> {
        self.members.get(pack_uri.membername()).map(Vec::as_slice)
    }

    #[inline]
    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.members.contains_key(pack_uri.membername())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member names in sorted order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Take ownership of all members.
    pub fn into_members(self) -> BTreeMap<String, Vec<u8>> {
        self.members
    }
}

/// Writer that builds a ZIP-based package in memory.
pub struct PhysPkgWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PhysPkgWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Write `blob` as the member backing `pack_uri`.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        self.zip.start_file(pack_uri.membername(), self.options)?;
        self.zip.write_all(blob)?;
        Ok(())
    }

    /// Finish the archive and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.zip.finish()?.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}
