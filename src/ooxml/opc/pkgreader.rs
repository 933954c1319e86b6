//! Low-level, read-only view of a serialized OPC package.
//!
//! The reader turns the physical members of a package into serialized parts:
//! content types come from `[Content_Types].xml`, relationships from the
//! `_rels/*.rels` items. Every member becomes a part, whether or not it is
//! reachable from the package relationships, so an edit never silently drops
//! content.

use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use quick_xml::Reader;
use quick_xml::events::Event;
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Content type used when neither an override nor a default matches.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Part as loaded from the physical package.
#[derive(Debug)]
pub struct SerializedPart {
    pub partname: PackURI,
    pub content_type: String,
    pub blob: Vec<u8>,
    pub srels: SmallVec<[SerializedRelationship; 8]>,
}

/// Relationship as read from a `.rels` item.
#[derive(Debug, Clone)]
pub struct SerializedRelationship {
    pub r_id: String,
    pub reltype: String,
    pub target_ref: String,
    pub target_mode: String,
}

impl SerializedRelationship {
    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_mode == target_mode::EXTERNAL
    }
}

/// Content type lookup built from `[Content_Types].xml`.
///
/// Overrides by partname win over defaults by extension.
#[derive(Debug, Default)]
pub struct ContentTypeMap {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let (key_attr, is_default): (&[u8], bool) = match e.local_name().as_ref() {
                        b"Default" => (&b"Extension"[..], true),
                        b"Override" => (&b"PartName"[..], false),
                        // Never matches an attribute, so nothing is recorded.
                        _ => (&b""[..], false),
                    };

                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == key_attr {
                            key = Some(attr.unescape_value()?.to_string());
                        } else if attr.key.as_ref() == b"ContentType" {
                            content_type = Some(attr.unescape_value()?.to_string());
                        }
                    }

                    if let (Some(key), Some(ct)) = (key, content_type) {
                        if is_default {
                            map.defaults.insert(key.to_ascii_lowercase(), ct);
                        } else {
                            map.overrides.insert(key.to_ascii_lowercase(), ct);
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Content type of `pack_uri`.
    pub fn get(&self, pack_uri: &PackURI) -> Option<&str> {
        self.overrides
            .get(&pack_uri.as_str().to_ascii_lowercase())
            .or_else(|| self.defaults.get(&pack_uri.ext().to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Extension defaults declared by the package.
    pub fn defaults(&self) -> &HashMap<String, String> {
        &self.defaults
    }
}

/// Parsed package contents: package relationships and every part.
pub struct PackageReader {
    pkg_srels: SmallVec<[SerializedRelationship; 8]>,
    sparts: Vec<SerializedPart>,
    content_types: ContentTypeMap,
}

impl PackageReader {
    pub fn from_phys_reader(phys_reader: PhysPkgReader) -> Result<Self> {
        let mut members = phys_reader.into_members();

        let content_types_xml = members
            .remove(CONTENT_TYPES_URI.trim_start_matches('/'))
            .ok_or_else(|| OpcError::PartNotFound("[Content_Types].xml".to_string()))?;
        let content_types = ContentTypeMap::from_xml(&content_types_xml)?;

        // Split relationship items from content members.
        let mut rels_items: BTreeMap<PackURI, Vec<u8>> = BTreeMap::new();
        let mut content: Vec<(PackURI, Vec<u8>)> = Vec::with_capacity(members.len());
        for (membername, blob) in members {
            let uri = PackURI::from_membername(&membername)?;
            match uri.rels_source() {
                Some(source) => {
                    rels_items.insert(source, blob);
                },
                None => content.push((uri, blob)),
            }
        }

        let package_uri = PackURI::new(PACKAGE_URI)?;
        let pkg_srels = match rels_items.remove(&package_uri) {
            Some(xml) => parse_rels_xml(&xml)?,
            None => SmallVec::new(),
        };

        let mut sparts = Vec::with_capacity(content.len());
        for (partname, blob) in content {
            let srels = match rels_items.remove(&partname) {
                Some(xml) => parse_rels_xml(&xml)?,
                None => SmallVec::new(),
            };
            let content_type = match content_types.get(&partname) {
                Some(ct) => ct.to_string(),
                None => {
                    warn!(partname = %partname, "no content type declared, using fallback");
                    FALLBACK_CONTENT_TYPE.to_string()
                },
            };
            sparts.push(SerializedPart {
                partname,
                content_type,
                blob,
                srels,
            });
        }

        for orphan in rels_items.keys() {
            warn!(source = %orphan, "dropping relationships of a missing part");
        }
        debug!(parts = sparts.len(), "package members loaded");

        Ok(Self {
            pkg_srels,
            sparts,
            content_types,
        })
    }

    pub fn pkg_srels(&self) -> &[SerializedRelationship] {
        &self.pkg_srels
    }

    pub fn iter_sparts(&self) -> impl Iterator<Item = &SerializedPart> {
        self.sparts.iter()
    }

    /// Take apart into package relationships, parts and content types.
    pub fn into_parts(
        self,
    ) -> (
        SmallVec<[SerializedRelationship; 8]>,
        Vec<SerializedPart>,
        ContentTypeMap,
    ) {
        (self.pkg_srels, self.sparts, self.content_types)
    }
}

/// Parse a `.rels` item. Relationships missing `Id`, `Type` or `Target` are skipped.
pub fn parse_rels_xml(rels_xml: &[u8]) -> Result<SmallVec<[SerializedRelationship; 8]>> {
    let mut srels = SmallVec::new();
    let mut reader = Reader::from_reader(rels_xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target_ref = None;
                    let mut mode = target_mode::INTERNAL.to_string();

                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Id" => r_id = Some(attr.unescape_value()?.to_string()),
                            b"Type" => reltype = Some(attr.unescape_value()?.to_string()),
                            b"Target" => target_ref = Some(attr.unescape_value()?.to_string()),
                            b"TargetMode" => mode = attr.unescape_value()?.to_string(),
                            _ => {},
                        }
                    }

                    if let (Some(r_id), Some(reltype), Some(target_ref)) = (r_id, reltype, target_ref)
                    {
                        srels.push(SerializedRelationship {
                            r_id,
                            reltype,
                            target_ref,
                            target_mode: mode,
                        });
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(OpcError::XmlError(format!("Rels parse error: {}", e))),
            _ => {},
        }
        buf.clear();
    }

    Ok(srels)
}
