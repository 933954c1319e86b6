//! Package writer for OPC packages.
//!
//! Serializes an [`OpcPackage`] into a ZIP archive: a regenerated
//! `[Content_Types].xml`, the package relationships, then every part followed
//! by its relationships item.

use crate::common::xml::escape_attr;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use std::collections::BTreeMap;

pub struct PackageWriter;

impl PackageWriter {
    /// Serialize an OPC package to the bytes of a ZIP archive.
    pub fn to_bytes(package: &OpcPackage) -> Result<Vec<u8>> {
        let mut phys_writer = PhysPkgWriter::new();

        let cti = ContentTypesItem::from_package(package);
        phys_writer.write(&PackURI::new(CONTENT_TYPES_URI)?, cti.to_xml().as_bytes())?;

        let package_uri = PackURI::new(PACKAGE_URI)?;
        phys_writer.write(&package_uri.rels_uri(), package.rels().to_xml().as_bytes())?;

        for part in package.iter_parts() {
            phys_writer.write(part.partname(), &part.blob())?;
            if !part.rels().is_empty() {
                phys_writer.write(
                    &part.partname().rels_uri(),
                    part.rels().to_xml().as_bytes(),
                )?;
            }
        }

        phys_writer.finish()
    }
}

/// `[Content_Types].xml` builder.
///
/// A part's content type becomes an extension default when the source package
/// declared it that way or it is the conventional type for the extension;
/// otherwise it is recorded as a partname override.
struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    fn from_package(package: &OpcPackage) -> Self {
        let mut cti = Self::new();
        let declared = package.default_content_types();

        for part in package.iter_parts() {
            let ext = part.partname().ext().to_ascii_lowercase();
            let content_type = part.content_type();
            let is_default = declared.get(&ext).map(String::as_str) == Some(content_type)
                || ct::default_for_ext(&ext) == Some(content_type);

            if is_default && !ext.is_empty() {
                cti.defaults.insert(ext, content_type.to_string());
            } else {
                cti.overrides
                    .insert(part.partname().to_string(), content_type.to_string());
            }
        }

        cti
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + 160 * (self.defaults.len() + self.overrides.len()));

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );

        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_attr(ext),
                escape_attr(content_type)
            ));
        }
        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_attr(partname),
                escape_attr(content_type)
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}
