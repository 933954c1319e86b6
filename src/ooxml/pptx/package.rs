/// Package implementation for PowerPoint presentations.
use crate::common::error::{Error, Result};
use crate::common::xml::XmlElement;
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::{OpcPackage, PackURI, Part};
use std::path::Path;
use tracing::{debug, info};

/// What happens on save to parts that nothing references any more.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Write every part, referenced or not.
    #[default]
    Preserve,
    /// Drop every part unreachable from the package relationships.
    Compact,
}

/// An editable PowerPoint (.pptx) package.
///
/// Owns the OPC package exclusively; every structural edit goes through the
/// methods defined on this type across the `pptx` modules.
///
/// # Examples
///
/// ```rust,no_run
/// use deckweave::ooxml::pptx::{OrphanPolicy, Package};
///
/// let mut pkg = Package::open("deck.pptx")?;
/// pkg.move_slide(0, 2)?;
/// pkg.save("deck-edited.pptx", OrphanPolicy::Preserve)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Package {
    opc: OpcPackage,
    pres_partname: PackURI,
}

impl Package {
    /// Open a .pptx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let pkg = Self::from_bytes(&data)?;
        info!(path = %path.display(), parts = pkg.opc.part_count(), "presentation loaded");
        Ok(pkg)
    }

    /// Load a package from the bytes of a .pptx archive.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let opc = OpcPackage::from_bytes(data)
            .map_err(|e| Error::PackageUnreadable(e.to_string()))?;
        Self::from_opc(opc)
    }

    /// Wrap an OPC package whose main document is a presentation.
    pub fn from_opc(opc: OpcPackage) -> Result<Self> {
        let pres_partname = opc
            .main_document_partname()
            .map_err(|e| Error::PackageUnreadable(format!("main presentation part: {}", e)))?;
        let main_part = opc
            .part(&pres_partname)
            .map_err(|e| Error::PackageUnreadable(format!("main presentation part: {}", e)))?;

        let content_type = main_part.content_type();
        if !ct::PRESENTATION_ROOTS.contains(&content_type) {
            return Err(Error::PackageUnreadable(format!(
                "{} has content type {}, not a presentation",
                pres_partname, content_type
            )));
        }

        let root = main_part
            .xml()
            .map_err(|e| Error::PackageUnreadable(e.to_string()))?;
        if root.local_name() != "presentation" {
            return Err(Error::PackageUnreadable(format!(
                "{} has root element {}",
                pres_partname,
                root.name()
            )));
        }

        debug!(partname = %pres_partname, "presentation part found");
        Ok(Self { opc, pres_partname })
    }

    /// Get the underlying OPC package.
    #[inline]
    pub fn opc(&self) -> &OpcPackage {
        &self.opc
    }

    #[inline]
    pub fn opc_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }

    /// Partname of the root presentation part.
    #[inline]
    pub fn presentation_partname(&self) -> &PackURI {
        &self.pres_partname
    }

    pub(crate) fn pres_part(&self) -> Result<&Part> {
        Ok(self.opc.part(&self.pres_partname)?)
    }

    pub(crate) fn pres_part_mut(&mut self) -> Result<&mut Part> {
        Ok(self.opc.part_mut(&self.pres_partname)?)
    }

    pub(crate) fn pres_xml(&self) -> Result<&XmlElement> {
        Ok(self.pres_part()?.xml()?)
    }

    pub(crate) fn pres_xml_mut(&mut self) -> Result<&mut XmlElement> {
        Ok(self.pres_part_mut()?.xml_mut()?)
    }

    /// Serialize to the bytes of a .pptx archive.
    pub fn to_bytes(&self, orphans: OrphanPolicy) -> Result<Vec<u8>> {
        match orphans {
            OrphanPolicy::Preserve => Ok(self.opc.to_bytes()?),
            OrphanPolicy::Compact => {
                let mut compacted = self.opc.clone();
                let dropped = compacted.drop_unreachable();
                debug!(dropped = dropped.len(), "compacted package");
                Ok(compacted.to_bytes()?)
            },
        }
    }

    /// Serialize and write to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P, orphans: OrphanPolicy) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes(orphans)?;
        std::fs::write(path, bytes)?;
        info!(path = %path.display(), "presentation saved");
        Ok(())
    }
}

/// Prefix bound to the office relationships namespace on `root`, `r` when undeclared.
pub(crate) fn rels_prefix(root: &XmlElement) -> String {
    root.namespace_prefix(namespace::OFC_RELATIONSHIPS)
        .unwrap_or("r")
        .to_string()
}
