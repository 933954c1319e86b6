//! Package parts.
//!
//! A part is a named, typed blob with its own relationship table. XML parts are
//! parsed into an [`XmlElement`] tree the first time they are read, and only
//! re-serialized when they have been borrowed mutably; untouched parts are
//! written back byte for byte.

use crate::common::xml::XmlElement;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
use once_cell::unsync::OnceCell;
use std::borrow::Cow;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Part {
    partname: PackURI,
    content_type: String,
    /// Content as loaded, shared so cloning a package stays cheap.
    blob: Arc<Vec<u8>>,
    element: OnceCell<XmlElement>,
    modified: bool,
    rels: Relationships,
}

impl Part {
    /// A part holding `blob` as loaded from a package.
    pub fn load(partname: PackURI, content_type: impl Into<String>, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri());
        Self {
            partname,
            content_type: content_type.into(),
            blob: Arc::new(blob),
            element: OnceCell::new(),
            modified: false,
            rels,
        }
    }

    /// A new XML part built in memory.
    pub fn new_xml(partname: PackURI, content_type: impl Into<String>, element: XmlElement) -> Self {
        let rels = Relationships::new(partname.base_uri());
        Self {
            partname,
            content_type: content_type.into(),
            blob: Arc::new(Vec::new()),
            element: OnceCell::with_value(element),
            modified: true,
            rels,
        }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Whether the content type denotes XML.
    #[inline]
    pub fn is_xml(&self) -> bool {
        is_xml_content_type(&self.content_type)
    }

    /// Current serialized content.
    pub fn blob(&self) -> Cow<'_, [u8]> {
        match self.element.get() {
            Some(element) if self.modified => Cow::Owned(element.to_xml().into_bytes()),
            _ => Cow::Borrowed(self.blob.as_slice()),
        }
    }

    /// Parsed XML content, parsing on first access.
    pub fn xml(&self) -> Result<&XmlElement> {
        if !self.is_xml() {
            return Err(OpcError::XmlError(format!(
                "{} has non-XML content type {}",
                self.partname, self.content_type
            )));
        }
        self.element.get_or_try_init(|| {
            XmlElement::parse(&self.blob)
                .map_err(|e| OpcError::XmlError(format!("{}: {}", self.partname, e)))
        })
    }

    /// Mutable XML content. The part is re-serialized on save from now on.
    pub fn xml_mut(&mut self) -> Result<&mut XmlElement> {
        self.xml()?;
        self.modified = true;
        self.element
            .get_mut()
            .ok_or_else(|| OpcError::XmlError(format!("{} was not parsed", self.partname)))
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Add a relationship of `reltype` to `target`, returning the new id.
    pub fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        self.rels.add(reltype, target)
    }

    /// Resolve the internal target of relationship `r_id`.
    pub fn target_partname(&self, r_id: &str) -> Result<PackURI> {
        self.rels
            .get(r_id)
            .ok_or_else(|| {
                OpcError::RelationshipNotFound(format!("{} in {}", r_id, self.partname))
            })?
            .target_partname()
    }

    /// Resolve the single relationship of `reltype`.
    pub fn part_related_by(&self, reltype: &str) -> Result<PackURI> {
        self.rels.part_with_reltype(reltype)?.target_partname()
    }
}

/// Content types that carry XML: `*+xml`, `application/xml`, `text/xml`.
pub fn is_xml_content_type(content_type: &str) -> bool {
    content_type.ends_with("+xml") || content_type.ends_with("/xml")
}
