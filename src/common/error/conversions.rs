//! Error conversion implementations.
//!
//! Lookup misses from the package layer surface as [`Error::ReferenceNotFound`];
//! everything else keeps its OPC classification.

use super::types::Error;
use crate::common::xml::XmlTreeError;
use crate::ooxml::opc::OpcError;

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::PartNotFound(s) => Error::ReferenceNotFound(format!("part {}", s)),
            OpcError::RelationshipNotFound(s) => {
                Error::ReferenceNotFound(format!("relationship {}", s))
            },
            OpcError::IoError(e) => Error::Io(e),
            OpcError::XmlError(s) => Error::Xml(s),
            other => Error::Opc(other),
        }
    }
}

impl From<XmlTreeError> for Error {
    fn from(err: XmlTreeError) -> Self {
        Error::Xml(err.0)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Opc(OpcError::ZipError(err))
    }
}
