use thiserror::Error;

/// Main error type for deckweave operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A slide, layout or reuse-library index outside the valid range.
    #[error("{what} out of range: {index}, total={count}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// A required part, relationship, shape or text could not be found.
    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    /// Mutually exclusive or missing inputs.
    #[error("Input conflict: {0}")]
    InputConflict(String),

    /// The input file is not a usable presentation package.
    #[error("Package unreadable: {0}")]
    PackageUnreadable(String),

    /// The operation plan could not be parsed.
    #[error("Invalid operation plan: {0}")]
    InvalidPlan(String),

    /// Strict verification rejected the serialized package.
    #[error("Package verification failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    /// A capability that is not available in this configuration.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Package-level failure that is not a lookup miss.
    #[error("OPC error: {0}")]
    Opc(crate::ooxml::opc::OpcError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for deckweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fail with [`Error::IndexOutOfRange`] unless `index < count`.
#[inline]
pub fn check_index(what: &'static str, index: usize, count: usize) -> Result<()> {
    if index < count {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { what, index, count })
    }
}
