/// Open Packaging Conventions (OPC) implementation.
///
/// The package layer of a presentation: a ZIP container of named parts, a
/// `[Content_Types].xml` index and per-part relationship tables. It knows
/// nothing about slides; the presentation model in `ooxml::pptx` is built on
/// top of it.
///
/// - [`PackURI`]: absolute part names and relationship target resolution
/// - [`Relationships`]: ordered, id-labelled edges with never-reused ids
/// - [`Part`]: named, typed content with lazily parsed XML
/// - [`OpcPackage`]: the part map plus package-level relationships

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use error::OpcError;
pub use package::{OpcPackage, RemoveMode};
pub use packuri::PackURI;
pub use part::Part;
pub use rel::{Relationship, Relationships};
