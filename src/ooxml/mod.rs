//! Office Open XML (OOXML) format implementation.
//!
//! The module is organized into two layers:
//!
//! 1. **OPC Layer** (`opc`): Low-level package handling (ZIP, parts, relationships)
//! 2. **Presentation Layer** (`pptx`): the PresentationML graph on top of it
//!
//! # Example
//!
//! ```rust,no_run
//! use deckweave::ooxml::pptx::Package;
//!
//! let pkg = Package::open("deck.pptx")?;
//! for (i, entry) in pkg.slide_entries()?.iter().enumerate() {
//!     println!("{}: {} ({})", i, entry.partname, pkg.slide_title(i)?.unwrap_or_default());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod opc;
pub mod pptx;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};
