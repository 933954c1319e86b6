//! PowerPoint (.pptx) presentation editing.
//!
//! A [`Package`] exclusively owns an OPC package and edits its presentation
//! graph: the root presentation part, its slide-order list and master
//! roster, the masters' layouts and the slides built on them.
//!
//! - `presentation`: read-side queries (slide entries, masters, layouts, size)
//! - `slides`: structural mutators (create, delete, move, relayout)
//! - `shape`, `placeholder`, `text`: shape lookup and text frame primitives
//! - `verify`: validation of a serialized package, independent of the model
//!
//! # Example
//!
//! ```rust,no_run
//! use deckweave::ooxml::pptx::{OrphanPolicy, Package};
//!
//! let mut pkg = Package::open("template.pptx")?;
//! let index = pkg.create_slide_on_layout(1, Some("Agenda"), Some("Intro\nDemo"))?;
//! pkg.move_slide(index, 0)?;
//!
//! let bytes = pkg.to_bytes(OrphanPolicy::Preserve)?;
//! assert!(deckweave::ooxml::pptx::verify::validate(&bytes).is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod package;
pub mod placeholder;
pub mod presentation;
pub mod shape;
pub mod slides;
pub mod text;
pub mod verify;

pub use package::{OrphanPolicy, Package};
pub use placeholder::{Placeholder, PlaceholderType};
pub use presentation::{SlideEntry, SlideSize};
pub use shape::{ShapeTarget, ShapeType};
pub use text::{ListStyle, ParagraphSpec};
pub use verify::{VerifyReport, validate, verify_file};
