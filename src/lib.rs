//! Deckweave - structural editing for PowerPoint (.pptx) packages
//!
//! This library edits the relationship graph of a presentation package:
//! the slide-order list, the masters and layouts slides are built on, and
//! the relationships that tie parts together. Every edit keeps the graph
//! consistent, and a separate validator re-reads the serialized bytes to
//! check it.
//!
//! # Features
//!
//! - **OPC layer**: parts, per-part relationship tables and partname resolution
//! - **Structural mutators**: create, delete, move slides and rewire layouts
//! - **Content operations**: text rewriting, shape text with list styles, slide size
//! - **Operation plans**: JSON or YAML plans applied all-or-nothing
//! - **Validator**: independent structural check of a saved package
//!
//! # Example - Applying a plan
//!
//! ```no_run
//! use deckweave::ops::{ApplyOptions, OperationPlan, apply_ops};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let plan = OperationPlan::from_file("plan.yaml")?;
//! let options = ApplyOptions {
//!     verify: true,
//!     ..ApplyOptions::default()
//! };
//! let result = apply_ops(
//!     Some(Path::new("template.pptx")),
//!     &plan,
//!     Path::new("out.pptx"),
//!     &options,
//!     None,
//! )?;
//! println!("applied {} operations", result.operations_applied);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Verifying a package
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = deckweave::ooxml::pptx::verify_file("deck.pptx")?;
//! for issue in &report.issues {
//!     println!("{}", issue);
//! }
//! # Ok(())
//! # }
//! ```

/// Shared infrastructure: the crate error type and the XML element tree.
pub mod common;

/// OOXML packages: the OPC graph and the PowerPoint presentation layer.
pub mod ooxml;

/// Operation plans and the all-or-nothing pipeline.
pub mod ops;

#[cfg(test)]
mod test_support;

pub use common::{Error, Result};
pub use ooxml::pptx::{OrphanPolicy, Package};
pub use ops::{ApplyOptions, ApplyResult, Operation, OperationPlan, SlideCopier, apply_all, apply_ops};
