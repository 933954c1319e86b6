//! Crate-level error type.
//!
//! Every public operation reports one of the [`Error`] kinds; lower layers
//! (`OpcError`, XML tree errors, IO) are folded in by the conversions module.

pub mod conversions;
pub mod types;

pub use types::{Error, Result, check_index};
