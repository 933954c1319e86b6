//! Common types and utilities shared by the package and presentation layers.

pub mod error;
pub mod xml;

pub use error::{Error, Result};
