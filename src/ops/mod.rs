//! Operation plans and the pipeline that applies them.
//!
//! An [`OperationPlan`] is an ordered list of [`Operation`] records, parsed
//! from JSON or YAML. [`apply_all`] runs it against a [`Package`] in memory;
//! [`apply_ops`] adds loading, verification and atomic output on top.
//!
//! Cross-package slide copies are delegated to a [`SlideCopier`].
//!
//! [`Package`]: crate::ooxml::pptx::Package

pub mod copy;
pub mod model;
pub mod pipeline;
pub mod plan;

pub use copy::SlideCopier;
pub use model::{
    CopyMode, CopySlideOp, CreateSlideOnLayoutOp, DeleteSlideOp, MoveSlideOp, Occurrence,
    Operation, RewriteTextOp, SetShapeTextOp, SetSlideLayoutOp, SetSlideSizeOp, SizePreset,
};
pub use pipeline::{ApplyOptions, ApplyResult, apply_all, apply_ops};
pub use plan::OperationPlan;
