//! The operation pipeline.
//!
//! Operations run in plan order against one exclusively owned [`Package`].
//! The first failing operation aborts the run and leaves the caller's package
//! untouched. Output is serialized only after the whole plan succeeded, and
//! written atomically.

use crate::common::error::{Error, Result};
use crate::ooxml::pptx::shape::{has_text_frame, is_shape, shape_tree_mut, text_body_mut};
use crate::ooxml::pptx::text::{replace_in_text_frame, write_paragraphs};
use crate::ooxml::pptx::{OrphanPolicy, Package, ShapeTarget, validate};
use crate::ops::copy::SlideCopier;
use crate::ops::model::{Occurrence, Operation, RewriteTextOp, SetShapeTextOp};
use crate::ops::plan::OperationPlan;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Settings for [`apply_ops`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Validate the serialized package before writing it.
    pub verify: bool,
    /// Treat validation issues as a failure instead of a warning.
    pub strict_verify: bool,
    pub orphans: OrphanPolicy,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            verify: false,
            strict_verify: true,
            orphans: OrphanPolicy::Preserve,
        }
    }
}

/// Outcome of a successful [`apply_ops`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub output_path: PathBuf,
    pub operations_applied: usize,
    /// Validation issues tolerated in lenient mode; empty otherwise.
    pub verify_issues: Vec<String>,
}

/// Apply every operation of `plan` to `package`, in order.
///
/// All or nothing: on error `package` is left exactly as it was. Returns the
/// number of operations applied.
pub fn apply_all(
    package: &mut Package,
    plan: &OperationPlan,
    mut copier: Option<&mut dyn SlideCopier>,
) -> Result<usize> {
    plan.validate()?;
    if plan.needs_copier() && copier.is_none() {
        return Err(Error::Unsupported(
            "copy_slide requires a slide copier".to_string(),
        ));
    }

    let mut work = package.clone();
    for (step, op) in plan.operations.iter().enumerate() {
        debug!(step, op = op.kind(), "applying operation");
        let step_copier = copier
            .as_mut()
            .map(|c| &mut **c as &mut dyn SlideCopier);
        apply_one(&mut work, plan, op, step_copier)?;
    }

    *package = work;
    Ok(plan.operations.len())
}

fn apply_one(
    package: &mut Package,
    plan: &OperationPlan,
    op: &Operation,
    copier: Option<&mut dyn SlideCopier>,
) -> Result<()> {
    match op {
        Operation::CopySlide(copy) => {
            let source = plan.copy_source(copy.source_path.as_deref(), copy.reuse_library_index)?;
            let copier = copier.ok_or_else(|| {
                Error::Unsupported("copy_slide requires a slide copier".to_string())
            })?;
            copier.copy_slide(package, &source, copy.source_slide_index, copy.mode)
        },
        Operation::CreateSlideOnLayout(create) => package
            .create_slide_on_layout(
                create.layout_index,
                create.title.as_deref(),
                create.body.as_deref(),
            )
            .map(|_| ()),
        Operation::DeleteSlide(delete) => package.delete_slide(delete.slide_index),
        Operation::MoveSlide(mv) => package.move_slide(mv.from_index, mv.to_index),
        Operation::SetSlideLayout(relayout) => {
            package.set_slide_layout(relayout.slide_index, relayout.layout_index)
        },
        Operation::RewriteText(rewrite) => rewrite_text(package, rewrite),
        Operation::SetShapeText(set) => set_shape_text(package, set),
        Operation::SetSlideSize(size) => package.set_slide_size(size.size()?),
    }
}

/// Replace text shape by shape, matching against each frame's full text.
fn rewrite_text(package: &mut Package, op: &RewriteTextOp) -> Result<()> {
    let only = match &op.shape_name {
        Some(name) => Some(package.resolve_shape(op.slide_index, &ShapeTarget::Name(name.clone()))?),
        None => None,
    };
    let first_only = op.occurrence == Occurrence::First;

    let replaced = package.edit_slide(op.slide_index, |root| {
        let Some(tree) = shape_tree_mut(root) else {
            return Ok(false);
        };
        let mut replaced = false;
        for (position, shape) in tree.children_mut().filter(|el| is_shape(el)).enumerate() {
            if only.is_some_and(|wanted| wanted != position) {
                continue;
            }
            let Some(tx_body) = shape.child_mut("txBody") else {
                continue;
            };
            if replace_in_text_frame(tx_body, &op.find, &op.replace, first_only) {
                replaced = true;
                if first_only {
                    break;
                }
            }
        }
        Ok(replaced)
    })?;

    if !replaced {
        return Err(Error::ReferenceNotFound(format!(
            "rewrite_text cannot find target text on slide {}: {:?}",
            op.slide_index, op.find
        )));
    }
    Ok(())
}

fn set_shape_text(package: &mut Package, op: &SetShapeTextOp) -> Result<()> {
    let target = op.target()?;
    let paragraphs = op.payload();
    package.edit_shape(op.slide_index, &target, |shape| {
        if !has_text_frame(shape) {
            return Err(Error::ReferenceNotFound(format!(
                "target shape has no text frame: {}",
                target
            )));
        }
        write_paragraphs(text_body_mut(shape), &paragraphs);
        Ok(())
    })
}

/// Load `template`, apply `plan`, and write the result to `output`.
///
/// The template is the explicit argument, else the plan's `template_pptx`.
/// With `verify` set the serialized bytes are validated before anything is
/// written; in strict mode any issue fails the run.
pub fn apply_ops(
    template: Option<&Path>,
    plan: &OperationPlan,
    output: &Path,
    options: &ApplyOptions,
    copier: Option<&mut dyn SlideCopier>,
) -> Result<ApplyResult> {
    let template = template
        .map(Path::to_path_buf)
        .or_else(|| plan.template_pptx.clone())
        .ok_or_else(|| Error::InputConflict("template_pptx is required".to_string()))?;

    let mut package = Package::open(&template)?;
    let operations_applied = apply_all(&mut package, plan, copier)?;
    let bytes = package.to_bytes(options.orphans)?;

    let mut verify_issues = Vec::new();
    if options.verify {
        verify_issues = validate(&bytes);
        if !verify_issues.is_empty() {
            if options.strict_verify {
                return Err(Error::ValidationFailed(verify_issues));
            }
            warn!(count = verify_issues.len(), "verification reported issues");
            for issue in &verify_issues {
                warn!("{}", issue);
            }
        }
    }

    persist(output, &bytes)?;
    info!(
        output = %output.display(),
        operations = operations_applied,
        "presentation written"
    );

    Ok(ApplyResult {
        output_path: output.to_path_buf(),
        operations_applied,
        verify_issues,
    })
}

/// Write `bytes` to `path` through a temporary file in the same directory.
fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
