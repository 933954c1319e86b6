use crate::common::error::Result;
use crate::ooxml::pptx::Package;
use crate::ops::model::CopyMode;
use std::path::Path;

/// Copies a slide out of another package into the destination.
///
/// An implementation appends the cloned slide with whatever parts and
/// relationships it needs, and leaves the destination's slide list and
/// relationship tables consistent. The pipeline calls it for `copy_slide`
/// operations and does not look at how the copy is done.
pub trait SlideCopier {
    fn copy_slide(
        &mut self,
        destination: &mut Package,
        source: &Path,
        source_slide_index: usize,
        mode: CopyMode,
    ) -> Result<()>;
}
