//! Operation records.
//!
//! Each record is tagged by its `op` field; unknown kinds fail to parse.
//! Field-level consistency (mutually exclusive targets, required companions)
//! is checked by [`Operation::validate`] before anything is applied.

use crate::common::error::{Error, Result};
use crate::ooxml::pptx::{ParagraphSpec, ShapeTarget, SlideSize};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a slide copier brings a source slide over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMode {
    /// Rebuild the slide shape by shape on a destination layout.
    Shape,
    /// Copy the slide part with the parts it depends on.
    #[default]
    Part,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopySlideOp {
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub reuse_library_index: Option<usize>,
    pub source_slide_index: usize,
    #[serde(default)]
    pub mode: CopyMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSlideOnLayoutOp {
    #[serde(default)]
    pub layout_index: usize,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSlideOp {
    pub slide_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSlideOp {
    pub from_index: usize,
    pub to_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSlideLayoutOp {
    pub slide_index: usize,
    pub layout_index: usize,
}

/// Which matches [`RewriteTextOp`] replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    /// The first match in the first matching shape.
    First,
    /// Every match in every shape.
    #[default]
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteTextOp {
    pub slide_index: usize,
    pub find: String,
    pub replace: String,
    #[serde(default)]
    pub shape_name: Option<String>,
    #[serde(default)]
    pub occurrence: Occurrence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetShapeTextOp {
    pub slide_index: usize,
    #[serde(default)]
    pub shape_name: Option<String>,
    #[serde(default)]
    pub shape_index: Option<usize>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<ParagraphSpec>,
}

impl SetShapeTextOp {
    /// The designated shape. Only meaningful after validation.
    pub fn target(&self) -> Result<ShapeTarget> {
        match (&self.shape_name, self.shape_index) {
            (Some(name), None) => Ok(ShapeTarget::Name(name.clone())),
            (None, Some(index)) => Ok(ShapeTarget::Index(index)),
            (Some(_), Some(_)) => Err(Error::InputConflict(
                "set_shape_text takes shape_name or shape_index, not both".to_string(),
            )),
            (None, None) => Err(Error::InputConflict(
                "set_shape_text requires shape_name or shape_index".to_string(),
            )),
        }
    }

    /// Paragraphs to write: the explicit list, else `text` as one paragraph.
    pub fn payload(&self) -> Vec<ParagraphSpec> {
        if self.paragraphs.is_empty() {
            vec![ParagraphSpec::new(self.text.clone().unwrap_or_default())]
        } else {
            self.paragraphs.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizePreset {
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "custom")]
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSlideSizeOp {
    pub preset: SizePreset,
    #[serde(default)]
    pub width_inches: Option<f64>,
    #[serde(default)]
    pub height_inches: Option<f64>,
}

impl SetSlideSizeOp {
    pub fn size(&self) -> Result<SlideSize> {
        match self.preset {
            SizePreset::Widescreen => Ok(SlideSize::Widescreen),
            SizePreset::Standard => Ok(SlideSize::Standard),
            SizePreset::Custom => match (self.width_inches, self.height_inches) {
                (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Ok(SlideSize::Custom {
                    width_inches: w,
                    height_inches: h,
                }),
                _ => Err(Error::InputConflict(
                    "custom slide size requires positive width_inches and height_inches"
                        .to_string(),
                )),
            },
        }
    }
}

/// One step of an operation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CopySlide(CopySlideOp),
    CreateSlideOnLayout(CreateSlideOnLayoutOp),
    DeleteSlide(DeleteSlideOp),
    MoveSlide(MoveSlideOp),
    SetSlideLayout(SetSlideLayoutOp),
    RewriteText(RewriteTextOp),
    SetShapeText(SetShapeTextOp),
    SetSlideSize(SetSlideSizeOp),
}

impl Operation {
    /// The `op` tag of this operation.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::CopySlide(_) => "copy_slide",
            Operation::CreateSlideOnLayout(_) => "create_slide_on_layout",
            Operation::DeleteSlide(_) => "delete_slide",
            Operation::MoveSlide(_) => "move_slide",
            Operation::SetSlideLayout(_) => "set_slide_layout",
            Operation::RewriteText(_) => "rewrite_text",
            Operation::SetShapeText(_) => "set_shape_text",
            Operation::SetSlideSize(_) => "set_slide_size",
        }
    }

    /// Check field combinations that the record types cannot express.
    pub fn validate(&self) -> Result<()> {
        match self {
            Operation::CopySlide(op) => {
                if op.source_path.is_none() && op.reuse_library_index.is_none() {
                    return Err(Error::InputConflict(
                        "copy_slide requires source_path or reuse_library_index".to_string(),
                    ));
                }
                Ok(())
            },
            Operation::RewriteText(op) if op.find.is_empty() => Err(Error::InputConflict(
                "rewrite_text requires a non-empty find string".to_string(),
            )),
            Operation::SetShapeText(op) => op.target().map(|_| ()),
            Operation::SetSlideSize(op) => op.size().map(|_| ()),
            _ => Ok(()),
        }
    }
}
