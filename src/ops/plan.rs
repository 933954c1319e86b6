//! Operation plans and plan files.
//!
//! A plan file holds either a bare list of operations or an object with an
//! optional template path, the reuse slide libraries and the operations.
//! `.yaml`/`.yml` files are read as YAML, anything else as JSON.

use crate::common::error::{Error, Result, check_index};
use crate::ops::model::Operation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationPlan {
    #[serde(default)]
    pub template_pptx: Option<PathBuf>,
    /// Packages that `copy_slide` can name by position.
    #[serde(default)]
    pub reuse_slide_libraries: Vec<PathBuf>,
    pub operations: Vec<Operation>,
}

/// Either accepted shape of a plan document.
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDocument {
    Bare(Vec<Operation>),
    Full(OperationPlan),
}

impl From<PlanDocument> for OperationPlan {
    fn from(doc: PlanDocument) -> Self {
        match doc {
            PlanDocument::Bare(operations) => OperationPlan {
                operations,
                ..OperationPlan::default()
            },
            PlanDocument::Full(plan) => plan,
        }
    }
}

impl OperationPlan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            ..Self::default()
        }
    }

    /// Parse a JSON plan document.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: PlanDocument =
            serde_json::from_str(text).map_err(|e| Error::InvalidPlan(e.to_string()))?;
        Ok(doc.into())
    }

    /// Parse a YAML plan document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let doc: PlanDocument =
            serde_saphyr::from_str(text).map_err(|e| Error::InvalidPlan(e.to_string()))?;
        Ok(doc.into())
    }

    /// Read a plan file, choosing the format by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let plan = if is_yaml {
            Self::from_yaml(&text)?
        } else {
            Self::from_json(&text)?
        };
        debug!(path = %path.display(), operations = plan.operations.len(), "plan loaded");
        Ok(plan)
    }

    /// Check every operation before anything is applied.
    pub fn validate(&self) -> Result<()> {
        for op in &self.operations {
            op.validate()?;
            if let Operation::CopySlide(copy) = op
                && copy.source_path.is_none()
                && let Some(index) = copy.reuse_library_index
            {
                check_index("reuse_library_index", index, self.reuse_slide_libraries.len())?;
            }
        }
        Ok(())
    }

    /// Source package of a `copy_slide`: its own path, else the reuse library it names.
    pub fn copy_source(&self, source_path: Option<&Path>, reuse_index: Option<usize>) -> Result<PathBuf> {
        if let Some(path) = source_path {
            return Ok(path.to_path_buf());
        }
        let index = reuse_index.ok_or_else(|| {
            Error::InputConflict("copy_slide requires source_path or reuse_library_index".to_string())
        })?;
        check_index("reuse_library_index", index, self.reuse_slide_libraries.len())?;
        Ok(self.reuse_slide_libraries[index].clone())
    }

    #[inline]
    pub fn needs_copier(&self) -> bool {
        self.operations
            .iter()
            .any(|op| matches!(op, Operation::CopySlide(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::model::MoveSlideOp;

    #[test]
    fn test_bare_list_and_object_forms() {
        let bare = OperationPlan::from_json(r#"[{"op": "move_slide", "from_index": 0, "to_index": 2}]"#)
            .unwrap();
        assert_eq!(
            bare.operations,
            [Operation::MoveSlide(MoveSlideOp {
                from_index: 0,
                to_index: 2
            })]
        );
        assert!(bare.template_pptx.is_none());

        let full = OperationPlan::from_json(
            r#"{"template_pptx": "base.pptx", "reuse_slide_libraries": ["lib.pptx"],
                "operations": [{"op": "delete_slide", "slide_index": 1}]}"#,
        )
        .unwrap();
        assert_eq!(full.template_pptx.as_deref(), Some(Path::new("base.pptx")));
        assert_eq!(full.reuse_slide_libraries.len(), 1);
    }

    #[test]
    fn test_yaml_plan() {
        let plan = OperationPlan::from_yaml(
            "operations:\n  - op: set_slide_layout\n    slide_index: 0\n    layout_index: 1\n  - op: set_slide_size\n    preset: \"4:3\"\n",
        )
        .unwrap();
        assert_eq!(plan.operations.len(), 2);
        assert_eq!(plan.operations[1].kind(), "set_slide_size");
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            OperationPlan::from_json(r#"[{"op": "nope"}]"#),
            Err(Error::InvalidPlan(_))
        ));
        assert!(matches!(
            OperationPlan::from_json("{not json"),
            Err(Error::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_reuse_index_is_checked_up_front() {
        let plan = OperationPlan::from_json(
            r#"{"reuse_slide_libraries": ["a.pptx"],
                "operations": [{"op": "copy_slide", "reuse_library_index": 1, "source_slide_index": 0}]}"#,
        )
        .unwrap();
        let err = plan.validate().unwrap_err();
        assert_eq!(err.to_string(), "reuse_library_index out of range: 1, total=1");
        assert!(plan.needs_copier());
        assert_eq!(
            plan.copy_source(None, Some(0)).unwrap(),
            PathBuf::from("a.pptx")
        );
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("plan.yml");
        std::fs::write(&yaml, "- op: delete_slide\n  slide_index: 0\n").unwrap();
        assert_eq!(OperationPlan::from_file(&yaml).unwrap().operations.len(), 1);

        let json = dir.path().join("plan.json");
        std::fs::write(&json, r#"[{"op": "delete_slide", "slide_index": 0}]"#).unwrap();
        assert_eq!(OperationPlan::from_file(&json).unwrap().operations.len(), 1);
    }
}
