/// Shapes of a slide's shape tree and the slide/shape editing primitives.
use crate::common::error::{Error, Result, check_index};
use crate::common::xml::{XmlElement, qualify};
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::placeholder::placeholder_of;
use crate::ooxml::pptx::text::{new_text_body, text_frame_text};

/// Shape type enumeration.
///
/// Indicates what kind of shape a shape-tree child is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    /// An auto shape or text box (p:sp)
    Shape,
    /// A picture shape (p:pic)
    Picture,
    /// A graphic frame containing a table or chart (p:graphicFrame)
    GraphicFrame,
    /// A group shape (p:grpSp)
    GroupShape,
    /// A connector shape (p:cxnSp)
    Connector,
    /// Ink or other content part (p:contentPart)
    ContentPart,
}

impl ShapeType {
    /// Shape type for a shape-tree child, `None` for non-shape children.
    pub fn from_local_name(local: &str) -> Option<Self> {
        match local {
            "sp" => Some(Self::Shape),
            "pic" => Some(Self::Picture),
            "graphicFrame" => Some(Self::GraphicFrame),
            "grpSp" => Some(Self::GroupShape),
            "cxnSp" => Some(Self::Connector),
            "contentPart" => Some(Self::ContentPart),
            _ => None,
        }
    }
}

/// How an operation designates a shape on a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeTarget {
    /// First shape whose `cNvPr/@name` equals the value.
    Name(String),
    /// Position among the shapes of the shape tree.
    Index(usize),
}

impl std::fmt::Display for ShapeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeTarget::Name(name) => write!(f, "shape '{}'", name),
            ShapeTarget::Index(index) => write!(f, "shape #{}", index),
        }
    }
}

/// `p:cSld/p:spTree` of a slide, layout or master root.
pub fn shape_tree(root: &XmlElement) -> Option<&XmlElement> {
    root.find_path(&["cSld", "spTree"])
}

pub fn shape_tree_mut(root: &mut XmlElement) -> Option<&mut XmlElement> {
    root.find_path_mut(&["cSld", "spTree"])
}

#[inline]
pub fn is_shape(el: &XmlElement) -> bool {
    ShapeType::from_local_name(el.local_name()).is_some()
}

/// Top-level shapes of `tree`, in document order.
pub fn shapes(tree: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    tree.children().filter(|el| is_shape(el))
}

/// The `p:nv*Pr` child of a shape.
pub fn non_visual_props(shape: &XmlElement) -> Option<&XmlElement> {
    shape
        .children()
        .find(|el| el.local_name().starts_with("nv") && el.local_name().ends_with("Pr"))
}

pub fn shape_name(shape: &XmlElement) -> Option<String> {
    non_visual_props(shape)?.child("cNvPr")?.attr("name")
}

pub fn shape_id(shape: &XmlElement) -> Option<u32> {
    non_visual_props(shape)?
        .child("cNvPr")?
        .attr("id")?
        .parse()
        .ok()
}

/// Auto shapes can carry text; other shape kinds cannot.
#[inline]
pub fn has_text_frame(shape: &XmlElement) -> bool {
    ShapeType::from_local_name(shape.local_name()) == Some(ShapeType::Shape)
}

/// The shape's text body, if present.
pub fn text_body(shape: &XmlElement) -> Option<&XmlElement> {
    shape.child("txBody")
}

/// The shape's text body, created after `spPr`/`style` when missing.
pub fn text_body_mut(shape: &mut XmlElement) -> &mut XmlElement {
    if shape.child("txBody").is_none() {
        let qname = qualify(shape.prefix(), "txBody");
        let position = shape
            .children()
            .position(|el| matches!(el.local_name(), "extLst"))
            .unwrap_or_else(|| shape.child_count());
        shape.insert_child(position, new_text_body(&qname));
    }
    shape.get_or_insert_child("txBody", &[])
}

/// Whether `shape` is a title or center-title placeholder.
pub fn is_title_placeholder(shape: &XmlElement) -> bool {
    placeholder_of(shape).is_some_and(|ph| ph.ph_type.is_title())
}

impl Package {
    /// Parsed XML of the slide at `index`.
    pub fn slide_xml(&self, index: usize) -> Result<&XmlElement> {
        let partname = self.slide_partname(index)?;
        Ok(self.opc().part(&partname)?.xml()?)
    }

    /// Run `f` against the root of the slide at `index`.
    pub fn edit_slide<T>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut XmlElement) -> Result<T>,
    ) -> Result<T> {
        let partname = self.slide_partname(index)?;
        let root = self.opc_mut().part_mut(&partname)?.xml_mut()?;
        f(root)
    }

    /// Position of `target` among the shapes of slide `slide_index`.
    pub fn resolve_shape(&self, slide_index: usize, target: &ShapeTarget) -> Result<usize> {
        let root = self.slide_xml(slide_index)?;
        let tree = shape_tree(root).ok_or_else(|| {
            Error::ReferenceNotFound(format!("slide {} has no shape tree", slide_index))
        })?;

        match target {
            ShapeTarget::Name(name) => shapes(tree)
                .position(|shape| shape_name(shape).as_deref() == Some(name.as_str()))
                .ok_or_else(|| {
                    Error::ReferenceNotFound(format!("shape not found by name: {}", name))
                }),
            ShapeTarget::Index(index) => {
                check_index("shape_index", *index, shapes(tree).count())?;
                Ok(*index)
            },
        }
    }

    /// Run `f` against the shape `target` on slide `slide_index`.
    pub fn edit_shape<T>(
        &mut self,
        slide_index: usize,
        target: &ShapeTarget,
        f: impl FnOnce(&mut XmlElement) -> Result<T>,
    ) -> Result<T> {
        let position = self.resolve_shape(slide_index, target)?;
        self.edit_slide(slide_index, |root| {
            let shape = shape_tree_mut(root)
                .and_then(|tree| tree.children_mut().filter(|el| is_shape(el)).nth(position))
                .ok_or_else(|| Error::ReferenceNotFound(target.to_string()))?;
            f(shape)
        })
    }

    /// Names of the shapes on slide `index`, in tree order.
    pub fn shape_names(&self, index: usize) -> Result<Vec<String>> {
        let root = self.slide_xml(index)?;
        Ok(shape_tree(root)
            .into_iter()
            .flat_map(shapes)
            .map(|shape| shape_name(shape).unwrap_or_default())
            .collect())
    }

    /// Text of every text-bearing shape on slide `index`.
    pub fn slide_texts(&self, index: usize) -> Result<Vec<String>> {
        let root = self.slide_xml(index)?;
        Ok(shape_tree(root)
            .into_iter()
            .flat_map(shapes)
            .filter_map(text_body)
            .map(text_frame_text)
            .collect())
    }

    /// Text of the title placeholder of slide `index`.
    pub fn slide_title(&self, index: usize) -> Result<Option<String>> {
        let root = self.slide_xml(index)?;
        Ok(shape_tree(root)
            .into_iter()
            .flat_map(shapes)
            .find(|shape| is_title_placeholder(shape))
            .map(|shape| text_body(shape).map(text_frame_text).unwrap_or_default()))
    }
}
