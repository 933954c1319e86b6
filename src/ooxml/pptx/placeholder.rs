/// Placeholder model: the `p:ph` marker of a shape and the skeleton a new slide
/// inherits from its layout.
use crate::common::xml::XmlElement;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::pptx::shape::{non_visual_props, shape_tree};

/// Placeholder types (`ST_PlaceholderType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderType {
    Title,
    CenterTitle,
    SubTitle,
    Body,
    Object,
    Chart,
    Table,
    ClipArt,
    Diagram,
    Media,
    Picture,
    SlideImage,
    DateTime,
    Footer,
    SlideNumber,
    Header,
}

impl PlaceholderType {
    /// Parse the `type` attribute; a missing attribute means `obj`.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value.unwrap_or("obj") {
            "title" => Self::Title,
            "ctrTitle" => Self::CenterTitle,
            "subTitle" => Self::SubTitle,
            "body" => Self::Body,
            "chart" => Self::Chart,
            "tbl" => Self::Table,
            "clipArt" => Self::ClipArt,
            "dgm" => Self::Diagram,
            "media" => Self::Media,
            "pic" => Self::Picture,
            "sldImg" => Self::SlideImage,
            "dt" => Self::DateTime,
            "ftr" => Self::Footer,
            "sldNum" => Self::SlideNumber,
            "hdr" => Self::Header,
            _ => Self::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CenterTitle => "ctrTitle",
            Self::SubTitle => "subTitle",
            Self::Body => "body",
            Self::Object => "obj",
            Self::Chart => "chart",
            Self::Table => "tbl",
            Self::ClipArt => "clipArt",
            Self::Diagram => "dgm",
            Self::Media => "media",
            Self::Picture => "pic",
            Self::SlideImage => "sldImg",
            Self::DateTime => "dt",
            Self::Footer => "ftr",
            Self::SlideNumber => "sldNum",
            Self::Header => "hdr",
        }
    }

    #[inline]
    pub fn is_title(self) -> bool {
        matches!(self, Self::Title | Self::CenterTitle)
    }

    /// Date, footer and slide-number placeholders are not copied onto new slides.
    #[inline]
    pub fn is_footer_like(self) -> bool {
        matches!(self, Self::DateTime | Self::Footer | Self::SlideNumber)
    }

    /// Whether a freshly cloned placeholder of this type gets an empty text body.
    #[inline]
    pub fn takes_text(self) -> bool {
        matches!(
            self,
            Self::Title | Self::CenterTitle | Self::SubTitle | Self::Body | Self::Object
        )
    }

    /// Name stem PowerPoint gives new placeholders of this type.
    pub fn base_name(self) -> &'static str {
        match self {
            Self::Title | Self::CenterTitle => "Title",
            Self::SubTitle => "Subtitle",
            Self::Body => "Text Placeholder",
            Self::Object => "Content Placeholder",
            Self::Chart => "Chart Placeholder",
            Self::Table => "Table Placeholder",
            Self::ClipArt => "ClipArt Placeholder",
            Self::Diagram => "SmartArt Placeholder",
            Self::Media => "Media Placeholder",
            Self::Picture => "Picture Placeholder",
            Self::SlideImage => "Slide Image Placeholder",
            Self::DateTime => "Date Placeholder",
            Self::Footer => "Footer Placeholder",
            Self::SlideNumber => "Slide Number Placeholder",
            Self::Header => "Header Placeholder",
        }
    }
}

/// The `p:ph` element of a placeholder shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub ph_type: PlaceholderType,
    pub idx: u32,
    /// Raw attributes, copied verbatim onto clones.
    pub attrs: Vec<(String, String)>,
}

/// Placeholder marker of `shape`, if it is a placeholder.
pub fn placeholder_of(shape: &XmlElement) -> Option<Placeholder> {
    let ph = non_visual_props(shape)?.find_path(&["nvPr", "ph"])?;
    Some(Placeholder {
        ph_type: PlaceholderType::from_attr(ph.attr("type").as_deref()),
        idx: ph.attr("idx").and_then(|v| v.parse().ok()).unwrap_or(0),
        attrs: ph
            .attributes()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    })
}

/// A new, empty slide root carrying the text-capable placeholders of `layout`.
///
/// Shapes are numbered from 2 (1 is the group shape); footer-like placeholders
/// are left to the layout.
pub fn slide_from_layout(layout: &XmlElement) -> XmlElement {
    let mut tree = XmlElement::new("p:spTree")
        .with_child(
            XmlElement::new("p:nvGrpSpPr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", "1")
                        .with_attr("name", ""),
                )
                .with_child(XmlElement::new("p:cNvGrpSpPr"))
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(
            XmlElement::new("p:grpSpPr").with_child(
                XmlElement::new("a:xfrm")
                    .with_child(XmlElement::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                    .with_child(XmlElement::new("a:ext").with_attr("cx", "0").with_attr("cy", "0"))
                    .with_child(XmlElement::new("a:chOff").with_attr("x", "0").with_attr("y", "0"))
                    .with_child(
                        XmlElement::new("a:chExt").with_attr("cx", "0").with_attr("cy", "0"),
                    ),
            ),
        );

    let placeholders = shape_tree(layout)
        .into_iter()
        .flat_map(|tree| tree.children())
        .filter_map(placeholder_of)
        .filter(|ph| !ph.ph_type.is_footer_like());

    for (n, ph) in placeholders.enumerate() {
        let shape_id = n as u32 + 2;
        tree.push_child(new_placeholder_sp(shape_id, &ph));
    }

    XmlElement::new("p:sld")
        .with_attr("xmlns:a", namespace::DML_MAIN)
        .with_attr("xmlns:r", namespace::OFC_RELATIONSHIPS)
        .with_attr("xmlns:p", namespace::PML_MAIN)
        .with_child(XmlElement::new("p:cSld").with_child(tree))
        .with_child(
            XmlElement::new("p:clrMapOvr").with_child(XmlElement::new("a:masterClrMapping")),
        )
}

fn new_placeholder_sp(shape_id: u32, ph: &Placeholder) -> XmlElement {
    let name = format!("{} {}", ph.ph_type.base_name(), shape_id - 1);

    let mut ph_el = XmlElement::new("p:ph");
    for (key, value) in &ph.attrs {
        ph_el.set_attr(key, value);
    }

    let mut sp = XmlElement::new("p:sp")
        .with_child(
            XmlElement::new("p:nvSpPr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", &shape_id.to_string())
                        .with_attr("name", &name),
                )
                .with_child(
                    XmlElement::new("p:cNvSpPr")
                        .with_child(XmlElement::new("a:spLocks").with_attr("noGrp", "1")),
                )
                .with_child(XmlElement::new("p:nvPr").with_child(ph_el)),
        )
        .with_child(XmlElement::new("p:spPr"));

    if ph.ph_type.takes_text() {
        sp.push_child(
            XmlElement::new("p:txBody")
                .with_child(XmlElement::new("a:bodyPr"))
                .with_child(XmlElement::new("a:lstStyle"))
                .with_child(XmlElement::new("a:p")),
        );
    }
    sp
}
