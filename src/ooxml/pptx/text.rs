/// Text frame and paragraph primitives over DrawingML `a:txBody` content.
///
/// A text frame's text is its paragraphs joined with `\n`; a line break inside
/// a paragraph (`a:br`) reads as a vertical tab (`\u{b}`).
use crate::common::xml::{XmlElement, qualify};
use serde::{Deserialize, Serialize};

/// Mutually exclusive bullet markers of a paragraph's `a:pPr`.
pub const BULLET_MARKERS: [&str; 3] = ["buNone", "buChar", "buAutoNum"];

/// Glyph used for character bullets.
pub const BULLET_CHAR: &str = "\u{2022}";

/// `a:pPr` children that must follow the bullet marker.
const PPR_TRAILING: [&str; 3] = ["tabLst", "defRPr", "extLst"];

/// Line break within a paragraph.
const LINE_BREAK: char = '\u{b}';

/// List style of a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    #[default]
    None,
    Bullet,
    Number,
}

impl ListStyle {
    /// The bullet marker element for this style.
    fn marker(self, prefix: Option<&str>) -> XmlElement {
        match self {
            ListStyle::None => XmlElement::new(qualify(prefix, "buNone")),
            ListStyle::Bullet => {
                XmlElement::new(qualify(prefix, "buChar")).with_attr("char", BULLET_CHAR)
            },
            ListStyle::Number => XmlElement::new(qualify(prefix, "buAutoNum"))
                .with_attr("type", "arabicPeriod")
                .with_attr("startAt", "1"),
        }
    }
}

/// One paragraph to write into a text frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphSpec {
    pub text: String,
    #[serde(default)]
    pub level: u8,
    #[serde(default)]
    pub list_type: ListStyle,
}

impl ParagraphSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Set the list style of paragraph `p`, replacing any existing bullet marker.
pub fn set_list_style(p: &mut XmlElement, style: ListStyle) {
    let prefix = p.prefix().map(str::to_string);
    let ppr = p.get_or_insert_child(&qualify(prefix.as_deref(), "pPr"), &[]);
    ppr.replace_children(&BULLET_MARKERS, Some(style.marker(prefix.as_deref())));

    let trailing: Vec<XmlElement> = ppr
        .children()
        .filter(|el| PPR_TRAILING.contains(&el.local_name()))
        .cloned()
        .collect();
    if !trailing.is_empty() {
        ppr.retain_children(|el| !PPR_TRAILING.contains(&el.local_name()));
        for el in trailing {
            ppr.push_child(el);
        }
    }
}

/// Current list style of paragraph `p`, if a marker is set.
pub fn list_style(p: &XmlElement) -> Option<ListStyle> {
    let ppr = p.child("pPr")?;
    ppr.children().find_map(|el| match el.local_name() {
        "buNone" => Some(ListStyle::None),
        "buChar" => Some(ListStyle::Bullet),
        "buAutoNum" => Some(ListStyle::Number),
        _ => None,
    })
}

/// Set the indentation level of paragraph `p`. Level 0 removes the attribute.
pub fn set_level(p: &mut XmlElement, level: u8) {
    let prefix = p.prefix().map(str::to_string);
    let ppr = p.get_or_insert_child(&qualify(prefix.as_deref(), "pPr"), &[]);
    if level == 0 {
        ppr.remove_attr("lvl");
    } else {
        ppr.set_attr("lvl", &level.to_string());
    }
}

/// Text of paragraph `p`.
pub fn paragraph_text(p: &XmlElement) -> String {
    let mut text = String::new();
    for el in p.children() {
        match el.local_name() {
            "r" | "fld" => {
                if let Some(t) = el.child("t") {
                    text.push_str(&t.text());
                }
            },
            "br" => text.push(LINE_BREAK),
            _ => {},
        }
    }
    text
}

/// Text of a text frame: paragraphs joined with `\n`.
pub fn text_frame_text(tx_body: &XmlElement) -> String {
    tx_body
        .children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace the text of a text frame, one paragraph per `\n`-separated line.
///
/// The first paragraph keeps its properties; runs and other paragraphs are
/// discarded.
pub fn set_text_frame_text(tx_body: &mut XmlElement, text: &str) {
    let prefix = dml_prefix(tx_body);
    clear_text_frame(tx_body, &prefix);

    let mut lines = text.split('\n');
    if let Some(p) = tx_body.child_mut("p") {
        set_paragraph_text(p, lines.next().unwrap_or_default(), &prefix);
    }
    for line in lines {
        let mut p = XmlElement::new(qualify(Some(&prefix), "p"));
        set_paragraph_text(&mut p, line, &prefix);
        tx_body.push_child(p);
    }
}

/// Replace the content of a text frame with `paragraphs`, applying each
/// paragraph's level and list style.
///
/// An empty slice leaves a single empty paragraph.
pub fn write_paragraphs(tx_body: &mut XmlElement, paragraphs: &[ParagraphSpec]) {
    let prefix = dml_prefix(tx_body);
    clear_text_frame(tx_body, &prefix);

    let default_spec = [ParagraphSpec::default()];
    let specs = if paragraphs.is_empty() {
        &default_spec[..]
    } else {
        paragraphs
    };

    for (n, spec) in specs.iter().enumerate() {
        if n > 0 {
            tx_body.push_child(XmlElement::new(qualify(Some(&prefix), "p")));
        }
        let Some(p) = tx_body.children_mut().filter(|el| el.local_name() == "p").last() else {
            continue;
        };
        set_paragraph_text(p, &spec.text, &prefix);
        set_level(p, spec.level);
        set_list_style(p, spec.list_type);
    }
}

/// Replace `find` in the frame's text. Returns false when `find` is absent.
pub fn replace_in_text_frame(
    tx_body: &mut XmlElement,
    find: &str,
    replace: &str,
    first_only: bool,
) -> bool {
    let text = text_frame_text(tx_body);
    if find.is_empty() || !text.contains(find) {
        return false;
    }
    let rewritten = if first_only {
        text.replacen(find, replace, 1)
    } else {
        text.replace(find, replace)
    };
    set_text_frame_text(tx_body, &rewritten);
    true
}

/// A new, empty text body: `bodyPr`, `lstStyle` and one paragraph.
pub fn new_text_body(qname: &str) -> XmlElement {
    XmlElement::new(qname)
        .with_child(XmlElement::new("a:bodyPr"))
        .with_child(XmlElement::new("a:lstStyle"))
        .with_child(XmlElement::new("a:p"))
}

/// Prefix used for DrawingML children of `tx_body`.
fn dml_prefix(tx_body: &XmlElement) -> String {
    tx_body
        .children()
        .find_map(|el| el.prefix())
        .unwrap_or("a")
        .to_string()
}

/// Keep only the first paragraph, stripped of runs, breaks and fields.
fn clear_text_frame(tx_body: &mut XmlElement, prefix: &str) {
    let mut seen_first = false;
    tx_body.retain_children(|el| {
        if el.local_name() != "p" {
            return true;
        }
        let keep = !seen_first;
        seen_first = true;
        keep
    });

    match tx_body.child_mut("p") {
        Some(p) => {
            p.retain_children(|el| !matches!(el.local_name(), "r" | "br" | "fld"));
        },
        None => tx_body.push_child(XmlElement::new(qualify(Some(prefix), "p"))),
    }
}

/// Append runs for `text` to `p`, ahead of `a:endParaRPr`.
fn set_paragraph_text(p: &mut XmlElement, text: &str, prefix: &str) {
    p.retain_children(|el| !matches!(el.local_name(), "r" | "br" | "fld"));

    let mut insert_at = p
        .children()
        .position(|el| el.local_name() == "endParaRPr")
        .unwrap_or_else(|| p.child_count());

    for (n, segment) in text.split(LINE_BREAK).enumerate() {
        if n > 0 {
            p.insert_child(insert_at, XmlElement::new(qualify(Some(prefix), "br")));
            insert_at += 1;
        }
        if !segment.is_empty() {
            let run = XmlElement::new(qualify(Some(prefix), "r"))
                .with_child(XmlElement::new(qualify(Some(prefix), "t")).with_text(segment));
            p.insert_child(insert_at, run);
            insert_at += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<p:txBody xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><a:bodyPr/><a:lstStyle/><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US"/><a:t>Hello</a:t></a:r><a:br/><a:r><a:t>world</a:t></a:r><a:endParaRPr lang="en-US"/></a:p><a:p><a:r><a:t>Second</a:t></a:r></a:p></p:txBody>"#;

    fn body() -> XmlElement {
        XmlElement::parse(BODY.as_bytes()).unwrap()
    }

    #[test]
    fn test_text_frame_text_joins_paragraphs() {
        assert_eq!(text_frame_text(&body()), "Hello\u{b}world\nSecond");
    }

    #[test]
    fn test_set_text_keeps_first_paragraph_properties() {
        let mut tx = body();
        set_text_frame_text(&mut tx, "A & B\nC");
        assert_eq!(text_frame_text(&tx), "A & B\nC");

        let first = tx.child("p").unwrap();
        assert_eq!(first.child("pPr").unwrap().attr("algn").as_deref(), Some("ctr"));
        let locals: Vec<&str> = first.children().map(|el| el.local_name()).collect();
        assert_eq!(locals, ["pPr", "r", "endParaRPr"]);
        assert!(tx.to_xml().contains("<a:t>A &amp; B</a:t>"));
    }

    #[test]
    fn test_list_style_markers_are_exclusive() {
        let mut p = XmlElement::new("a:p");
        set_list_style(&mut p, ListStyle::Bullet);
        set_list_style(&mut p, ListStyle::Number);
        set_list_style(&mut p, ListStyle::Bullet);

        let ppr = p.child("pPr").unwrap();
        let markers: Vec<&XmlElement> = ppr
            .children()
            .filter(|el| BULLET_MARKERS.contains(&el.local_name()))
            .collect();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].attr("char").as_deref(), Some(BULLET_CHAR));
        assert_eq!(list_style(&p), Some(ListStyle::Bullet));

        set_list_style(&mut p, ListStyle::Number);
        let num = p.find_path(&["pPr", "buAutoNum"]).unwrap();
        assert_eq!(num.attr("type").as_deref(), Some("arabicPeriod"));
        assert_eq!(num.attr("startAt").as_deref(), Some("1"));
    }

    #[test]
    fn test_marker_precedes_default_run_properties() {
        let mut p = XmlElement::parse(br#"<a:p xmlns:a="urn:a"><a:pPr><a:defRPr/></a:pPr></a:p>"#).unwrap();
        set_list_style(&mut p, ListStyle::None);
        let locals: Vec<&str> = p.child("pPr").unwrap().children().map(|el| el.local_name()).collect();
        assert_eq!(locals, ["buNone", "defRPr"]);
    }

    #[test]
    fn test_write_paragraphs_applies_level_and_style() {
        let mut tx = body();
        write_paragraphs(
            &mut tx,
            &[
                ParagraphSpec::new("Intro"),
                ParagraphSpec {
                    text: "Point".into(),
                    level: 1,
                    list_type: ListStyle::Bullet,
                },
            ],
        );

        let paragraphs: Vec<&XmlElement> = tx.children_named("p").collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(list_style(paragraphs[0]), Some(ListStyle::None));
        assert_eq!(list_style(paragraphs[1]), Some(ListStyle::Bullet));
        assert_eq!(paragraphs[1].child("pPr").unwrap().attr("lvl").as_deref(), Some("1"));
        assert_eq!(text_frame_text(&tx), "Intro\nPoint");
    }

    #[test]
    fn test_replace_first_or_all() {
        let mut tx = new_text_body("p:txBody");
        set_text_frame_text(&mut tx, "a-a-a");
        assert!(replace_in_text_frame(&mut tx, "a", "b", true));
        assert_eq!(text_frame_text(&tx), "b-a-a");
        assert!(replace_in_text_frame(&mut tx, "a", "b", false));
        assert_eq!(text_frame_text(&tx), "b-b-b");
        assert!(!replace_in_text_frame(&mut tx, "zzz", "b", false));
    }
}
