//! In-memory presentation fixtures for unit tests.
//!
//! [`DeckBuilder`] writes a small but complete package: one master with two
//! layouts ("Title and Content", "Title Only"), a theme, core properties and
//! one slide per title, each slide based on the first layout.

use crate::common::xml::escape_text;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const NS_DECLS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const GROUP_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

#[derive(Debug, Default)]
pub struct DeckBuilder {
    titles: Vec<String>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One slide per title, in order.
    pub fn slides<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.titles.extend(titles.into_iter().map(Into::into));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut members: Vec<(String, String)> = vec![
            ("[Content_Types].xml".into(), self.content_types()),
            ("_rels/.rels".into(), package_rels()),
            ("docProps/core.xml".into(), core_props()),
            ("ppt/presentation.xml".into(), self.presentation()),
            ("ppt/_rels/presentation.xml.rels".into(), self.presentation_rels()),
            ("ppt/slideMasters/slideMaster1.xml".into(), slide_master()),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
                rels(&[
                    ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                    ("rId2", "slideLayout", "../slideLayouts/slideLayout2.xml"),
                    ("rId3", "theme", "../theme/theme1.xml"),
                ]),
            ),
            ("ppt/slideLayouts/slideLayout1.xml".into(), title_and_content_layout()),
            ("ppt/slideLayouts/slideLayout2.xml".into(), title_only_layout()),
            ("ppt/theme/theme1.xml".into(), theme()),
        ];
        for n in 1..=2 {
            members.push((
                format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n),
                rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
            ));
        }
        for (i, title) in self.titles.iter().enumerate() {
            members.push((format!("ppt/slides/slide{}.xml", i + 1), slide(title)));
            members.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
            ));
        }

        zip_members(members.iter().map(|(name, xml)| (name.as_str(), xml.as_bytes())))
    }

    fn content_types(&self) -> String {
        let mut xml = format!(
            r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#,
            DECL
        );
        let overrides = [
            ("/ppt/presentation.xml", "presentationml.presentation.main+xml"),
            ("/ppt/slideMasters/slideMaster1.xml", "presentationml.slideMaster+xml"),
            ("/ppt/slideLayouts/slideLayout1.xml", "presentationml.slideLayout+xml"),
            ("/ppt/slideLayouts/slideLayout2.xml", "presentationml.slideLayout+xml"),
            ("/ppt/theme/theme1.xml", "theme+xml"),
        ];
        for (partname, suffix) in overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="application/vnd.openxmlformats-officedocument.{}"/>"#,
                partname, suffix
            ));
        }
        xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
        for i in 1..=self.titles.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn presentation(&self) -> String {
        let mut xml = format!(
            r#"{}<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            DECL, NS_DECLS
        );
        if !self.titles.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for i in 0..self.titles.len() {
                xml.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2));
            }
            xml.push_str("</p:sldIdLst>");
        }
        xml.push_str(r#"<p:sldSz cx="9144000" cy="6858000" type="screen4x3"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#);
        xml
    }

    fn presentation_rels(&self) -> String {
        let mut entries = vec![(
            "rId1".to_string(),
            "slideMaster",
            "slideMasters/slideMaster1.xml".to_string(),
        )];
        for i in 0..self.titles.len() {
            entries.push((
                format!("rId{}", i + 2),
                "slide",
                format!("slides/slide{}.xml", i + 1),
            ));
        }
        entries.push((
            format!("rId{}", self.titles.len() + 2),
            "theme",
            "theme/theme1.xml".to_string(),
        ));
        let borrowed: Vec<(&str, &str, &str)> = entries
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
            .collect();
        rels(&borrowed)
    }
}

/// Zip `(name, content)` pairs into an archive.
pub fn zip_members<'a>(members: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in members {
        zip.start_file(name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Copy of `bytes` with member `name` replaced by `content`.
pub fn rewrite_member(bytes: &[u8], name: &str, content: &[u8]) -> Vec<u8> {
    let mut members = PhysPkgReader::from_bytes(bytes).unwrap().into_members();
    members.insert(name.to_string(), content.to_vec());
    zip_members(members.iter().map(|(n, c)| (n.as_str(), c.as_slice())))
}

/// Copy of `bytes` without member `name`.
pub fn remove_member(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut members = PhysPkgReader::from_bytes(bytes).unwrap().into_members();
    assert!(members.remove(name).is_some(), "no member {}", name);
    zip_members(members.iter().map(|(n, c)| (n.as_str(), c.as_slice())))
}

fn package_rels() -> String {
    format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#,
        DECL, REL_BASE
    )
}

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        DECL
    );
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_BASE, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_props() -> String {
    format!(
        r#"{}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Fixture</dc:title></cp:coreProperties>"#,
        DECL
    )
}

fn theme() -> String {
    format!(
        r#"{}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements/></a:theme>"#,
        DECL
    )
}

fn placeholder(id: u32, name: &str, ph_attrs: &str, with_text: bool) -> String {
    let body = if with_text {
        "<p:txBody><a:bodyPr/><a:lstStyle/><a:p/></p:txBody>"
    } else {
        ""
    };
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph{}/></p:nvPr></p:nvSpPr><p:spPr/>{}</p:sp>"#,
        id, name, ph_attrs, body
    )
}

fn slide_master() -> String {
    format!(
        r#"{}<p:sldMaster {}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/><p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst></p:sldMaster>"#,
        DECL,
        NS_DECLS,
        GROUP_PROPS,
        placeholder(2, "Title Placeholder 1", r#" type="title""#, true)
    )
}

fn title_and_content_layout() -> String {
    format!(
        r#"{}<p:sldLayout {} type="obj" preserve="1"><p:cSld name="Title and Content"><p:spTree>{}{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        DECL,
        NS_DECLS,
        GROUP_PROPS,
        placeholder(2, "Title 1", r#" type="title""#, true),
        placeholder(3, "Content Placeholder 2", r#" idx="1""#, true),
    )
}

fn title_only_layout() -> String {
    format!(
        r#"{}<p:sldLayout {} type="titleOnly" preserve="1"><p:cSld name="Title Only"><p:spTree>{}{}{}{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        DECL,
        NS_DECLS,
        GROUP_PROPS,
        placeholder(2, "Title 1", r#" type="title""#, true),
        placeholder(3, "Date Placeholder 2", r#" type="dt" sz="half" idx="10""#, false),
        placeholder(4, "Footer Placeholder 3", r#" type="ftr" sz="quarter" idx="11""#, false),
        placeholder(5, "Slide Number Placeholder 4", r#" type="sldNum" sz="quarter" idx="12""#, false),
    )
}

fn slide(title: &str) -> String {
    let title_shape = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        escape_text(title)
    );
    format!(
        r#"{}<p:sld {}><p:cSld><p:spTree>{}{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        DECL,
        NS_DECLS,
        GROUP_PROPS,
        title_shape,
        placeholder(3, "Content Placeholder 2", r#" idx="1""#, true),
    )
}
