/// Structural validation of a serialized presentation package.
///
/// The validator works from the archive bytes alone, re-reading every member
/// it needs with `roxmltree`, so it checks what was actually written rather
/// than the in-memory model that wrote it. Problems reachable from the slide
/// list are collected as issue strings; only an archive that cannot be opened,
/// or one without a readable presentation part, stops the walk early.
use crate::common::error::Result;
use crate::ooxml::opc::constants::{namespace, relationship_type as RT};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use roxmltree::Document;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Fallback location of the presentation part.
const DEFAULT_PRESENTATION_MEMBER: &str = "ppt/presentation.xml";

/// Outcome of validating a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub issues: Vec<String>,
}

impl VerifyReport {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate the presentation file at `path`.
///
/// Reading the file is the only failure; structural problems are reported.
pub fn verify_file<P: AsRef<Path>>(path: P) -> Result<VerifyReport> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let report = VerifyReport {
        issues: validate(&bytes),
    };
    info!(path = %path.display(), issues = report.issues.len(), "verified package");
    Ok(report)
}

/// Validate a serialized package and return its issues in walk order.
///
/// ```
/// let issues = deckweave::ooxml::pptx::verify::validate(b"not a zip");
/// assert_eq!(issues.len(), 1);
/// assert!(issues[0].starts_with("package cannot be opened"));
/// ```
pub fn validate(bytes: &[u8]) -> Vec<String> {
    let members = match PhysPkgReader::from_bytes(bytes) {
        Ok(reader) => reader.into_members(),
        Err(e) => return vec![format!("package cannot be opened: {}", e)],
    };
    let walker = Walker { members: &members };
    match walker.walk() {
        Ok(issues) => issues,
        Err(fatal) => vec![fatal],
    }
}

/// A relationship as read from a `.rels` member.
#[derive(Debug)]
struct RelEntry {
    id: String,
    reltype: String,
    target: String,
    external: bool,
}

struct Walker<'a> {
    members: &'a BTreeMap<String, Vec<u8>>,
}

impl Walker<'_> {
    /// Walk the slide list. `Err` carries the single fatal issue.
    fn walk(&self) -> std::result::Result<Vec<String>, String> {
        let mut issues = Vec::new();

        let pres_member = self.presentation_member();
        let pres_bytes = self
            .members
            .get(&pres_member)
            .ok_or_else(|| format!("missing presentation part: {}", pres_member))?;
        let pres_text = xml_text(pres_bytes)
            .ok_or_else(|| "presentation part is not well-formed: invalid UTF-8".to_string())?;
        let pres_doc = Document::parse(pres_text)
            .map_err(|e| format!("presentation part is not well-formed: {}", e))?;
        let pres_root = pres_doc.root_element();
        let pres_rels = self.rels_of(Some(&pres_member));

        let registered_masters: BTreeSet<String> = child(pres_root, "sldMasterIdLst")
            .into_iter()
            .flat_map(|list| list.children().filter(|n| n.is_element()))
            .filter_map(r_id)
            .filter_map(|id| find_rel(&pres_rels, id))
            .filter(|rel| !rel.external)
            .filter_map(|rel| resolve(&pres_member, &rel.target))
            .collect();

        let Some(slide_list) = child(pres_root, "sldIdLst") else {
            return Ok(issues);
        };

        let mut used_masters = BTreeSet::new();
        for entry in slide_list
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "sldId")
        {
            let slide_r_id = r_id(entry).unwrap_or_default();
            let Some(slide_member) = find_rel(&pres_rels, slide_r_id)
                .filter(|rel| !rel.external)
                .and_then(|rel| resolve(&pres_member, &rel.target))
            else {
                issues.push(format!(
                    "slide relationship missing in presentation rels: {}",
                    slide_r_id
                ));
                continue;
            };

            let Some(slide_bytes) = self.members.get(&slide_member) else {
                issues.push(format!("missing slide part: {}", slide_member));
                continue;
            };
            let slide_rels = self.rels_of(Some(&slide_member));

            let Some(slide_doc) = xml_text(slide_bytes).and_then(|t| Document::parse(t).ok())
            else {
                issues.push(format!("slide part is not well-formed: {}", slide_member));
                continue;
            };

            for node in slide_doc.descendants().filter(|n| n.is_element()) {
                for attr in node.attributes() {
                    if attr.namespace() != Some(namespace::OFC_RELATIONSHIPS) {
                        continue;
                    }
                    let value = attr.value();
                    if !value.is_empty() && find_rel(&slide_rels, value).is_none() {
                        issues.push(format!("dangling relationship {} in {}", value, slide_member));
                    }
                }
            }

            let Some(layout_member) = slide_rels
                .iter()
                .find(|rel| !rel.external && is_type(&rel.reltype, RT::SLIDE_LAYOUT))
                .and_then(|rel| resolve(&slide_member, &rel.target))
            else {
                issues.push(format!("missing slideLayout relation in {}", slide_member));
                continue;
            };

            let layout_rels = self.rels_of(Some(&layout_member));
            let Some(master_member) = layout_rels
                .iter()
                .find(|rel| !rel.external && is_type(&rel.reltype, RT::SLIDE_MASTER))
                .and_then(|rel| resolve(&layout_member, &rel.target))
            else {
                issues.push(format!("missing slideMaster relation in {}", layout_member));
                continue;
            };
            used_masters.insert(master_member);
        }

        for master in used_masters.difference(&registered_masters) {
            issues.push(format!("used but unregistered master: {}", master));
        }

        debug!(issues = issues.len(), "package walk finished");
        Ok(issues)
    }

    /// Presentation member named by the package officeDocument relationship.
    fn presentation_member(&self) -> String {
        self.rels_of(None)
            .iter()
            .find(|rel| !rel.external && is_type(&rel.reltype, RT::OFFICE_DOCUMENT))
            .and_then(|rel| resolve_from(PACKAGE_URI, &rel.target))
            .unwrap_or_else(|| DEFAULT_PRESENTATION_MEMBER.to_string())
    }

    /// Relationships of `source` (the package itself for `None`).
    ///
    /// A missing or unreadable `.rels` member yields no relationships.
    fn rels_of(&self, source: Option<&str>) -> Vec<RelEntry> {
        let rels_member = match source {
            None => "_rels/.rels".to_string(),
            Some(member) => match PackURI::from_membername(member) {
                Ok(uri) => uri.rels_uri().membername().to_string(),
                Err(_) => return Vec::new(),
            },
        };
        let Some(bytes) = self.members.get(&rels_member) else {
            return Vec::new();
        };
        let Some(doc) = xml_text(bytes).and_then(|t| Document::parse(t).ok()) else {
            warn!(member = %rels_member, "unreadable relationships item");
            return Vec::new();
        };

        doc.root_element()
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
            .filter_map(|n| {
                Some(RelEntry {
                    id: n.attribute("Id")?.to_string(),
                    reltype: n.attribute("Type")?.to_string(),
                    target: n.attribute("Target")?.to_string(),
                    external: n.attribute("TargetMode") == Some("External"),
                })
            })
            .collect()
    }
}

/// Member text with any byte-order mark removed.
fn xml_text(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes)
        .ok()
        .map(|text| text.trim_start_matches('\u{feff}'))
}

fn child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    local: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == local)
}

/// The `r:id` attribute of `node`.
fn r_id<'a>(node: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    node.attribute((namespace::OFC_RELATIONSHIPS, "id"))
}

fn find_rel<'r>(rels: &'r [RelEntry], id: &str) -> Option<&'r RelEntry> {
    rels.iter().find(|rel| rel.id == id)
}

/// Relationship type match that also accepts the strict-conformance URIs.
fn is_type(reltype: &str, expected: &str) -> bool {
    reltype == expected
        || expected
            .rsplit_once('/')
            .is_some_and(|(_, tail)| reltype.ends_with(&format!("/{}", tail)))
}

/// Member name targeted by `target` from the member `source`.
fn resolve(source: &str, target: &str) -> Option<String> {
    let base = PackURI::from_membername(source).ok()?;
    resolve_from(base.base_uri(), target)
}

fn resolve_from(base_uri: &str, target: &str) -> Option<String> {
    PackURI::from_rel_ref(base_uri, target)
        .ok()
        .map(|uri| uri.membername().to_string())
}
