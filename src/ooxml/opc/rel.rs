use crate::common::xml::escape_attr;
use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
/// Relationship tables for OPC packages.
///
/// Every part (and the package itself) owns one [`Relationships`] table: an
/// ordered list of typed, id-labelled edges to other parts or to external
/// resources.
use smallvec::SmallVec;

/// A single relationship from a source part to a target.
///
/// Internal targets are stored as the raw reference found in (or written to)
/// the `.rels` item and resolved against the source directory on demand.
/// External targets are opaque and never resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    target_ref: String,
    base_uri: String,
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// The raw target reference as written in the `.rels` item.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Absolute partname of an internal target.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target part",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }

    /// Whether this relationship resolves to `partname`.
    pub fn targets(&self, partname: &PackURI) -> bool {
        !self.is_external
            && self
                .target_partname()
                .is_ok_and(|target| &target == partname)
    }
}

/// Ordered relationship table of one source.
///
/// New ids are allocated as `rId<n>` from a counter that starts above every
/// numeric id present when the table was loaded and only ever grows, so an id
/// freed by [`remove`](Self::remove) is never handed out again.
#[derive(Debug, Clone)]
pub struct Relationships {
    base_uri: String,
    rels: SmallVec<[Relationship; 8]>,
    next_id: u64,
}

impl Relationships {
    /// Create an empty table whose relative targets resolve against `base_uri`.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: SmallVec::new(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Insert a relationship read from a `.rels` item, keeping its id.
    pub fn load(
        &mut self,
        r_id: String,
        reltype: String,
        target_ref: String,
        is_external: bool,
    ) -> Result<()> {
        if self.contains(&r_id) {
            return Err(OpcError::InvalidRelationship(format!(
                "duplicate relationship id {} in {}",
                r_id, self.base_uri
            )));
        }
        if let Some(n) = rid_number(&r_id) {
            self.next_id = self.next_id.max(u64::from(n) + 1);
        }
        self.rels.push(Relationship::new(
            r_id,
            reltype,
            target_ref,
            self.base_uri.clone(),
            is_external,
        ));
        Ok(())
    }

    /// Add an internal relationship to `target` under a fresh id.
    ///
    /// The stored target is the reference relative to this table's base URI.
    pub fn add(&mut self, reltype: &str, target: &PackURI) -> String {
        let target_ref = target.relative_ref(&self.base_uri);
        self.push_new(reltype, target_ref, false)
    }

    /// Add an external relationship under a fresh id; `url` is kept verbatim.
    pub fn add_external(&mut self, reltype: &str, url: &str) -> String {
        self.push_new(reltype, url.to_string(), true)
    }

    fn push_new(&mut self, reltype: &str, target_ref: String, is_external: bool) -> String {
        let r_id = self.allocate_id();
        self.rels.push(Relationship::new(
            r_id.clone(),
            reltype.to_string(),
            target_ref,
            self.base_uri.clone(),
            is_external,
        ));
        r_id
    }

    fn allocate_id(&mut self) -> String {
        loop {
            let candidate = format!("rId{}", self.next_id);
            self.next_id += 1;
            // Non-numeric ids loaded from disk can still collide by accident.
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// The id the next [`add`](Self::add) would return, ignoring collisions.
    #[inline]
    pub fn peek_next_id(&self) -> u64 {
        self.next_id
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    #[inline]
    pub fn contains(&self, r_id: &str) -> bool {
        self.get(r_id).is_some()
    }

    /// Remove a relationship by id. The id is not reused.
    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        let position = self.rels.iter().position(|rel| rel.r_id == r_id)?;
        Some(self.rels.remove(position))
    }

    /// All relationships of one type, in table order.
    pub fn of_type<'a, 'b>(
        &'a self,
        reltype: &'b str,
    ) -> impl Iterator<Item = &'a Relationship> + use<'a, 'b> {
        self.rels.iter().filter(move |rel| rel.reltype == reltype)
    }

    /// The single relationship of `reltype`.
    ///
    /// Fails when there is none or more than one.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.of_type(reltype);
        match (matching.next(), matching.next()) {
            (Some(rel), None) => Ok(rel),
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "no relationship of type '{}' from {}",
                reltype, self.base_uri
            ))),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "multiple relationships of type '{}' from {}",
                reltype, self.base_uri
            ))),
        }
    }

    /// Drop every relationship of `reltype` and add one to `target`.
    ///
    /// Returns the id of the new relationship.
    pub fn replace_of_type(&mut self, reltype: &str, target: &PackURI) -> String {
        self.rels.retain(|rel| rel.reltype != reltype);
        self.add(reltype, target)
    }

    /// Ids of internal relationships resolving to `partname`.
    pub fn ids_targeting(&self, partname: &PackURI) -> Vec<String> {
        self.rels
            .iter()
            .filter(|rel| rel.targets(partname))
            .map(|rel| rel.r_id.clone())
            .collect()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize as the content of a `.rels` item, in table order.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for rel in &self.rels {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_attr(rel.r_id()),
                escape_attr(rel.reltype()),
                escape_attr(rel.target_ref()),
            ));
            if rel.is_external() {
                xml.push_str(&format!(r#" TargetMode="{}""#, target_mode::EXTERNAL));
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Numeric suffix of an `rId<n>` identifier.
fn rid_number(r_id: &str) -> Option<u32> {
    let digits = r_id.strip_prefix("rId")?;
    if digits.is_empty() {
        return None;
    }
    atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok()
}
