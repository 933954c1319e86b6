//! In-memory OPC package.
//!
//! [`OpcPackage`] owns every part of a package together with the package-level
//! relationship table. Parts are keyed by partname; relationships between them
//! are the edges of the package graph.

use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

/// How [`OpcPackage::remove_part`] treats live inbound relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    /// Refuse to remove a part that another part still relates to.
    Strict,
    /// Remove regardless; the caller has already detached or will detach the edges.
    Orphan,
}

#[derive(Debug, Clone)]
pub struct OpcPackage {
    rels: Relationships,
    parts: BTreeMap<PackURI, Part>,
    /// Extension defaults declared by the source `[Content_Types].xml`.
    defaults: BTreeMap<String, String>,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI),
            parts: BTreeMap::new(),
            defaults: BTreeMap::new(),
        }
    }

    /// Open a package file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Load a package from the bytes of a ZIP archive.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let phys_reader = PhysPkgReader::from_bytes(data)?;
        let pkg_reader = PackageReader::from_phys_reader(phys_reader)?;
        Self::unmarshal(pkg_reader)
    }

    fn unmarshal(pkg_reader: PackageReader) -> Result<Self> {
        let (pkg_srels, sparts, content_types) = pkg_reader.into_parts();
        let mut package = Self::new();

        for srel in pkg_srels {
            let is_external = srel.is_external();
            package
                .rels
                .load(srel.r_id, srel.reltype, srel.target_ref, is_external)?;
        }

        for spart in sparts {
            let mut part = Part::load(spart.partname, spart.content_type, spart.blob);
            for srel in spart.srels {
                let is_external = srel.is_external();
                part.rels_mut()
                    .load(srel.r_id, srel.reltype, srel.target_ref, is_external)?;
            }
            package.parts.insert(part.partname().clone(), part);
        }

        package.defaults = content_types
            .defaults()
            .iter()
            .map(|(ext, ct)| (ext.clone(), ct.clone()))
            .collect();

        debug!(parts = package.parts.len(), "package unmarshalled");
        Ok(package)
    }

    /// Partname of the main document (target of the officeDocument relationship).
    pub fn main_document_partname(&self) -> Result<PackURI> {
        self.rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()
    }

    /// Get a part by its partname.
    pub fn part(&self, partname: &PackURI) -> Result<&Part> {
        self.parts
            .get(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn part_mut(&mut self, partname: &PackURI) -> Result<&mut Part> {
        self.parts
            .get_mut(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    #[inline]
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    /// Add a new part. Fails if the partname is taken.
    pub fn add_part(&mut self, part: Part) -> Result<&mut Part> {
        let partname = part.partname().clone();
        if self.parts.contains_key(&partname) {
            return Err(OpcError::DuplicatePart(partname.to_string()));
        }
        debug!(partname = %partname, content_type = part.content_type(), "adding part");
        Ok(self.parts.entry(partname).or_insert(part))
    }

    /// Remove a part and return it.
    pub fn remove_part(&mut self, partname: &PackURI, mode: RemoveMode) -> Result<Part> {
        let inbound = self.references_to(partname);
        if !inbound.is_empty() {
            match mode {
                RemoveMode::Strict => {
                    let (source, r_id) = &inbound[0];
                    return Err(OpcError::PartInUse(format!(
                        "{} (referenced by {} from {})",
                        partname, r_id, source
                    )));
                },
                RemoveMode::Orphan => {
                    warn!(partname = %partname, references = inbound.len(), "removing referenced part");
                },
            }
        }
        self.parts
            .remove(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Internal relationships (source, id) that resolve to `partname`.
    ///
    /// The package itself appears as source "/". Self-references are ignored.
    pub fn references_to(&self, partname: &PackURI) -> Vec<(String, String)> {
        let package_refs = self
            .rels
            .ids_targeting(partname)
            .into_iter()
            .map(|r_id| (PACKAGE_URI.to_string(), r_id));
        let part_refs = self
            .parts
            .values()
            .filter(|part| part.partname() != partname)
            .flat_map(|part| {
                part.rels()
                    .ids_targeting(partname)
                    .into_iter()
                    .map(move |r_id| (part.partname().to_string(), r_id))
            });
        package_refs.chain(part_refs).collect()
    }

    /// Iterate parts in partname order.
    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    #[inline]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// First free partname for a template with a `%d` placeholder.
    ///
    /// ```
    /// use deckweave::ooxml::opc::OpcPackage;
    /// let pkg = OpcPackage::new();
    /// assert_eq!(pkg.next_partname("/ppt/slides/slide%d.xml").unwrap().as_str(), "/ppt/slides/slide1.xml");
    /// ```
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        if !template.contains("%d") {
            return Err(OpcError::InvalidPackUri(format!(
                "template '{}' has no %d placeholder",
                template
            )));
        }
        // With n parts at most n candidates can be taken.
        for n in 1..=self.parts.len() + 1 {
            let candidate = PackURI::new(template.replace("%d", &n.to_string()))?;
            if !self.parts.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(OpcError::InvalidPackUri(format!(
            "no free partname for template '{}'",
            template
        )))
    }

    /// Partnames reachable from the package relationships over internal edges.
    pub fn reachable_partnames(&self) -> BTreeSet<PackURI> {
        let mut visited = BTreeSet::new();
        let mut work_queue: Vec<PackURI> = self
            .rels
            .iter()
            .filter(|rel| !rel.is_external())
            .filter_map(|rel| rel.target_partname().ok())
            .collect();

        while let Some(partname) = work_queue.pop() {
            let Some(part) = self.parts.get(&partname) else {
                continue;
            };
            if !visited.insert(partname) {
                continue;
            }
            work_queue.extend(
                part.rels()
                    .iter()
                    .filter(|rel| !rel.is_external())
                    .filter_map(|rel| rel.target_partname().ok())
                    .filter(|target| !visited.contains(target)),
            );
        }
        visited
    }

    /// Remove every part not reachable from the package relationships.
    ///
    /// Returns the removed partnames.
    pub fn drop_unreachable(&mut self) -> Vec<PackURI> {
        let reachable = self.reachable_partnames();
        let unreachable: Vec<PackURI> = self
            .parts
            .keys()
            .filter(|partname| !reachable.contains(*partname))
            .cloned()
            .collect();
        for partname in &unreachable {
            debug!(partname = %partname, "dropping unreachable part");
            self.parts.remove(partname);
        }
        unreachable
    }

    /// Extension defaults declared by the package this was loaded from.
    #[inline]
    pub fn default_content_types(&self) -> &BTreeMap<String, String> {
        &self.defaults
    }

    /// Serialize to the bytes of a ZIP archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self)
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::{content_type as CT, relationship_type as RT};
    use crate::test_support::DeckBuilder;

    fn uri(s: &str) -> PackURI {
        PackURI::new(s).unwrap()
    }

    #[test]
    fn test_open_loads_every_member() {
        let bytes = DeckBuilder::new().slides(["One", "Two"]).build();
        let pkg = OpcPackage::from_bytes(&bytes).unwrap();

        assert_eq!(
            pkg.main_document_partname().unwrap(),
            uri("/ppt/presentation.xml")
        );
        assert!(pkg.contains_part(&uri("/ppt/slides/slide2.xml")));
        assert_eq!(
            pkg.part(&uri("/ppt/slides/slide1.xml"))
                .unwrap()
                .content_type(),
            CT::PML_SLIDE
        );
        assert!(matches!(
            pkg.part(&uri("/ppt/slides/slide9.xml")),
            Err(OpcError::PartNotFound(_))
        ));
    }

    #[test]
    fn test_strict_removal_of_referenced_part_fails() {
        let bytes = DeckBuilder::new().slides(["One"]).build();
        let mut pkg = OpcPackage::from_bytes(&bytes).unwrap();
        let layout = uri("/ppt/slideLayouts/slideLayout1.xml");

        assert!(matches!(
            pkg.remove_part(&layout, RemoveMode::Strict),
            Err(OpcError::PartInUse(_))
        ));
        assert!(pkg.contains_part(&layout));

        pkg.remove_part(&layout, RemoveMode::Orphan).unwrap();
        assert!(!pkg.contains_part(&layout));
    }

    #[test]
    fn test_unreferenced_part_can_be_removed_strictly() {
        let bytes = DeckBuilder::new().slides(["One"]).build();
        let mut pkg = OpcPackage::from_bytes(&bytes).unwrap();
        let extra = uri("/ppt/media/image9.png");
        pkg.add_part(Part::load(extra.clone(), CT::PNG, vec![1, 2, 3]))
            .unwrap();
        assert!(matches!(
            pkg.add_part(Part::load(extra.clone(), CT::PNG, vec![])),
            Err(OpcError::DuplicatePart(_))
        ));
        assert!(pkg.remove_part(&extra, RemoveMode::Strict).is_ok());
    }

    #[test]
    fn test_next_partname_fills_first_gap() {
        let bytes = DeckBuilder::new().slides(["One", "Two"]).build();
        let pkg = OpcPackage::from_bytes(&bytes).unwrap();
        assert_eq!(
            pkg.next_partname("/ppt/slides/slide%d.xml").unwrap(),
            uri("/ppt/slides/slide3.xml")
        );
        assert!(pkg.next_partname("/ppt/slides/slide.xml").is_err());
    }

    #[test]
    fn test_unreachable_parts_are_dropped() {
        let bytes = DeckBuilder::new().slides(["One", "Two"]).build();
        let mut pkg = OpcPackage::from_bytes(&bytes).unwrap();
        let pres = uri("/ppt/presentation.xml");
        let slide2 = uri("/ppt/slides/slide2.xml");

        let r_id = pkg.part(&pres).unwrap().rels().ids_targeting(&slide2)[0].clone();
        pkg.part_mut(&pres).unwrap().rels_mut().remove(&r_id);

        assert!(!pkg.reachable_partnames().contains(&slide2));
        let dropped = pkg.drop_unreachable();
        assert_eq!(dropped, vec![slide2.clone()]);
        assert!(!pkg.contains_part(&slide2));
        assert!(pkg.contains_part(&uri("/ppt/slides/slide1.xml")));
    }

    #[test]
    fn test_references_to_lists_sources() {
        let bytes = DeckBuilder::new().slides(["One", "Two"]).build();
        let pkg = OpcPackage::from_bytes(&bytes).unwrap();
        let refs = pkg.references_to(&uri("/ppt/slideLayouts/slideLayout1.xml"));
        let sources: Vec<&str> = refs.iter().map(|(source, _)| source.as_str()).collect();
        assert!(sources.contains(&"/ppt/slides/slide1.xml"));
        assert!(sources.contains(&"/ppt/slides/slide2.xml"));
        assert!(sources.contains(&"/ppt/slideMasters/slideMaster1.xml"));
        assert!(
            pkg.rels()
                .of_type(RT::OFFICE_DOCUMENT)
                .next()
                .is_some()
        );
    }
}
