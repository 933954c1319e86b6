/// Structural mutators of the presentation graph: creating, deleting, moving
/// slides and rewiring a slide's layout.
use crate::common::error::{Error, Result, check_index};
use crate::common::xml::{XmlElement, qualify};
use crate::ooxml::opc::Part;
use crate::ooxml::opc::constants::{content_type as CT, relationship_type as RT};
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::placeholder::{PlaceholderType, placeholder_of, slide_from_layout};
use crate::ooxml::pptx::presentation::{MAX_SLIDE_ID, MIN_SLIDE_ID};
use crate::ooxml::pptx::shape::{has_text_frame, is_title_placeholder, shape_tree_mut, text_body_mut};
use crate::ooxml::pptx::text::set_text_frame_text;
use std::collections::BTreeSet;
use tracing::debug;

/// Partname template for new slides.
const SLIDE_PARTNAME_TEMPLATE: &str = "/ppt/slides/slide%d.xml";

/// Root children that precede `p:sldIdLst`.
const BEFORE_SLIDE_LIST: [&str; 3] = ["sldMasterIdLst", "notesMasterIdLst", "handoutMasterIdLst"];

impl Package {
    /// Add a slide based on layout `layout_index` at the end of the deck.
    ///
    /// `title` goes into the title placeholder, `body` into the first body
    /// placeholder or else the first other text-capable shape. A field with no
    /// matching shape is skipped. Returns the index of the new slide.
    pub fn create_slide_on_layout(
        &mut self,
        layout_index: usize,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<usize> {
        let layout_partname = self.layout_partname(layout_index)?;
        let mut slide_xml = slide_from_layout(self.opc().part(&layout_partname)?.xml()?);

        if let Some(title) = title.filter(|t| !t.is_empty()) {
            fill_title(&mut slide_xml, title);
        }
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            fill_body(&mut slide_xml, body);
        }

        let slide_partname = self.opc().next_partname(SLIDE_PARTNAME_TEMPLATE)?;
        let mut slide_part = Part::new_xml(slide_partname.clone(), CT::PML_SLIDE, slide_xml);
        slide_part.relate_to(&layout_partname, RT::SLIDE_LAYOUT);
        self.opc_mut().add_part(slide_part)?;

        let r_id = self.pres_part_mut()?.relate_to(&slide_partname, RT::SLIDE);
        let r_attr = self.r_id_attr()?;
        let root = self.pres_xml_mut()?;
        let list_qname = qualify(root.prefix(), "sldId");
        let list = slide_list_mut(root);

        let used: BTreeSet<u32> = list
            .children()
            .filter_map(|item| item.attr("id")?.parse::<u32>().ok())
            .collect();
        let next_id = next_slide_id(&used)?;
        list.push_child(
            XmlElement::new(list_qname)
                .with_attr("id", &next_id.to_string())
                .with_attr(&r_attr, &r_id),
        );

        let index = self.slide_count()? - 1;
        debug!(
            slide = %slide_partname,
            layout = %layout_partname,
            slide_id = next_id,
            r_id = %r_id,
            index,
            "created slide"
        );
        Ok(index)
    }

    /// Remove slide `index` from the deck.
    ///
    /// The slide-order entry and the presentation's relationship to the slide
    /// go; the slide part itself stays in the package, unreferenced.
    pub fn delete_slide(&mut self, index: usize) -> Result<()> {
        let entry = self.slide_entry_at(index)?;

        let root = self.pres_xml_mut()?;
        let list = root
            .child_mut("sldIdLst")
            .ok_or_else(|| Error::ReferenceNotFound("slide list".to_string()))?;
        list.remove_child(index);
        self.pres_part_mut()?.rels_mut().remove(&entry.r_id);

        debug!(slide = %entry.partname, r_id = %entry.r_id, index, "deleted slide");
        Ok(())
    }

    /// Move slide `from` so that it ends up at position `to`.
    ///
    /// Only the slide-order list changes.
    pub fn move_slide(&mut self, from: usize, to: usize) -> Result<()> {
        let count = self.slide_count()?;
        check_index("from_index", from, count)?;
        check_index("to_index", to, count)?;
        if from == to {
            return Ok(());
        }

        let root = self.pres_xml_mut()?;
        let list = root
            .child_mut("sldIdLst")
            .ok_or_else(|| Error::ReferenceNotFound("slide list".to_string()))?;
        let Some(item) = list.remove_child(from) else {
            return Err(Error::ReferenceNotFound(format!("slide entry {}", from)));
        };
        list.insert_child(to, item);

        debug!(from, to, "moved slide");
        Ok(())
    }

    /// Base slide `slide_index` on layout `layout_index`.
    ///
    /// Every slideLayout relationship of the slide is replaced by a single one;
    /// the slide content is untouched.
    pub fn set_slide_layout(&mut self, slide_index: usize, layout_index: usize) -> Result<()> {
        let slide_partname = self.slide_partname(slide_index)?;
        let layout_partname = self.layout_partname(layout_index)?;

        let r_id = self
            .opc_mut()
            .part_mut(&slide_partname)?
            .rels_mut()
            .replace_of_type(RT::SLIDE_LAYOUT, &layout_partname);

        debug!(slide = %slide_partname, layout = %layout_partname, r_id = %r_id, "rewired slide layout");
        Ok(())
    }
}

/// One above the largest id in use, or the lowest free id once that would
/// leave the allowed range.
fn next_slide_id(used: &BTreeSet<u32>) -> Result<u32> {
    let above_max = used
        .last()
        .map_or(Some(MIN_SLIDE_ID), |max| (*max).max(MIN_SLIDE_ID - 1).checked_add(1))
        .filter(|id| *id <= MAX_SLIDE_ID);
    if let Some(id) = above_max {
        return Ok(id);
    }
    (MIN_SLIDE_ID..=MAX_SLIDE_ID)
        .find(|id| !used.contains(id))
        .ok_or_else(|| Error::Unsupported("no free slide id left".to_string()))
}

/// `p:sldIdLst` of the presentation root, created in schema position when absent.
fn slide_list_mut(root: &mut XmlElement) -> &mut XmlElement {
    let qname = qualify(root.prefix(), "sldIdLst");
    root.get_or_insert_child(&qname, &BEFORE_SLIDE_LIST)
}

fn fill_title(slide: &mut XmlElement, title: &str) {
    let Some(tree) = shape_tree_mut(slide) else {
        return;
    };
    if let Some(shape) = tree.children_mut().find(|el| is_title_placeholder(el)) {
        set_text_frame_text(text_body_mut(shape), title);
    }
}

fn fill_body(slide: &mut XmlElement, body: &str) {
    let Some(tree) = shape_tree_mut(slide) else {
        return;
    };
    let is_body = |el: &XmlElement| {
        has_text_frame(el)
            && placeholder_of(el).is_some_and(|ph| ph.ph_type == PlaceholderType::Body)
    };
    let has_body = tree.children().any(|el| is_body(el));

    let target = tree.children_mut().find(|el| {
        if has_body {
            is_body(&**el)
        } else {
            has_text_frame(el) && !is_title_placeholder(el)
        }
    });
    if let Some(shape) = target {
        set_text_frame_text(text_body_mut(shape), body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::PackURI;
    use crate::ooxml::pptx::package::OrphanPolicy;
    use crate::ooxml::pptx::verify::validate;
    use crate::test_support::{DeckBuilder, rewrite_member};
    use proptest::prelude::*;

    fn deck(titles: &[&str]) -> Package {
        Package::from_bytes(&DeckBuilder::new().slides(titles.iter().copied()).build()).unwrap()
    }

    fn titles(pkg: &Package) -> Vec<String> {
        (0..pkg.slide_count().unwrap())
            .map(|i| pkg.slide_title(i).unwrap().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_create_slide_on_layout() {
        let mut pkg = deck(&["One"]);
        let index = pkg
            .create_slide_on_layout(0, Some("New"), Some("Line 1\nLine 2"))
            .unwrap();
        assert_eq!(index, 1);
        assert_eq!(pkg.slide_count().unwrap(), 2);

        let entry = pkg.slide_entry_at(1).unwrap();
        assert_eq!(entry.partname.as_str(), "/ppt/slides/slide2.xml");
        assert_eq!(entry.slide_id, 257);
        assert_eq!(pkg.slide_title(1).unwrap().as_deref(), Some("New"));
        assert_eq!(pkg.slide_texts(1).unwrap(), ["New", "Line 1\nLine 2"]);
        assert_eq!(
            pkg.slide_layout_partname(1).unwrap(),
            pkg.layout_partname(0).unwrap()
        );
    }

    #[test]
    fn test_create_slide_skips_missing_placeholders() {
        let mut pkg = deck(&["One"]);
        // The second layout only has a title and footer-like placeholders.
        let index = pkg.create_slide_on_layout(1, None, Some("ignored")).unwrap();
        assert_eq!(pkg.slide_texts(index).unwrap(), [""]);
        assert_eq!(pkg.shape_names(index).unwrap(), ["Title 1"]);
    }

    #[test]
    fn test_create_slide_layout_out_of_range() {
        let mut pkg = deck(&["One"]);
        let err = pkg.create_slide_on_layout(7, None, None).unwrap_err();
        assert_eq!(err.to_string(), "layout_index out of range: 7, total=2");
        assert_eq!(pkg.slide_count().unwrap(), 1);
    }

    #[test]
    fn test_create_slide_in_empty_deck_adds_slide_list() {
        let mut pkg = deck(&[]);
        assert_eq!(pkg.slide_count().unwrap(), 0);
        pkg.create_slide_on_layout(0, Some("First"), None).unwrap();
        assert_eq!(pkg.slide_entry_at(0).unwrap().slide_id, MIN_SLIDE_ID);

        let locals: Vec<&str> = pkg
            .pres_xml()
            .unwrap()
            .children()
            .map(|el| el.local_name())
            .collect();
        let masters = locals.iter().position(|l| *l == "sldMasterIdLst").unwrap();
        let slides = locals.iter().position(|l| *l == "sldIdLst").unwrap();
        assert_eq!(slides, masters + 1);
    }

    /// Fixture deck whose first slide id is replaced by `first_id`.
    fn deck_with_first_id(first_id: &str) -> Package {
        let bytes = DeckBuilder::new().slides(["One", "Two"]).build();
        let pres = crate::ooxml::opc::phys_pkg::PhysPkgReader::from_bytes(&bytes)
            .unwrap()
            .into_members()
            .remove("ppt/presentation.xml")
            .unwrap();
        let pres = String::from_utf8(pres)
            .unwrap()
            .replace(r#"<p:sldId id="256""#, &format!(r#"<p:sldId id="{}""#, first_id));
        Package::from_bytes(&rewrite_member(&bytes, "ppt/presentation.xml", pres.as_bytes()))
            .unwrap()
    }

    #[test]
    fn test_slide_id_wraps_to_lowest_free_id_at_ceiling() {
        let mut pkg = deck_with_first_id("2147483647");
        let index = pkg.create_slide_on_layout(0, Some("Three"), None).unwrap();
        assert_eq!(pkg.slide_entry_at(index).unwrap().slide_id, MIN_SLIDE_ID);

        let index = pkg.create_slide_on_layout(0, Some("Four"), None).unwrap();
        assert_eq!(pkg.slide_entry_at(index).unwrap().slide_id, 258);
    }

    #[test]
    fn test_slide_id_past_allowed_range_does_not_overflow() {
        let mut pkg = deck_with_first_id("4294967295");
        let index = pkg.create_slide_on_layout(0, None, None).unwrap();
        assert_eq!(pkg.slide_entry_at(index).unwrap().slide_id, MIN_SLIDE_ID);
    }

    #[test]
    fn test_next_slide_id() {
        assert_eq!(next_slide_id(&BTreeSet::new()).unwrap(), MIN_SLIDE_ID);
        assert_eq!(next_slide_id(&BTreeSet::from([3, 300])).unwrap(), 301);
        assert_eq!(next_slide_id(&BTreeSet::from([7])).unwrap(), MIN_SLIDE_ID);
        assert_eq!(
            next_slide_id(&BTreeSet::from([256, 257, MAX_SLIDE_ID])).unwrap(),
            258
        );
    }

    #[test]
    fn test_delete_then_validate_keeps_package_consistent() {
        for k in 0..3 {
            let mut pkg = deck(&["One", "Two", "Three"]);
            pkg.delete_slide(k).unwrap();
            assert_eq!(pkg.slide_count().unwrap(), 2);
            let bytes = pkg.to_bytes(OrphanPolicy::Preserve).unwrap();
            assert!(validate(&bytes).is_empty());
            assert_eq!(Package::from_bytes(&bytes).unwrap().slide_count().unwrap(), 2);
        }
    }

    #[test]
    fn test_index_bounds_are_uniform() {
        let mut pkg = deck(&["A", "B"]);
        for index in [2, 3] {
            let err = pkg.delete_slide(index).unwrap_err();
            assert_eq!(err.to_string(), format!("slide_index out of range: {}, total=2", index));

            let err = pkg.move_slide(index, 0).unwrap_err();
            assert_eq!(err.to_string(), format!("from_index out of range: {}, total=2", index));
            let err = pkg.move_slide(0, index).unwrap_err();
            assert_eq!(err.to_string(), format!("to_index out of range: {}, total=2", index));

            let err = pkg.set_slide_layout(index, 0).unwrap_err();
            assert_eq!(err.to_string(), format!("slide_index out of range: {}, total=2", index));
            let err = pkg.set_slide_layout(0, index).unwrap_err();
            assert_eq!(err.to_string(), format!("layout_index out of range: {}, total=2", index));

            let err = pkg.create_slide_on_layout(index, None, None).unwrap_err();
            assert_eq!(err.to_string(), format!("layout_index out of range: {}, total=2", index));
        }
        assert_eq!(titles(&pkg), ["A", "B"]);

        pkg.delete_slide(1).unwrap();
        pkg.move_slide(0, 0).unwrap();
        pkg.set_slide_layout(0, 1).unwrap();
        assert_eq!(titles(&pkg), ["A"]);
    }

    #[test]
    fn test_delete_slide_detaches_but_keeps_part() {
        let mut pkg = deck(&["One", "Two", "Three"]);
        pkg.delete_slide(1).unwrap();
        assert_eq!(titles(&pkg), ["One", "Three"]);

        let orphan = PackURI::new("/ppt/slides/slide2.xml").unwrap();
        assert!(pkg.opc().contains_part(&orphan));
        assert!(pkg.pres_part().unwrap().rels().ids_targeting(&orphan).is_empty());

        let err = pkg.delete_slide(2).unwrap_err();
        assert_eq!(err.to_string(), "slide_index out of range: 2, total=2");
    }

    #[test]
    fn test_new_relationship_ids_are_not_reused_after_delete() {
        let mut pkg = deck(&["One", "Two"]);
        let deleted = pkg.slide_entry_at(1).unwrap().r_id;
        pkg.delete_slide(1).unwrap();
        pkg.create_slide_on_layout(0, None, None).unwrap();
        assert_ne!(pkg.slide_entry_at(1).unwrap().r_id, deleted);
    }

    #[test]
    fn test_move_slide() {
        let mut pkg = deck(&["A", "B", "C", "D"]);
        pkg.move_slide(0, 2).unwrap();
        assert_eq!(titles(&pkg), ["B", "C", "A", "D"]);
        pkg.move_slide(3, 0).unwrap();
        assert_eq!(titles(&pkg), ["D", "B", "C", "A"]);
        pkg.move_slide(1, 1).unwrap();
        assert_eq!(titles(&pkg), ["D", "B", "C", "A"]);

        let err = pkg.move_slide(0, 4).unwrap_err();
        assert_eq!(err.to_string(), "to_index out of range: 4, total=4");
    }

    #[test]
    fn test_set_slide_layout_leaves_single_edge() {
        let mut pkg = deck(&["One", "Two"]);
        let slide = pkg.slide_partname(0).unwrap();
        let layout1 = pkg.layout_partname(0).unwrap();
        // A second, stray slideLayout edge is replaced as well.
        pkg.opc_mut()
            .part_mut(&slide)
            .unwrap()
            .relate_to(&layout1, RT::SLIDE_LAYOUT);

        pkg.set_slide_layout(0, 1).unwrap();
        let part = pkg.opc().part(&slide).unwrap();
        assert_eq!(part.rels().of_type(RT::SLIDE_LAYOUT).count(), 1);
        assert_eq!(pkg.slide_layout_partname(0).unwrap(), pkg.layout_partname(1).unwrap());
        assert_eq!(pkg.slide_title(0).unwrap().as_deref(), Some("One"));

        assert!(matches!(
            pkg.set_slide_layout(0, 2),
            Err(Error::IndexOutOfRange { what: "layout_index", .. })
        ));
        assert!(matches!(
            pkg.set_slide_layout(2, 0),
            Err(Error::IndexOutOfRange { what: "slide_index", .. })
        ));
    }

    #[test]
    fn test_set_slide_layout_twice_points_at_second_target() {
        let mut pkg = deck(&["One"]);
        let slide = pkg.slide_partname(0).unwrap();

        pkg.set_slide_layout(0, 1).unwrap();
        pkg.set_slide_layout(0, 0).unwrap();

        let part = pkg.opc().part(&slide).unwrap();
        assert_eq!(part.rels().of_type(RT::SLIDE_LAYOUT).count(), 1);
        assert_eq!(pkg.slide_layout_partname(0).unwrap(), pkg.layout_partname(0).unwrap());
        assert!(validate(&pkg.to_bytes(OrphanPolicy::Preserve).unwrap()).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_move_there_and_back_is_identity(count in 1usize..6, a in 0usize..6, b in 0usize..6) {
            let from = a % count;
            let to = b % count;
            let names: Vec<String> = (0..count).map(|i| format!("S{}", i)).collect();
            let mut pkg = deck(&names.iter().map(String::as_str).collect::<Vec<_>>());
            let before = pkg.slide_entries().unwrap();

            pkg.move_slide(from, to).unwrap();
            pkg.move_slide(to, from).unwrap();
            prop_assert_eq!(pkg.slide_entries().unwrap(), before);
        }
    }
}
