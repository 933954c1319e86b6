/// Read-side queries over the presentation graph: slide order, masters, layouts
/// and slide size.
use crate::common::error::{Error, Result, check_index};
use crate::common::xml::{XmlElement, qualify};
use crate::ooxml::opc::PackURI;
use crate::ooxml::opc::constants::relationship_type as RT;
use crate::ooxml::pptx::package::{Package, rels_prefix};
use tracing::debug;

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Lowest slide id allowed in `p:sldIdLst`.
pub const MIN_SLIDE_ID: u32 = 256;

/// Highest slide id allowed in `p:sldIdLst`.
pub const MAX_SLIDE_ID: u32 = 2_147_483_647;

/// One entry of the slide-order list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideEntry {
    /// Value of the `id` attribute.
    pub slide_id: u32,
    /// Relationship id in the presentation part's table.
    pub r_id: String,
    /// Resolved slide partname.
    pub partname: PackURI,
}

/// Preset slide dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlideSize {
    /// 13.333 x 7.5 in.
    Widescreen,
    /// 10 x 7.5 in.
    Standard,
    /// Explicit width and height in inches.
    Custom { width_inches: f64, height_inches: f64 },
}

impl SlideSize {
    /// Width and height in EMU.
    pub fn to_emu(self) -> (i64, i64) {
        let (w, h) = match self {
            SlideSize::Widescreen => (13.333, 7.5),
            SlideSize::Standard => (10.0, 7.5),
            SlideSize::Custom {
                width_inches,
                height_inches,
            } => (width_inches, height_inches),
        };
        (inches_to_emu(w), inches_to_emu(h))
    }
}

/// Convert inches to EMU, rounding to the nearest unit.
#[inline]
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}

/// `r:id` values of the children of `list`, in document order.
pub(crate) fn list_r_ids(list: &XmlElement, r_attr: &str) -> Vec<String> {
    list.children().filter_map(|item| item.attr(r_attr)).collect()
}

impl Package {
    pub(crate) fn r_id_attr(&self) -> Result<String> {
        Ok(qualify(Some(&rels_prefix(self.pres_xml()?)), "id"))
    }

    /// Number of entries in the slide-order list.
    pub fn slide_count(&self) -> Result<usize> {
        Ok(self
            .pres_xml()?
            .child("sldIdLst")
            .map_or(0, |list| list.children_named("sldId").count()))
    }

    /// The slide-order list with every relationship resolved.
    pub fn slide_entries(&self) -> Result<Vec<SlideEntry>> {
        let root = self.pres_xml()?;
        let r_attr = self.r_id_attr()?;
        let pres_part = self.pres_part()?;

        let Some(list) = root.child("sldIdLst") else {
            return Ok(Vec::new());
        };

        list.children_named("sldId")
            .map(|item| -> Result<SlideEntry> {
                let raw_id = item.attr("id").unwrap_or_default();
                let slide_id = raw_id
                    .parse::<u32>()
                    .map_err(|_| Error::Xml(format!("invalid slide id '{}'", raw_id)))?;
                let r_id = item.attr(&r_attr).ok_or_else(|| {
                    Error::ReferenceNotFound(format!("slide {} has no relationship id", slide_id))
                })?;
                let partname = pres_part.target_partname(&r_id)?;
                Ok(SlideEntry {
                    slide_id,
                    r_id,
                    partname,
                })
            })
            .collect()
    }

    /// Slide-order entry at `index`.
    pub fn slide_entry_at(&self, index: usize) -> Result<SlideEntry> {
        check_index("slide_index", index, self.slide_count()?)?;
        let mut entries = self.slide_entries()?;
        Ok(entries.swap_remove(index))
    }

    /// Slide partnames in presentation order.
    pub fn slide_partnames(&self) -> Result<Vec<PackURI>> {
        Ok(self
            .slide_entries()?
            .into_iter()
            .map(|entry| entry.partname)
            .collect())
    }

    /// Partname of the slide at `index`.
    pub fn slide_partname(&self, index: usize) -> Result<PackURI> {
        Ok(self.slide_entry_at(index)?.partname)
    }

    /// Registered slide masters, in roster order.
    pub fn master_partnames(&self) -> Result<Vec<PackURI>> {
        let root = self.pres_xml()?;
        let pres_part = self.pres_part()?;
        let Some(list) = root.child("sldMasterIdLst") else {
            return Ok(Vec::new());
        };
        list_r_ids(list, &self.r_id_attr()?)
            .iter()
            .map(|r_id| -> Result<PackURI> { Ok(pres_part.target_partname(r_id)?) })
            .collect()
    }

    /// Layouts of the first registered master, in its layout-list order.
    ///
    /// Falls back to the master's slideLayout relationships when it has no
    /// layout list.
    pub fn layout_partnames(&self) -> Result<Vec<PackURI>> {
        let Some(master_partname) = self.master_partnames()?.into_iter().next() else {
            return Ok(Vec::new());
        };
        let master = self.opc().part(&master_partname)?;
        let master_xml = master.xml()?;
        let r_attr = qualify(Some(&rels_prefix(master_xml)), "id");

        match master_xml.child("sldLayoutIdLst") {
            Some(list) => list_r_ids(list, &r_attr)
                .iter()
                .map(|r_id| -> Result<PackURI> { Ok(master.target_partname(r_id)?) })
                .collect(),
            None => Ok(master
                .rels()
                .of_type(RT::SLIDE_LAYOUT)
                .filter_map(|rel| rel.target_partname().ok())
                .collect()),
        }
    }

    pub fn layout_count(&self) -> Result<usize> {
        Ok(self.layout_partnames()?.len())
    }

    /// Partname of the layout at `index`.
    pub fn layout_partname(&self, index: usize) -> Result<PackURI> {
        let mut layouts = self.layout_partnames()?;
        check_index("layout_index", index, layouts.len())?;
        Ok(layouts.swap_remove(index))
    }

    /// Layout the slide at `index` is based on.
    pub fn slide_layout_partname(&self, index: usize) -> Result<PackURI> {
        let slide = self.slide_partname(index)?;
        Ok(self.opc().part(&slide)?.part_related_by(RT::SLIDE_LAYOUT)?)
    }

    /// Slide width and height in EMU, when declared.
    pub fn slide_size(&self) -> Result<Option<(i64, i64)>> {
        let Some(size) = self.pres_xml()?.child("sldSz") else {
            return Ok(None);
        };
        let cx = size.attr("cx").and_then(|v| v.parse().ok());
        let cy = size.attr("cy").and_then(|v| v.parse().ok());
        Ok(cx.zip(cy))
    }

    /// Set the slide dimensions.
    pub fn set_slide_size(&mut self, size: SlideSize) -> Result<()> {
        let (cx, cy) = size.to_emu();
        let root = self.pres_xml_mut()?;
        let qname = qualify(root.prefix(), "sldSz");
        let sld_sz = root.get_or_insert_child(
            &qname,
            &[
                "sldMasterIdLst",
                "notesMasterIdLst",
                "handoutMasterIdLst",
                "sldIdLst",
            ],
        );
        sld_sz.set_attr("cx", &cx.to_string());
        sld_sz.set_attr("cy", &cy.to_string());
        debug!(cx, cy, "slide size set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DeckBuilder;

    fn deck(titles: &[&str]) -> Package {
        Package::from_bytes(&DeckBuilder::new().slides(titles.iter().copied()).build()).unwrap()
    }

    #[test]
    fn test_slide_entries_follow_list_order() {
        let pkg = deck(&["One", "Two", "Three"]);
        let entries = pkg.slide_entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].slide_id, 256);
        assert_eq!(entries[2].partname.as_str(), "/ppt/slides/slide3.xml");
        assert_eq!(pkg.slide_count().unwrap(), 3);
    }

    #[test]
    fn test_slide_entry_out_of_range() {
        let pkg = deck(&["One"]);
        let err = pkg.slide_entry_at(1).unwrap_err();
        assert_eq!(err.to_string(), "slide_index out of range: 1, total=1");
    }

    #[test]
    fn test_layouts_come_from_first_master() {
        let pkg = deck(&["One"]);
        assert_eq!(
            pkg.master_partnames().unwrap(),
            vec![PackURI::new("/ppt/slideMasters/slideMaster1.xml").unwrap()]
        );
        assert_eq!(pkg.layout_count().unwrap(), 2);
        assert_eq!(
            pkg.layout_partname(1).unwrap().as_str(),
            "/ppt/slideLayouts/slideLayout2.xml"
        );
        assert!(matches!(
            pkg.layout_partname(2),
            Err(Error::IndexOutOfRange { what: "layout_index", index: 2, count: 2 })
        ));
        assert_eq!(
            pkg.slide_layout_partname(0).unwrap().as_str(),
            "/ppt/slideLayouts/slideLayout1.xml"
        );
    }

    #[test]
    fn test_slide_size_presets() {
        let mut pkg = deck(&["One"]);
        pkg.set_slide_size(SlideSize::Widescreen).unwrap();
        assert_eq!(pkg.slide_size().unwrap(), Some((12_192_000 - 305, 6_858_000)));

        pkg.set_slide_size(SlideSize::Standard).unwrap();
        assert_eq!(pkg.slide_size().unwrap(), Some((9_144_000, 6_858_000)));

        pkg.set_slide_size(SlideSize::Custom {
            width_inches: 5.0,
            height_inches: 2.5,
        })
        .unwrap();
        assert_eq!(pkg.slide_size().unwrap(), Some((4_572_000, 2_286_000)));
    }

    #[test]
    fn test_inches_to_emu_rounds() {
        assert_eq!(inches_to_emu(1.0), EMU_PER_INCH);
        assert_eq!(inches_to_emu(0.5), 457_200);
    }
}
