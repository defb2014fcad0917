//! Sections: page-layout scopes over the flat paragraph sequence.
//!
//! The body has no section element. A section ends at the first paragraph
//! whose `w:pPr` holds a `w:sectPr` (the carrier), or at the last body
//! paragraph, in which case the body-level `w:sectPr` applies. Sections are
//! recomputed from paragraph state on every query.

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::paragraph::Paragraph;
use super::schema::{P, P_PR, SECT_PR, SECT_PR_ORDER, VAL};
use crate::xml::{NodeId, PropertyStore, XmlTree};

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page number format of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageNumberFormat {
    /// 1, 2, 3
    Decimal,
    /// - 1 -, - 2 -
    NumberInDash,
    UpperRoman,
    LowerRoman,
    UpperLetter,
    LowerLetter,
}

impl PageNumberFormat {
    /// Value of the `w:fmt` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageNumberFormat::Decimal => "decimal",
            PageNumberFormat::NumberInDash => "numberInDash",
            PageNumberFormat::UpperRoman => "upperRoman",
            PageNumberFormat::LowerRoman => "lowerRoman",
            PageNumberFormat::UpperLetter => "upperLetter",
            PageNumberFormat::LowerLetter => "lowerLetter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "decimal" => PageNumberFormat::Decimal,
            "numberInDash" => PageNumberFormat::NumberInDash,
            "upperRoman" => PageNumberFormat::UpperRoman,
            "lowerRoman" => PageNumberFormat::LowerRoman,
            "upperLetter" => PageNumberFormat::UpperLetter,
            "lowerLetter" => PageNumberFormat::LowerLetter,
            _ => return None,
        })
    }
}

/// Page margins in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageMargins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// Snapshot of a section's page layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProperties {
    pub page_width: Option<i32>,
    pub page_height: Option<i32>,
    pub orientation: Orientation,
    pub margins: Option<PageMargins>,
    pub header: Option<i32>,
    pub footer: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number_format: Option<PageNumberFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number_start: Option<i32>,
    pub columns: i32,
    pub column_space: Option<i32>,
}

/// A contiguous range of body paragraphs sharing one `w:sectPr`.
///
/// Two sections are equal when they end at the same `w:sectPr`.
#[derive(Debug, Clone, Copy)]
pub struct Section {
    start: Option<NodeId>,
    last: Option<NodeId>,
    sect_pr: Option<NodeId>,
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.sect_pr == other.sect_pr
    }
}

impl Eq for Section {}

/// `w:sectPr` held by paragraph `p`, if it is a carrier.
pub(crate) fn carried_section(tree: &XmlTree, p: NodeId) -> Option<NodeId> {
    tree.child(tree.child(p, P_PR)?, SECT_PR)
}

impl Section {
    const INVALID: Section = Section {
        start: None,
        last: None,
        sect_pr: None,
    };

    /// Section containing the body paragraph `p`.
    pub fn locate(doc: &Document, p: Paragraph) -> Section {
        let Some(node) = p.node(doc) else {
            return Self::INVALID;
        };
        let tree = &doc.tree;
        let paragraphs: Vec<NodeId> = tree.children_named(doc.body, P).collect();
        let Some(index) = paragraphs.iter().position(|&n| n == node) else {
            return Self::INVALID;
        };

        let start = paragraphs[..index]
            .iter()
            .rposition(|&n| carried_section(tree, n).is_some())
            .map_or(0, |carrier| carrier + 1);

        for &candidate in &paragraphs[index..] {
            if let Some(sect_pr) = carried_section(tree, candidate) {
                return Section {
                    start: Some(paragraphs[start]),
                    last: Some(candidate),
                    sect_pr: Some(sect_pr),
                };
            }
        }
        match doc.body_section_properties() {
            Some(sect_pr) => Section {
                start: Some(paragraphs[start]),
                last: paragraphs.last().copied(),
                sect_pr: Some(sect_pr),
            },
            None => Self::INVALID,
        }
    }

    /// Check if the section still describes the current paragraph state.
    pub fn is_valid(&self, doc: &Document) -> bool {
        let (Some(start), Some(last), Some(sect_pr)) = (self.start, self.last, self.sect_pr) else {
            return false;
        };
        let tree = &doc.tree;
        if !tree.is(start, P) || !tree.is(last, P) || !tree.is(sect_pr, SECT_PR) {
            return false;
        }
        if tree.parent(start) != Some(doc.body) || tree.parent(last) != Some(doc.body) {
            return false;
        }
        let ends_here = match carried_section(tree, last) {
            Some(carried) => carried == sect_pr,
            None => {
                doc.body_section_properties() == Some(sect_pr)
                    && tree.last_child(doc.body, P) == Some(last)
            }
        };
        if !ends_here {
            return false;
        }

        // The range must still open right after a carrier (or at the body
        // start) and hold no carrier before `last`.
        let opens_here = tree
            .prev_sibling(start, P)
            .is_none_or(|prev| carried_section(tree, prev).is_some());
        if !opens_here {
            return false;
        }
        let mut current = start;
        while current != last {
            if carried_section(tree, current).is_some() {
                return false;
            }
            match tree.next_sibling(current, P) {
                Some(next) => current = next,
                None => return false,
            }
        }
        true
    }

    /// Check if the section ends at a paragraph carrier rather than the
    /// body-level properties.
    pub fn is_split(&self, doc: &Document) -> bool {
        self.is_valid(doc) && self.last.and_then(|l| carried_section(&doc.tree, l)).is_some()
    }

    pub fn first_paragraph(&self, doc: &Document) -> Paragraph {
        Paragraph::from_node(self.is_valid(doc).then_some(self.start).flatten())
    }

    /// The carrier, or the final body paragraph for the last section.
    pub fn last_paragraph(&self, doc: &Document) -> Paragraph {
        Paragraph::from_node(self.is_valid(doc).then_some(self.last).flatten())
    }

    /// Paragraphs of the section in document order.
    pub fn paragraphs(&self, doc: &Document) -> Vec<Paragraph> {
        if !self.is_valid(doc) {
            return Vec::new();
        }
        let mut inside = false;
        let mut out = Vec::new();
        for p in doc.tree.children_named(doc.body, P) {
            if Some(p) == self.start {
                inside = true;
            }
            if inside {
                out.push(Paragraph::from_node(Some(p)));
            }
            if Some(p) == self.last {
                break;
            }
        }
        out
    }

    /// Following section, invalid after the last one.
    pub fn next(&self, doc: &Document) -> Section {
        if !self.is_valid(doc) {
            return Self::INVALID;
        }
        let next = self.last.and_then(|l| doc.tree.next_sibling(l, P));
        match next {
            Some(p) => Self::locate(doc, Paragraph::from_node(Some(p))),
            None => Self::INVALID,
        }
    }

    /// Preceding section, invalid before the first one.
    pub fn prev(&self, doc: &Document) -> Section {
        if !self.is_valid(doc) {
            return Self::INVALID;
        }
        let prev = self.start.and_then(|s| doc.tree.prev_sibling(s, P));
        match prev {
            Some(p) => Self::locate(doc, Paragraph::from_node(Some(p))),
            None => Self::INVALID,
        }
    }

    /// Split the section after `at`, which must belong to it.
    ///
    /// Returns the earlier of the two sections, ending at `at`. When `at`
    /// already ends the section nothing changes.
    pub fn split(&self, doc: &mut Document, at: Paragraph) -> Section {
        if !self.is_valid(doc) || Self::locate(doc, at) != *self {
            return Self::INVALID;
        }
        at.insert_section_break(doc)
    }

    /// Remove the boundary ending this section, fusing it with the next.
    ///
    /// Returns the fused section. The last section has no boundary to
    /// remove and is returned unchanged.
    pub fn merge(&self, doc: &mut Document) -> Section {
        if !self.is_valid(doc) {
            return Self::INVALID;
        }
        let (Some(start), Some(last)) = (self.start, self.last) else {
            return Self::INVALID;
        };
        if let Some(sect_pr) = carried_section(&doc.tree, last) {
            doc.tree.remove(sect_pr);
            log::debug!("merged section ending at paragraph {:?}", last);
        }
        Self::locate(doc, Paragraph::from_node(Some(start)))
    }

    fn node(&self, doc: &Document) -> Option<NodeId> {
        self.is_valid(doc).then_some(self.sect_pr).flatten()
    }

    fn property(&self, doc: &Document, name: &str) -> Option<NodeId> {
        doc.tree.child(self.node(doc)?, name)
    }

    fn property_mut(&self, doc: &mut Document, name: &str) -> Option<NodeId> {
        let sect = self.node(doc)?;
        doc.tree.child_or_insert_ordered(sect, name, SECT_PR_ORDER)
    }

    /// Page width and height in twips.
    pub fn page_size(&self, doc: &Document) -> Option<(i32, i32)> {
        let sz = self.property(doc, "w:pgSz")?;
        Some((doc.tree.attr_i32(sz, "w:w")?, doc.tree.attr_i32(sz, "w:h")?))
    }

    pub fn set_page_size(&self, doc: &mut Document, width: i32, height: i32) {
        if let Some(sz) = self.property_mut(doc, "w:pgSz") {
            doc.tree.put_attr_i32(sz, "w:w", width);
            doc.tree.put_attr_i32(sz, "w:h", height);
        }
    }

    /// Orientation derived from the page size, falling back to `w:orient`
    /// for square pages.
    pub fn orientation(&self, doc: &Document) -> Option<Orientation> {
        let sz = self.property(doc, "w:pgSz")?;
        let width = doc.tree.attr_i32(sz, "w:w").unwrap_or(0);
        let height = doc.tree.attr_i32(sz, "w:h").unwrap_or(0);
        Some(match width.cmp(&height) {
            std::cmp::Ordering::Greater => Orientation::Landscape,
            std::cmp::Ordering::Less => Orientation::Portrait,
            std::cmp::Ordering::Equal => match doc.tree.attr(sz, "w:orient") {
                Some("landscape") => Orientation::Landscape,
                _ => Orientation::Portrait,
            },
        })
    }

    /// Set the orientation, swapping width and height only when the page
    /// does not already match.
    pub fn set_orientation(&self, doc: &mut Document, orientation: Orientation) {
        let current = self.orientation(doc);
        let Some(sz) = self.property_mut(doc, "w:pgSz") else {
            return;
        };
        if current.is_some() && current != Some(orientation) {
            let width = doc.tree.attr_i32(sz, "w:w").unwrap_or(0);
            let height = doc.tree.attr_i32(sz, "w:h").unwrap_or(0);
            doc.tree.put_attr_i32(sz, "w:w", height);
            doc.tree.put_attr_i32(sz, "w:h", width);
        }
        let val = match orientation {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        };
        doc.tree.put_attr(sz, "w:orient", val);
    }

    pub fn margins(&self, doc: &Document) -> Option<PageMargins> {
        let mar = self.property(doc, "w:pgMar")?;
        let get = |name| doc.tree.attr_i32(mar, name).unwrap_or(0);
        Some(PageMargins {
            top: get("w:top"),
            bottom: get("w:bottom"),
            left: get("w:left"),
            right: get("w:right"),
        })
    }

    /// Set the four page margins in twips.
    pub fn set_margins(&self, doc: &mut Document, top: i32, bottom: i32, left: i32, right: i32) {
        if let Some(mar) = self.property_mut(doc, "w:pgMar") {
            doc.tree.put_attr_i32(mar, "w:top", top);
            doc.tree.put_attr_i32(mar, "w:bottom", bottom);
            doc.tree.put_attr_i32(mar, "w:left", left);
            doc.tree.put_attr_i32(mar, "w:right", right);
        }
    }

    /// Header and footer distances from the page edge, in twips.
    pub fn header_footer(&self, doc: &Document) -> Option<(i32, i32)> {
        let mar = self.property(doc, "w:pgMar")?;
        Some((
            doc.tree.attr_i32(mar, "w:header")?,
            doc.tree.attr_i32(mar, "w:footer")?,
        ))
    }

    pub fn set_header_footer(&self, doc: &mut Document, header: i32, footer: i32) {
        if let Some(mar) = self.property_mut(doc, "w:pgMar") {
            doc.tree.put_attr_i32(mar, "w:header", header);
            doc.tree.put_attr_i32(mar, "w:footer", footer);
        }
    }

    /// Set the page number format, optionally restarting numbering at
    /// `start`.
    pub fn set_page_number(&self, doc: &mut Document, format: PageNumberFormat, start: Option<i32>) {
        let Some(num) = self.property_mut(doc, "w:pgNumType") else {
            return;
        };
        doc.tree.put_attr(num, "w:fmt", format.as_str());
        match start {
            Some(start) => {
                doc.tree.put_attr_i32(num, "w:start", start);
            }
            None => {
                doc.tree.remove_attr(num, "w:start");
            }
        }
    }

    pub fn page_number(&self, doc: &Document) -> Option<(PageNumberFormat, Option<i32>)> {
        let num = self.property(doc, "w:pgNumType")?;
        let format = doc
            .tree
            .attr(num, "w:fmt")
            .and_then(PageNumberFormat::parse)
            .unwrap_or(PageNumberFormat::Decimal);
        Some((format, doc.tree.attr_i32(num, "w:start")))
    }

    /// Set the number of text columns and the space between them.
    pub fn set_columns(&self, doc: &mut Document, count: i32, space: i32) {
        if let Some(cols) = self.property_mut(doc, "w:cols") {
            doc.tree.put_attr_i32(cols, "w:num", count);
            doc.tree.put_attr_i32(cols, "w:space", space);
        }
    }

    /// Column count (1 when unset) and spacing.
    pub fn columns(&self, doc: &Document) -> Option<(i32, Option<i32>)> {
        self.node(doc)?;
        match self.property(doc, "w:cols") {
            Some(cols) => Some((
                doc.tree.attr_i32(cols, "w:num").unwrap_or(1),
                doc.tree.attr_i32(cols, "w:space"),
            )),
            None => Some((1, None)),
        }
    }

    /// Snapshot of the page layout.
    pub fn properties(&self, doc: &Document) -> Option<SectionProperties> {
        self.node(doc)?;
        let size = self.page_size(doc);
        let (format, start) = self.page_number(doc).unzip();
        let (columns, column_space) = self.columns(doc).unwrap_or((1, None));
        let header_footer = self.header_footer(doc);
        Some(SectionProperties {
            page_width: size.map(|s| s.0),
            page_height: size.map(|s| s.1),
            orientation: self.orientation(doc).unwrap_or(Orientation::Portrait),
            margins: self.margins(doc),
            header: header_footer.map(|h| h.0),
            footer: header_footer.map(|h| h.1),
            page_number_format: format,
            page_number_start: start.flatten(),
            columns,
            column_space,
        })
    }

    /// The `w:type` break kind of the section, if set.
    pub fn break_type(&self, doc: &Document) -> Option<String> {
        let ty = self.property(doc, "w:type")?;
        doc.tree.attr(ty, VAL).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn six_paragraphs() -> (Document, Vec<Paragraph>) {
        let mut doc = Document::new();
        let ps = (1..=6)
            .map(|i| doc.append_paragraph_with_text(&format!("P{}", i)))
            .collect();
        (doc, ps)
    }

    #[test]
    fn test_single_section_covers_body() {
        let (doc, ps) = six_paragraphs();
        let s = doc.first_section();
        assert!(s.is_valid(&doc));
        assert!(!s.is_split(&doc));
        assert_eq!(s, doc.last_section());
        assert_eq!(s.first_paragraph(&doc), ps[0]);
        assert_eq!(s.last_paragraph(&doc), ps[5]);
        assert_eq!(s.paragraphs(&doc).len(), 6);
        assert!(!s.next(&doc).is_valid(&doc));
        assert!(!s.prev(&doc).is_valid(&doc));
    }

    #[test]
    fn test_split_scenario() {
        let (mut doc, ps) = six_paragraphs();
        let s = doc.first_section();
        let first = s.split(&mut doc, ps[1]);
        assert_eq!(first.last_paragraph(&doc), ps[1]);
        let s2 = first.next(&doc);
        s2.split(&mut doc, ps[3]);

        let s1 = doc.first_section();
        assert_eq!(s1.last_paragraph(&doc), ps[1]);
        let s2 = s1.next(&doc);
        assert_eq!(s2.first_paragraph(&doc), ps[2]);
        assert_eq!(s2.last_paragraph(&doc), ps[3]);
        let s3 = s2.next(&doc);
        assert_eq!(s3.last_paragraph(&doc), ps[5]);
        assert_eq!(s3, doc.last_section());
        assert_eq!(s3.prev(&doc), s2);
        assert_eq!(s2.prev(&doc), s1);
        assert_eq!(doc.section_of(ps[4]), s3);
    }

    #[test]
    fn test_split_copies_page_layout() {
        let (mut doc, ps) = six_paragraphs();
        let s = doc.first_section();
        s.set_page_size(&mut doc, 1000, 2000);
        let first = s.split(&mut doc, ps[2]);
        let second = first.next(&doc);
        assert_eq!(first.page_size(&doc), Some((1000, 2000)));
        first.set_page_size(&mut doc, 3000, 4000);
        assert_eq!(second.page_size(&doc), Some((1000, 2000)));
    }

    #[test]
    fn test_split_at_carrier_is_noop() {
        let (mut doc, ps) = six_paragraphs();
        let first = doc.first_section().split(&mut doc, ps[2]);
        let again = first.split(&mut doc, ps[2]);
        assert_eq!(first, again);
        assert_eq!(doc.sections().len(), 2);
    }

    #[test]
    fn test_split_outside_section_is_invalid() {
        let (mut doc, ps) = six_paragraphs();
        let first = doc.first_section().split(&mut doc, ps[2]);
        assert!(!first.split(&mut doc, ps[4]).is_valid(&doc));
        assert_eq!(doc.sections().len(), 2);
    }

    #[test]
    fn test_split_merge_roundtrip() {
        let (mut doc, ps) = six_paragraphs();
        let before = doc.first_section().properties(&doc).unwrap();
        let first = doc.first_section().split(&mut doc, ps[3]);
        assert_eq!(doc.sections().len(), 2);

        let fused = first.merge(&mut doc);
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(fused.first_paragraph(&doc), ps[0]);
        assert_eq!(fused.last_paragraph(&doc), ps[5]);
        assert_eq!(fused.properties(&doc).unwrap(), before);
        assert!(!ps[3].has_section_break(&doc));
    }

    #[test]
    fn test_merge_last_section_is_noop() {
        let (mut doc, _) = six_paragraphs();
        let last = doc.last_section();
        assert_eq!(last.merge(&mut doc), last);
    }

    #[test]
    fn test_stale_section_after_merge() {
        let (mut doc, ps) = six_paragraphs();
        let first = doc.first_section().split(&mut doc, ps[1]);
        first.merge(&mut doc);
        assert!(!first.is_valid(&doc));
        assert!(first.paragraphs(&doc).is_empty());
        assert_eq!(first.page_size(&doc), None);
    }

    #[test]
    fn test_stale_section_rejects_layout_writes() {
        let (mut doc, ps) = six_paragraphs();
        let whole = doc.first_section();
        ps[2].insert_section_break(&mut doc);
        assert!(!whole.is_valid(&doc));

        whole.set_page_size(&mut doc, 1000, 2000);
        assert_eq!(whole.page_size(&doc), None);
        assert_eq!(doc.last_section().page_size(&doc), Some((11906, 16838)));
    }

    #[test]
    fn test_orientation_is_idempotent() {
        let (mut doc, _) = six_paragraphs();
        let s = doc.first_section();
        assert_eq!(s.orientation(&doc), Some(Orientation::Portrait));
        s.set_orientation(&mut doc, Orientation::Landscape);
        s.set_orientation(&mut doc, Orientation::Landscape);
        assert_eq!(s.page_size(&doc), Some((16838, 11906)));
        assert_eq!(s.orientation(&doc), Some(Orientation::Landscape));
        s.set_orientation(&mut doc, Orientation::Portrait);
        assert_eq!(s.page_size(&doc), Some((11906, 16838)));
    }

    #[test]
    fn test_square_page_uses_orient_attribute() {
        let (mut doc, _) = six_paragraphs();
        let s = doc.first_section();
        s.set_page_size(&mut doc, 10000, 10000);
        s.set_orientation(&mut doc, Orientation::Landscape);
        assert_eq!(s.page_size(&doc), Some((10000, 10000)));
        assert_eq!(s.orientation(&doc), Some(Orientation::Landscape));
    }

    #[test]
    fn test_page_layout_accessors() {
        let (mut doc, _) = six_paragraphs();
        let s = doc.first_section();
        s.set_margins(&mut doc, 100, 200, 300, 400);
        s.set_header_footer(&mut doc, 50, 60);
        s.set_page_number(&mut doc, PageNumberFormat::UpperLetter, Some(1));
        s.set_columns(&mut doc, 2, 720);

        let props = s.properties(&doc).unwrap();
        assert_eq!(
            props.margins,
            Some(PageMargins {
                top: 100,
                bottom: 200,
                left: 300,
                right: 400
            })
        );
        assert_eq!((props.header, props.footer), (Some(50), Some(60)));
        assert_eq!(props.page_number_format, Some(PageNumberFormat::UpperLetter));
        assert_eq!(props.page_number_start, Some(1));
        assert_eq!((props.columns, props.column_space), (2, Some(720)));

        s.set_page_number(&mut doc, PageNumberFormat::NumberInDash, None);
        assert_eq!(s.page_number(&doc), Some((PageNumberFormat::NumberInDash, None)));

        // pgNumType sits between pgMar and cols
        let sect = s.node(&doc).unwrap();
        let names: Vec<&str> = doc
            .tree
            .children(sect)
            .iter()
            .filter_map(|&c| doc.tree.name(c))
            .collect();
        assert_eq!(names, vec!["w:pgSz", "w:pgMar", "w:pgNumType", "w:cols", "w:docGrid"]);
    }

    #[test]
    fn test_tables_do_not_break_sections() {
        let mut doc = Document::new();
        let p1 = doc.append_paragraph_with_text("before");
        doc.append_table(2, 2);
        let p2 = doc.append_paragraph_with_text("after");
        let s = doc.section_of(p1);
        assert_eq!(s, doc.section_of(p2));
        assert_eq!(s.paragraphs(&doc), vec![p1, p2]);

        // cell paragraphs are not body paragraphs
        let cell_p = doc.tables()[0].cell(&doc, 0, 0).first_paragraph(&doc);
        assert!(!doc.section_of(cell_p).is_valid(&doc));
    }

    #[test]
    fn test_properties_serialize() {
        let (doc, _) = six_paragraphs();
        let props = doc.first_section().properties(&doc).unwrap();
        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["pageWidth"], 11906);
        assert_eq!(json["orientation"], "portrait");
        assert!(json.get("pageNumberFormat").is_none());
    }
}
