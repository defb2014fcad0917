//! Paragraph handles and paragraph formatting.

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::run::{FontStyle, Run};
use super::schema::{BR, P, P_PR, P_PR_ORDER, R, R_PR, VAL};
use super::section::{carried_section, Section};
use crate::xml::{NodeId, PropertyStore};

/// Horizontal alignment of paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justified,
    Distributed,
}

impl Alignment {
    fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "start",
            Alignment::Center => "center",
            Alignment::Right => "end",
            Alignment::Justified => "both",
            Alignment::Distributed => "distribute",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "start" | "left" => Alignment::Left,
            "center" => Alignment::Center,
            "end" | "right" => Alignment::Right,
            "both" => Alignment::Justified,
            "distribute" => Alignment::Distributed,
            _ => return None,
        })
    }
}

/// What a paragraph is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParagraphKind {
    Text,
    /// Only page breaks, no text
    PageBreak,
    /// Carries the properties of the section it ends
    SectionBreak,
}

/// Handle to a `w:p` element, in the body or in a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paragraph {
    node: Option<NodeId>,
}

impl Paragraph {
    pub(crate) fn from_node(node: Option<NodeId>) -> Self {
        Self { node }
    }

    /// The `w:p` element, if it is still part of the document.
    pub fn node(&self, doc: &Document) -> Option<NodeId> {
        self.node.filter(|&n| doc.tree.is(n, P))
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        self.node(doc).is_some()
    }

    /// Paragraph properties, created as the first child when missing.
    fn properties(&self, doc: &mut Document) -> Option<NodeId> {
        let p = self.node(doc)?;
        match doc.tree.child(p, P_PR) {
            Some(pr) => Some(pr),
            None => doc.tree.prepend_child(p, P_PR),
        }
    }

    fn property(&self, doc: &mut Document, name: &str) -> Option<NodeId> {
        let pr = self.properties(doc)?;
        doc.tree.child_or_insert_ordered(pr, name, P_PR_ORDER)
    }

    // ---- runs -------------------------------------------------------------

    pub fn first_run(&self, doc: &Document) -> Run {
        Run::from_node(self.node(doc).and_then(|p| doc.tree.child(p, R)))
    }

    pub fn runs(&self, doc: &Document) -> Vec<Run> {
        match self.node(doc) {
            Some(p) => doc
                .tree
                .children_named(p, R)
                .map(|r| Run::from_node(Some(r)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Append an empty run.
    pub fn append_run(&self, doc: &mut Document) -> Run {
        let r = self.node(doc).and_then(|p| doc.tree.append_child(p, R));
        if let Some(r) = r {
            doc.tree.append_child(r, R_PR);
        }
        Run::from_node(r)
    }

    /// Append a run holding `text`.
    pub fn append_run_with_text(&self, doc: &mut Document, text: &str) -> Run {
        let r = self.append_run(doc);
        if !text.is_empty() {
            r.append_text(doc, text);
        }
        r
    }

    /// Append a run holding `text` at `size` points.
    pub fn append_run_with_size(&self, doc: &mut Document, text: &str, size: f64) -> Run {
        let r = self.append_run_with_text(doc, text);
        if size > 0.0 {
            r.set_font_size(doc, size);
        }
        r
    }

    /// Append a run holding `text` at `size` points in the given fonts.
    pub fn append_run_with_font(
        &self,
        doc: &mut Document,
        text: &str,
        size: f64,
        ascii: &str,
        east_asia: Option<&str>,
    ) -> Run {
        let r = self.append_run_with_size(doc, text, size);
        if !ascii.is_empty() {
            r.set_font(doc, ascii, east_asia);
        }
        r
    }

    /// Append a run holding a page break.
    pub fn append_page_break(&self, doc: &mut Document) -> Run {
        let r = self.node(doc).and_then(|p| doc.tree.append_child(p, R));
        if let Some(br) = r.and_then(|r| doc.tree.append_child(r, BR)) {
            doc.tree.put_attr(br, "w:type", "page");
        }
        Run::from_node(r)
    }

    /// Replace the paragraph content with a single page break.
    pub fn set_as_page_break(&self, doc: &mut Document) {
        for r in self.runs(doc) {
            r.remove(doc);
        }
        self.append_page_break(doc);
    }

    /// Concatenated text of the runs.
    pub fn text(&self, doc: &Document) -> String {
        self.runs(doc).iter().map(|r| r.text(doc)).collect()
    }

    pub fn kind(&self, doc: &Document) -> ParagraphKind {
        if self.has_section_break(doc) {
            return ParagraphKind::SectionBreak;
        }
        let runs = self.runs(doc);
        if runs.iter().any(|r| r.is_page_break(doc)) && runs.iter().all(|r| r.text(doc).is_empty()) {
            ParagraphKind::PageBreak
        } else {
            ParagraphKind::Text
        }
    }

    // ---- traversal --------------------------------------------------------

    /// Next paragraph with the same parent.
    pub fn next(&self, doc: &Document) -> Paragraph {
        Paragraph::from_node(self.node(doc).and_then(|p| doc.tree.next_sibling(p, P)))
    }

    /// Previous paragraph with the same parent.
    pub fn prev(&self, doc: &Document) -> Paragraph {
        Paragraph::from_node(self.node(doc).and_then(|p| doc.tree.prev_sibling(p, P)))
    }

    // ---- sections ---------------------------------------------------------

    /// Section containing the paragraph.
    pub fn section(&self, doc: &Document) -> Section {
        Section::locate(doc, *self)
    }

    /// Check if the paragraph carries section properties.
    pub fn has_section_break(&self, doc: &Document) -> bool {
        self.node(doc)
            .and_then(|p| carried_section(&doc.tree, p))
            .is_some()
    }

    /// End the enclosing section at this paragraph.
    ///
    /// The section's properties are copied onto the paragraph, so both
    /// halves start out with the same page layout. Returns the section now
    /// ending here. A paragraph that already ends a section is left as is.
    pub fn insert_section_break(&self, doc: &mut Document) -> Section {
        let section = self.section(doc);
        if !section.is_valid(doc) || self.has_section_break(doc) {
            return section;
        }
        let source = section
            .last_paragraph(doc)
            .node(doc)
            .and_then(|last| carried_section(&doc.tree, last))
            .or_else(|| doc.body_section_properties());
        let (Some(source), Some(pr)) = (source, self.properties(doc)) else {
            return section;
        };

        doc.tree.append_copy(pr, source);
        // w:pPrChange is the only child ranked after w:sectPr
        if let Some(change) = doc.tree.child(pr, "w:pPrChange") {
            if doc.tree.append_copy(pr, change).is_some() {
                doc.tree.remove(change);
            }
        }
        log::debug!("inserted section break");
        self.section(doc)
    }

    /// Remove the section properties carried by this paragraph, fusing its
    /// section with the next one. Returns the fused section.
    pub fn remove_section_break(&self, doc: &mut Document) -> Section {
        if self.has_section_break(doc) {
            return self.section(doc).merge(doc);
        }
        self.section(doc)
    }

    // ---- formatting -------------------------------------------------------

    pub fn set_alignment(&self, doc: &mut Document, alignment: Alignment) {
        if let Some(jc) = self.property(doc, "w:jc") {
            doc.tree.put_attr(jc, VAL, alignment.as_str());
        }
    }

    pub fn alignment(&self, doc: &Document) -> Option<Alignment> {
        let pr = doc.tree.child(self.node(doc)?, P_PR)?;
        let jc = doc.tree.child(pr, "w:jc")?;
        doc.tree.attr(jc, VAL).and_then(Alignment::parse)
    }

    /// Reset the line spacing to single.
    pub fn set_line_spacing_single(&self, doc: &mut Document) {
        let Some(pr) = self.node(doc).and_then(|p| doc.tree.child(p, P_PR)) else {
            return;
        };
        if let Some(spacing) = doc.tree.child(pr, "w:spacing") {
            doc.tree.remove_attr(spacing, "w:line");
            doc.tree.remove_attr(spacing, "w:lineRule");
        }
    }

    /// Line spacing as a multiple of single lines, e.g. 1.5.
    pub fn set_line_spacing_lines(&self, doc: &mut Document, lines: f64) {
        // 240ths of a line
        self.set_line_spacing(doc, (lines * 240.0).round() as i32, "auto");
    }

    /// Line height of at least `twips`.
    pub fn set_line_spacing_at_least(&self, doc: &mut Document, twips: i32) {
        self.set_line_spacing(doc, twips, "atLeast");
    }

    /// Line height of exactly `twips`.
    pub fn set_line_spacing_exactly(&self, doc: &mut Document, twips: i32) {
        self.set_line_spacing(doc, twips, "exact");
    }

    fn set_line_spacing(&self, doc: &mut Document, line: i32, rule: &str) {
        if let Some(spacing) = self.property(doc, "w:spacing") {
            doc.tree.put_attr_i32(spacing, "w:line", line);
            doc.tree.put_attr(spacing, "w:lineRule", rule);
        }
    }

    /// Let the application choose the space before the paragraph.
    pub fn set_spacing_before_auto(&self, doc: &mut Document) {
        self.set_spacing_auto(doc, "w:beforeAutospacing");
    }

    /// Let the application choose the space after the paragraph.
    pub fn set_spacing_after_auto(&self, doc: &mut Document) {
        self.set_spacing_auto(doc, "w:afterAutospacing");
    }

    fn set_spacing_auto(&self, doc: &mut Document, attr: &str) {
        if let Some(spacing) = self.property(doc, "w:spacing") {
            doc.tree.put_attr(spacing, attr, "1");
        }
    }

    /// Space before the paragraph in lines.
    pub fn set_spacing_before_lines(&self, doc: &mut Document, lines: f64) {
        let value = (lines * 100.0).round() as i32;
        self.set_spacing(doc, "w:beforeAutospacing", "w:beforeLines", None, value);
    }

    /// Space after the paragraph in lines.
    pub fn set_spacing_after_lines(&self, doc: &mut Document, lines: f64) {
        let value = (lines * 100.0).round() as i32;
        self.set_spacing(doc, "w:afterAutospacing", "w:afterLines", None, value);
    }

    /// Space before the paragraph in twips.
    pub fn set_spacing_before(&self, doc: &mut Document, twips: i32) {
        self.set_spacing(doc, "w:beforeAutospacing", "w:before", Some("w:beforeLines"), twips);
    }

    /// Space after the paragraph in twips.
    pub fn set_spacing_after(&self, doc: &mut Document, twips: i32) {
        self.set_spacing(doc, "w:afterAutospacing", "w:after", Some("w:afterLines"), twips);
    }

    fn set_spacing(&self, doc: &mut Document, auto: &str, attr: &str, overriding: Option<&str>, value: i32) {
        let Some(spacing) = self.property(doc, "w:spacing") else {
            return;
        };
        doc.tree.remove_attr(spacing, auto);
        if let Some(overriding) = overriding {
            doc.tree.remove_attr(spacing, overriding);
        }
        doc.tree.put_attr_i32(spacing, attr, value);
    }

    fn set_indent(&self, doc: &mut Document, attr: &str, value: i32) {
        if let Some(ind) = self.property(doc, "w:ind") {
            doc.tree.put_attr_i32(ind, attr, value);
        }
    }

    /// Left indent in twips.
    pub fn set_left_indent(&self, doc: &mut Document, twips: i32) {
        self.set_indent(doc, "w:left", twips);
    }

    /// Right indent in twips.
    pub fn set_right_indent(&self, doc: &mut Document, twips: i32) {
        self.set_indent(doc, "w:right", twips);
    }

    /// Left indent in characters.
    pub fn set_left_indent_chars(&self, doc: &mut Document, chars: f64) {
        self.set_indent(doc, "w:leftChars", (chars * 100.0).round() as i32);
    }

    /// Right indent in characters.
    pub fn set_right_indent_chars(&self, doc: &mut Document, chars: f64) {
        self.set_indent(doc, "w:rightChars", (chars * 100.0).round() as i32);
    }

    /// First-line indent in twips.
    pub fn set_first_line_indent(&self, doc: &mut Document, twips: i32) {
        self.clear_indent(doc, &["w:hanging", "w:hangingChars"]);
        self.set_indent(doc, "w:firstLine", twips);
    }

    /// First-line indent in characters.
    pub fn set_first_line_indent_chars(&self, doc: &mut Document, chars: f64) {
        self.clear_indent(doc, &["w:hanging", "w:hangingChars"]);
        self.set_indent(doc, "w:firstLineChars", (chars * 100.0).round() as i32);
    }

    /// Hanging indent in twips. The left indent moves by the same amount so
    /// the first line stays in place.
    pub fn set_hanging_indent(&self, doc: &mut Document, twips: i32) {
        self.clear_indent(doc, &["w:firstLine", "w:firstLineChars"]);
        self.set_indent(doc, "w:hanging", twips);
        self.set_left_indent(doc, twips);
    }

    /// Hanging indent in characters.
    pub fn set_hanging_indent_chars(&self, doc: &mut Document, chars: f64) {
        self.clear_indent(doc, &["w:firstLine", "w:firstLineChars"]);
        self.set_indent(doc, "w:hangingChars", (chars * 100.0).round() as i32);
    }

    fn clear_indent(&self, doc: &mut Document, attrs: &[&str]) {
        let ind = self
            .node(doc)
            .and_then(|p| doc.tree.child(p, P_PR))
            .and_then(|pr| doc.tree.child(pr, "w:ind"));
        if let Some(ind) = ind {
            for attr in attrs {
                doc.tree.remove_attr(ind, attr);
            }
        }
    }

    /// Keep the paragraph on the same page as the next one.
    pub fn set_keep_next(&self, doc: &mut Document, keep: bool) {
        self.set_toggle(doc, "w:keepNext", keep);
    }

    /// Start the paragraph on a new page.
    pub fn set_page_break_before(&self, doc: &mut Document, enabled: bool) {
        self.set_toggle(doc, "w:pageBreakBefore", enabled);
    }

    fn set_toggle(&self, doc: &mut Document, name: &str, on: bool) {
        if on {
            self.property(doc, name);
        } else if let Some(el) = self
            .node(doc)
            .and_then(|p| doc.tree.child(p, P_PR))
            .and_then(|pr| doc.tree.child(pr, name))
        {
            doc.tree.remove(el);
        }
    }

    // ---- run helpers ------------------------------------------------------

    /// Set the font size of every run, in points.
    pub fn set_font_size(&self, doc: &mut Document, points: f64) {
        for r in self.runs(doc) {
            r.set_font_size(doc, points);
        }
    }

    /// Set the fonts of every run.
    pub fn set_font(&self, doc: &mut Document, ascii: &str, east_asia: Option<&str>) {
        for r in self.runs(doc) {
            r.set_font(doc, ascii, east_asia);
        }
    }

    /// Set the style flags of every run.
    pub fn set_font_style(&self, doc: &mut Document, style: FontStyle) {
        for r in self.runs(doc) {
            r.set_font_style(doc, style);
        }
    }

    /// Set the character spacing of every run, in twips.
    pub fn set_character_spacing(&self, doc: &mut Document, twips: i32) {
        for r in self.runs(doc) {
            r.set_character_spacing(doc, twips);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(doc: &Document, p: Paragraph, el: &str, name: &str) -> Option<String> {
        let pr = doc.tree.child(p.node(doc)?, P_PR)?;
        let el = doc.tree.child(pr, el)?;
        doc.tree.attr(el, name).map(str::to_string)
    }

    #[test]
    fn test_runs_and_text() {
        let mut doc = Document::new();
        let p = doc.append_paragraph();
        p.append_run_with_text(&mut doc, "Hello, ");
        p.append_run_with_size(&mut doc, "big", 16.0);
        p.append_run_with_font(&mut doc, " world", 0.0, "Arial", None);
        assert_eq!(p.text(&doc), "Hello, big world");
        assert_eq!(p.runs(&doc).len(), 3);
        assert_eq!(p.runs(&doc)[1].font_size(&doc), Some(16.0));
        assert_eq!(p.runs(&doc)[2].font_size(&doc), None);
        assert_eq!(
            p.runs(&doc)[2].font(&doc),
            Some(("Arial".to_string(), "Arial".to_string()))
        );
    }

    #[test]
    fn test_alignment() {
        let mut doc = Document::new();
        let p = doc.append_paragraph();
        assert_eq!(p.alignment(&doc), None);
        p.set_alignment(&mut doc, Alignment::Justified);
        assert_eq!(attr(&doc, p, "w:jc", VAL).as_deref(), Some("both"));
        assert_eq!(p.alignment(&doc), Some(Alignment::Justified));
    }

    #[test]
    fn test_line_spacing() {
        let mut doc = Document::new();
        let p = doc.append_paragraph();
        p.set_line_spacing_lines(&mut doc, 1.5);
        assert_eq!(attr(&doc, p, "w:spacing", "w:line").as_deref(), Some("360"));
        assert_eq!(attr(&doc, p, "w:spacing", "w:lineRule").as_deref(), Some("auto"));

        p.set_line_spacing_exactly(&mut doc, 300);
        assert_eq!(attr(&doc, p, "w:spacing", "w:lineRule").as_deref(), Some("exact"));

        p.set_line_spacing_single(&mut doc);
        assert_eq!(attr(&doc, p, "w:spacing", "w:line"), None);
        assert_eq!(attr(&doc, p, "w:spacing", "w:lineRule"), None);
    }

    #[test]
    fn test_paragraph_spacing() {
        let mut doc = Document::new();
        let p = doc.append_paragraph();
        p.set_spacing_before_auto(&mut doc);
        assert_eq!(attr(&doc, p, "w:spacing", "w:beforeAutospacing").as_deref(), Some("1"));

        p.set_spacing_before_lines(&mut doc, 0.5);
        assert_eq!(attr(&doc, p, "w:spacing", "w:beforeAutospacing"), None);
        assert_eq!(attr(&doc, p, "w:spacing", "w:beforeLines").as_deref(), Some("50"));

        p.set_spacing_before(&mut doc, 240);
        assert_eq!(attr(&doc, p, "w:spacing", "w:beforeLines"), None);
        assert_eq!(attr(&doc, p, "w:spacing", "w:before").as_deref(), Some("240"));

        p.set_spacing_after(&mut doc, 120);
        assert_eq!(attr(&doc, p, "w:spacing", "w:after").as_deref(), Some("120"));
    }

    #[test]
    fn test_indentation() {
        let mut doc = Document::new();
        let p = doc.append_paragraph();
        p.set_first_line_indent_chars(&mut doc, 2.0);
        assert_eq!(attr(&doc, p, "w:ind", "w:firstLineChars").as_deref(), Some("200"));

        p.set_hanging_indent(&mut doc, 360);
        assert_eq!(attr(&doc, p, "w:ind", "w:firstLineChars"), None);
        assert_eq!(attr(&doc, p, "w:ind", "w:hanging").as_deref(), Some("360"));
        assert_eq!(attr(&doc, p, "w:ind", "w:left").as_deref(), Some("360"));

        p.set_right_indent(&mut doc, 720);
        assert_eq!(attr(&doc, p, "w:ind", "w:right").as_deref(), Some("720"));
    }

    #[test]
    fn test_properties_stay_ordered_before_section() {
        let mut doc = Document::new();
        let p = doc.append_paragraph_with_text("end of part one");
        doc.append_paragraph_with_text("part two");
        p.insert_section_break(&mut doc);
        p.set_alignment(&mut doc, Alignment::Center);
        p.set_spacing_after(&mut doc, 100);
        p.set_keep_next(&mut doc, true);

        let pr = doc.tree.child(p.node(&doc).unwrap(), P_PR).unwrap();
        let names: Vec<&str> = doc.tree.children(pr).iter().filter_map(|&c| doc.tree.name(c)).collect();
        assert_eq!(names, vec!["w:keepNext", "w:spacing", "w:jc", "w:sectPr"]);
        assert!(p.has_section_break(&doc));
    }

    #[test]
    fn test_kinds() {
        let mut doc = Document::new();
        let text = doc.append_paragraph_with_text("text");
        let page = doc.append_paragraph_with_text("soon a break");
        page.set_as_page_break(&mut doc);
        let section = doc.append_section_break();
        doc.append_paragraph_with_text("tail");

        assert_eq!(text.kind(&doc), ParagraphKind::Text);
        assert_eq!(page.kind(&doc), ParagraphKind::PageBreak);
        assert_eq!(page.text(&doc), "");
        assert_eq!(section.kind(&doc), ParagraphKind::SectionBreak);
    }

    #[test]
    fn test_section_break_round_trip() {
        let mut doc = Document::new();
        let p1 = doc.append_paragraph_with_text("one");
        let p2 = doc.append_paragraph_with_text("two");

        let s = p1.insert_section_break(&mut doc);
        assert!(p1.has_section_break(&doc));
        assert_eq!(s.last_paragraph(&doc), p1);
        assert_eq!(doc.sections().len(), 2);

        let fused = p1.remove_section_break(&mut doc);
        assert!(!p1.has_section_break(&doc));
        assert_eq!(fused.last_paragraph(&doc), p2);
        assert_eq!(doc.sections().len(), 1);

        // not a carrier: nothing to remove
        let same = p1.remove_section_break(&mut doc);
        assert_eq!(same, fused);
    }

    #[test]
    fn test_run_helpers_apply_to_all_runs() {
        let mut doc = Document::new();
        let p = doc.append_paragraph();
        p.append_run_with_text(&mut doc, "a");
        p.append_run_with_text(&mut doc, "b");
        p.set_font_style(&mut doc, FontStyle::BOLD);
        p.set_character_spacing(&mut doc, 10);
        for r in p.runs(&doc) {
            assert_eq!(r.font_style(&doc), FontStyle::BOLD);
            assert_eq!(r.character_spacing(&doc), Some(10));
        }
    }

    #[test]
    fn test_traversal_in_cell() {
        let mut doc = Document::new();
        let t = doc.append_table(1, 1);
        let cell = t.cell(&doc, 0, 0);
        let first = cell.first_paragraph(&doc);
        let second = cell.append_paragraph(&mut doc);
        assert_eq!(first.next(&doc), second);
        assert_eq!(second.prev(&doc), first);
        assert!(!second.next(&doc).is_valid(&doc));
    }
}
