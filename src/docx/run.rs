//! Runs: stretches of text sharing character formatting.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::document::Document;
use super::schema::{BR, R, R_PR, R_PR_ORDER, T, VAL};
use crate::xml::{NodeId, PropertyStore};

bitflags! {
    /// Character style flags of a run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FontStyle: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
    }
}

/// Handle to a `w:r` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    node: Option<NodeId>,
}

impl Run {
    pub(crate) fn from_node(node: Option<NodeId>) -> Self {
        Self { node }
    }

    /// The `w:r` element, if it is still part of the document.
    pub fn node(&self, doc: &Document) -> Option<NodeId> {
        self.node.filter(|&n| doc.tree.is(n, R))
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        self.node(doc).is_some()
    }

    /// Run properties, created as the first child when missing.
    fn properties(&self, doc: &mut Document) -> Option<NodeId> {
        let r = self.node(doc)?;
        match doc.tree.child(r, R_PR) {
            Some(pr) => Some(pr),
            None => doc.tree.prepend_child(r, R_PR),
        }
    }

    fn property(&self, doc: &Document, name: &str) -> Option<NodeId> {
        let r = self.node(doc)?;
        doc.tree.child(doc.tree.child(r, R_PR)?, name)
    }

    /// Append a `w:t` holding `text`.
    ///
    /// Leading or trailing whitespace is kept with `xml:space="preserve"`.
    pub fn append_text(&self, doc: &mut Document, text: &str) {
        let Some(r) = self.node(doc) else {
            return;
        };
        if let Some(t) = doc.tree.append_child(r, T) {
            let edge_space = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
            if edge_space {
                doc.tree.put_attr(t, "xml:space", "preserve");
            }
            doc.tree.set_text(t, text);
        }
    }

    /// Concatenated text of the run's `w:t` children.
    pub fn text(&self, doc: &Document) -> String {
        match self.node(doc) {
            Some(r) => doc.tree.children_named(r, T).map(|t| doc.tree.text(t)).collect(),
            None => String::new(),
        }
    }

    /// Remove all content of the run, keeping its formatting.
    pub fn clear_text(&self, doc: &mut Document) {
        let Some(r) = self.node(doc) else {
            return;
        };
        let content: Vec<NodeId> = doc
            .tree
            .children(r)
            .iter()
            .copied()
            .filter(|&c| !doc.tree.is(c, R_PR))
            .collect();
        for c in content {
            doc.tree.remove(c);
        }
    }

    pub fn append_line_break(&self, doc: &mut Document) {
        if let Some(r) = self.node(doc) {
            doc.tree.append_child(r, BR);
        }
    }

    /// Set the font size in points.
    pub fn set_font_size(&self, doc: &mut Document, points: f64) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        // stored in half-points
        if let Some(sz) = doc.tree.child_or_insert_ordered(pr, "w:sz", R_PR_ORDER) {
            doc.tree.put_attr_i32(sz, VAL, (points * 2.0).round() as i32);
        }
    }

    /// Font size in points, `None` when unset.
    pub fn font_size(&self, doc: &Document) -> Option<f64> {
        let sz = self.property(doc, "w:sz")?;
        doc.tree.attr_i32(sz, VAL).map(|half| f64::from(half) / 2.0)
    }

    /// Set the Latin font and the East Asian font; the latter defaults to
    /// the former.
    pub fn set_font(&self, doc: &mut Document, ascii: &str, east_asia: Option<&str>) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        if let Some(fonts) = doc.tree.child_or_insert_ordered(pr, "w:rFonts", R_PR_ORDER) {
            doc.tree.put_attr(fonts, "w:ascii", ascii);
            doc.tree.put_attr(fonts, "w:hAnsi", ascii);
            doc.tree.put_attr(fonts, "w:eastAsia", east_asia.unwrap_or(ascii));
        }
    }

    /// Latin and East Asian font names.
    pub fn font(&self, doc: &Document) -> Option<(String, String)> {
        let fonts = self.property(doc, "w:rFonts")?;
        let get = |name| doc.tree.attr(fonts, name).unwrap_or_default().to_string();
        Some((get("w:ascii"), get("w:eastAsia")))
    }

    /// Replace the style flags of the run.
    pub fn set_font_style(&self, doc: &mut Document, style: FontStyle) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        let flags = [
            (FontStyle::BOLD, "w:b", None),
            (FontStyle::ITALIC, "w:i", None),
            (FontStyle::UNDERLINE, "w:u", Some("single")),
            (FontStyle::STRIKETHROUGH, "w:strike", Some("true")),
        ];
        for (flag, name, val) in flags {
            let existing = doc.tree.child(pr, name);
            match (style.contains(flag), existing) {
                (true, None) => {
                    let el = doc.tree.child_or_insert_ordered(pr, name, R_PR_ORDER);
                    if let (Some(el), Some(val)) = (el, val) {
                        doc.tree.put_attr(el, VAL, val);
                    }
                }
                (false, Some(el)) => {
                    doc.tree.remove(el);
                }
                _ => {}
            }
        }
    }

    pub fn font_style(&self, doc: &Document) -> FontStyle {
        let mut style = FontStyle::empty();
        for (flag, name) in [
            (FontStyle::BOLD, "w:b"),
            (FontStyle::ITALIC, "w:i"),
            (FontStyle::UNDERLINE, "w:u"),
            (FontStyle::STRIKETHROUGH, "w:strike"),
        ] {
            if self.property(doc, name).is_some() {
                style |= flag;
            }
        }
        style
    }

    /// Set the spacing between characters in twips.
    pub fn set_character_spacing(&self, doc: &mut Document, twips: i32) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        if let Some(spacing) = doc.tree.child_or_insert_ordered(pr, "w:spacing", R_PR_ORDER) {
            doc.tree.put_attr_i32(spacing, VAL, twips);
        }
    }

    pub fn character_spacing(&self, doc: &Document) -> Option<i32> {
        let spacing = self.property(doc, "w:spacing")?;
        doc.tree.attr_i32(spacing, VAL)
    }

    /// Check if the run holds a page break.
    pub fn is_page_break(&self, doc: &Document) -> bool {
        self.node(doc).is_some_and(|r| {
            doc.tree
                .children_named(r, BR)
                .any(|br| doc.tree.attr(br, "w:type") == Some("page"))
        })
    }

    /// Remove the run from its paragraph.
    pub fn remove(&self, doc: &mut Document) -> bool {
        match self.node(doc) {
            Some(r) => doc.tree.remove(r),
            None => false,
        }
    }

    /// Next run of the same paragraph.
    pub fn next(&self, doc: &Document) -> Run {
        Run::from_node(self.node(doc).and_then(|r| doc.tree.next_sibling(r, R)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_in_doc() -> (Document, Run) {
        let mut doc = Document::new();
        let p = doc.append_paragraph();
        let r = p.append_run(&mut doc);
        (doc, r)
    }

    #[test]
    fn test_text_and_whitespace() {
        let (mut doc, r) = run_in_doc();
        r.append_text(&mut doc, "Hello");
        r.append_text(&mut doc, " world ");
        assert_eq!(r.text(&doc), "Hello world ");

        let node = r.node(&doc).unwrap();
        let ts: Vec<NodeId> = doc.tree.children_named(node, T).collect();
        assert_eq!(doc.tree.attr(ts[0], "xml:space"), None);
        assert_eq!(doc.tree.attr(ts[1], "xml:space"), Some("preserve"));

        r.clear_text(&mut doc);
        assert_eq!(r.text(&doc), "");
        assert!(doc.tree.child(node, R_PR).is_some());
    }

    #[test]
    fn test_font_properties() {
        let (mut doc, r) = run_in_doc();
        r.set_font_size(&mut doc, 10.5);
        r.set_font(&mut doc, "Times New Roman", Some("SimSun"));
        r.set_character_spacing(&mut doc, 20);
        assert_eq!(r.font_size(&doc), Some(10.5));
        assert_eq!(
            r.font(&doc),
            Some(("Times New Roman".to_string(), "SimSun".to_string()))
        );
        assert_eq!(r.character_spacing(&doc), Some(20));

        // rFonts precedes spacing, which precedes sz
        let pr = doc.tree.child(r.node(&doc).unwrap(), R_PR).unwrap();
        let names: Vec<&str> = doc.tree.children(pr).iter().filter_map(|&c| doc.tree.name(c)).collect();
        assert_eq!(names, vec!["w:rFonts", "w:spacing", "w:sz"]);
    }

    #[test]
    fn test_font_style_flags() {
        let (mut doc, r) = run_in_doc();
        r.set_font_style(&mut doc, FontStyle::BOLD | FontStyle::UNDERLINE);
        assert_eq!(r.font_style(&doc), FontStyle::BOLD | FontStyle::UNDERLINE);

        r.set_font_style(&mut doc, FontStyle::ITALIC | FontStyle::UNDERLINE);
        assert_eq!(r.font_style(&doc), FontStyle::ITALIC | FontStyle::UNDERLINE);
        let u = r.property(&doc, "w:u").unwrap();
        assert_eq!(doc.tree.attr(u, VAL), Some("single"));

        r.set_font_style(&mut doc, FontStyle::empty());
        assert!(r.font_style(&doc).is_empty());
    }

    #[test]
    fn test_line_and_page_breaks() {
        let (mut doc, r) = run_in_doc();
        r.append_text(&mut doc, "a");
        r.append_line_break(&mut doc);
        r.append_text(&mut doc, "b");
        assert!(!r.is_page_break(&doc));
        assert_eq!(r.text(&doc), "ab");

        let p = doc.append_page_break();
        assert!(p.first_run(&doc).is_page_break(&doc));
    }

    #[test]
    fn test_remove_and_next() {
        let mut doc = Document::new();
        let p = doc.append_paragraph();
        let a = p.append_run_with_text(&mut doc, "a");
        let b = p.append_run_with_text(&mut doc, "b");
        assert_eq!(a.next(&doc), b);
        assert!(!b.next(&doc).is_valid(&doc));

        assert!(a.remove(&mut doc));
        assert!(!a.is_valid(&doc));
        assert_eq!(p.first_run(&doc), b);
        assert_eq!(p.text(&doc), "b");
        a.append_text(&mut doc, "ignored");
        assert_eq!(p.text(&doc), "b");
    }
}
