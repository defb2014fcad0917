//! Text frames: paragraphs positioned with `w:framePr`.

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::paragraph::Paragraph;
use super::run::Run;
use super::schema::{P_PR, P_BDR_ORDER, P_PR_ORDER, VAL};
use super::table::BorderStyle;
use crate::xml::{NodeId, PropertyStore};

/// What a frame position is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameAnchor {
    Page,
    Margin,
    Text,
}

impl FrameAnchor {
    fn as_str(&self) -> &'static str {
        match self {
            FrameAnchor::Page => "page",
            FrameAnchor::Margin => "margin",
            FrameAnchor::Text => "text",
        }
    }
}

/// Horizontal alignment of a frame relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalPosition {
    Left,
    Center,
    Right,
    Inside,
    Outside,
}

/// Vertical alignment of a frame relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalPosition {
    Top,
    Center,
    Bottom,
    Inside,
    Outside,
    Inline,
}

/// How body text flows around a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameWrapping {
    Auto,
    Around,
    NotBeside,
    None,
    Tight,
    Through,
}

/// A paragraph laid out as a floating frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFrame {
    paragraph: Paragraph,
}

impl TextFrame {
    pub(crate) fn from_paragraph(paragraph: Paragraph) -> Self {
        Self { paragraph }
    }

    /// Paragraph holding the frame content.
    pub fn paragraph(&self) -> Paragraph {
        self.paragraph
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        self.paragraph.is_valid(doc)
    }

    pub fn append_run_with_text(&self, doc: &mut Document, text: &str) -> Run {
        self.paragraph.append_run_with_text(doc, text)
    }

    fn frame_properties(&self, doc: &mut Document) -> Option<NodeId> {
        let p = self.paragraph.node(doc)?;
        let pr = match doc.tree.child(p, P_PR) {
            Some(pr) => pr,
            None => doc.tree.prepend_child(p, P_PR)?,
        };
        doc.tree.child_or_insert_ordered(pr, "w:framePr", P_PR_ORDER)
    }

    /// Frame attribute value, `None` when unset.
    pub fn attr(&self, doc: &Document, name: &str) -> Option<String> {
        let pr = doc.tree.child(self.paragraph.node(doc)?, P_PR)?;
        let frame = doc.tree.child(pr, "w:framePr")?;
        doc.tree.attr(frame, name).map(str::to_string)
    }

    /// Set the frame size in twips; the height is exact.
    pub fn set_size(&self, doc: &mut Document, width: i32, height: i32) {
        if let Some(frame) = self.frame_properties(doc) {
            doc.tree.put_attr_i32(frame, "w:w", width);
            doc.tree.put_attr_i32(frame, "w:h", height);
            doc.tree.put_attr(frame, "w:hRule", "exact");
        }
    }

    /// Align the frame horizontally relative to `anchor`.
    pub fn set_position_x(&self, doc: &mut Document, position: HorizontalPosition, anchor: FrameAnchor) {
        let align = match position {
            HorizontalPosition::Left => "left",
            HorizontalPosition::Center => "center",
            HorizontalPosition::Right => "right",
            HorizontalPosition::Inside => "inside",
            HorizontalPosition::Outside => "outside",
        };
        if let Some(frame) = self.frame_properties(doc) {
            doc.tree.remove_attr(frame, "w:x");
            doc.tree.put_attr(frame, "w:xAlign", align);
            doc.tree.put_attr(frame, "w:hAnchor", anchor.as_str());
        }
    }

    /// Place the frame `twips` from the left of `anchor`.
    pub fn set_position_x_twips(&self, doc: &mut Document, twips: i32, anchor: FrameAnchor) {
        if let Some(frame) = self.frame_properties(doc) {
            doc.tree.remove_attr(frame, "w:xAlign");
            doc.tree.put_attr_i32(frame, "w:x", twips);
            doc.tree.put_attr(frame, "w:hAnchor", anchor.as_str());
        }
    }

    /// Align the frame vertically relative to `anchor`.
    pub fn set_position_y(&self, doc: &mut Document, position: VerticalPosition, anchor: FrameAnchor) {
        let align = match position {
            VerticalPosition::Top => "top",
            VerticalPosition::Center => "center",
            VerticalPosition::Bottom => "bottom",
            VerticalPosition::Inside => "inside",
            VerticalPosition::Outside => "outside",
            VerticalPosition::Inline => "inline",
        };
        if let Some(frame) = self.frame_properties(doc) {
            doc.tree.remove_attr(frame, "w:y");
            doc.tree.put_attr(frame, "w:yAlign", align);
            doc.tree.put_attr(frame, "w:vAnchor", anchor.as_str());
        }
    }

    /// Place the frame `twips` from the top of `anchor`.
    pub fn set_position_y_twips(&self, doc: &mut Document, twips: i32, anchor: FrameAnchor) {
        if let Some(frame) = self.frame_properties(doc) {
            doc.tree.remove_attr(frame, "w:yAlign");
            doc.tree.put_attr_i32(frame, "w:y", twips);
            doc.tree.put_attr(frame, "w:vAnchor", anchor.as_str());
        }
    }

    pub fn set_wrapping(&self, doc: &mut Document, wrapping: FrameWrapping) {
        let val = match wrapping {
            FrameWrapping::Auto => "auto",
            FrameWrapping::Around => "around",
            FrameWrapping::NotBeside => "notBeside",
            FrameWrapping::None => "none",
            FrameWrapping::Tight => "tight",
            FrameWrapping::Through => "through",
        };
        if let Some(frame) = self.frame_properties(doc) {
            doc.tree.put_attr(frame, "w:wrap", val);
        }
    }

    /// Draw a border around the frame. `width` is in points.
    pub fn set_borders(&self, doc: &mut Document, style: BorderStyle, width: f64, color: &str) {
        let Some(p) = self.paragraph.node(doc) else {
            return;
        };
        let Some(pr) = doc.tree.child(p, P_PR) else {
            return;
        };
        let Some(bdr) = doc.tree.child_or_insert_ordered(pr, "w:pBdr", P_PR_ORDER) else {
            return;
        };
        for edge in ["w:top", "w:left", "w:bottom", "w:right"] {
            if let Some(el) = doc.tree.child_or_insert_ordered(bdr, edge, P_BDR_ORDER) {
                doc.tree.put_attr(el, VAL, style.as_str());
                doc.tree.put_attr_i32(el, "w:sz", (width * 8.0).round() as i32);
                doc.tree.put_attr_i32(el, "w:space", 0);
                doc.tree.put_attr(el, "w:color", color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_properties() {
        let mut doc = Document::new();
        doc.append_paragraph_with_text("Hello, World!");
        let frame = doc.append_text_frame(3500, 3500);
        frame.append_run_with_text(&mut doc, "TEST");
        frame.set_position_x(&mut doc, HorizontalPosition::Left, FrameAnchor::Page);
        frame.set_position_y(&mut doc, VerticalPosition::Top, FrameAnchor::Margin);
        frame.set_wrapping(&mut doc, FrameWrapping::Around);
        frame.set_borders(&mut doc, BorderStyle::Single, 0.5, "auto");

        assert_eq!(frame.attr(&doc, "w:w").as_deref(), Some("3500"));
        assert_eq!(frame.attr(&doc, "w:xAlign").as_deref(), Some("left"));
        assert_eq!(frame.attr(&doc, "w:hAnchor").as_deref(), Some("page"));
        assert_eq!(frame.attr(&doc, "w:vAnchor").as_deref(), Some("margin"));
        assert_eq!(frame.attr(&doc, "w:wrap").as_deref(), Some("around"));
        assert_eq!(frame.paragraph().text(&doc), "TEST");

        let p = frame.paragraph().node(&doc).unwrap();
        let pr = doc.tree.child(p, P_PR).unwrap();
        let names: Vec<&str> = doc.tree.children(pr).iter().filter_map(|&c| doc.tree.name(c)).collect();
        assert_eq!(names, vec!["w:framePr", "w:pBdr"]);
        let bdr = doc.tree.child(pr, "w:pBdr").unwrap();
        assert_eq!(doc.tree.children(bdr).len(), 4);
    }

    #[test]
    fn test_absolute_position_replaces_alignment() {
        let mut doc = Document::new();
        let frame = doc.append_text_frame(1000, 1000);
        frame.set_position_x(&mut doc, HorizontalPosition::Center, FrameAnchor::Margin);
        frame.set_position_x_twips(&mut doc, 567, FrameAnchor::Margin);
        assert_eq!(frame.attr(&doc, "w:xAlign"), None);
        assert_eq!(frame.attr(&doc, "w:x").as_deref(), Some("567"));
    }
}
