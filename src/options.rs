//! Document construction options.

use crate::container::Compression;
use crate::docx::BorderStyle;
use crate::units::paper;

/// Page setup applied to the body-level section of a new document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSetup {
    /// Page width in twips
    pub width: i32,
    /// Page height in twips
    pub height: i32,
    pub margin_top: i32,
    pub margin_bottom: i32,
    pub margin_left: i32,
    pub margin_right: i32,
    /// Distance from the page top to the header, in twips
    pub header: i32,
    /// Distance from the page bottom to the footer, in twips
    pub footer: i32,
    /// Spacing between text columns, in twips
    pub column_space: i32,
    /// Document grid line pitch, in twips
    pub line_pitch: i32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageSetup {
    /// A4 portrait with 1" top/bottom and 1.25" side margins.
    pub fn a4() -> Self {
        Self::with_size(paper::A4)
    }

    pub fn a3() -> Self {
        Self::with_size(paper::A3)
    }

    pub fn a5() -> Self {
        Self::with_size(paper::A5)
    }

    pub fn letter() -> Self {
        Self::with_size(paper::LETTER)
    }

    pub fn legal() -> Self {
        Self::with_size(paper::LEGAL)
    }

    fn with_size((width, height): (i32, i32)) -> Self {
        Self {
            width,
            height,
            margin_top: 1440,
            margin_bottom: 1440,
            margin_left: 1800,
            margin_right: 1800,
            header: 851,
            footer: 992,
            column_space: 425,
            line_pitch: 312,
        }
    }

    /// Swap to landscape if the page is currently portrait.
    pub fn landscape(mut self) -> Self {
        if self.height > self.width {
            std::mem::swap(&mut self.width, &mut self.height);
        }
        self
    }

    /// Set all four page margins in twips.
    pub fn margins(mut self, top: i32, bottom: i32, left: i32, right: i32) -> Self {
        self.margin_top = top;
        self.margin_bottom = bottom;
        self.margin_left = left;
        self.margin_right = right;
        self
    }
}

/// Options for building and saving documents.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Page setup of the body-level section
    pub page: PageSetup,

    /// Width of new tables as a percentage of the text area
    pub table_width_percent: f64,

    /// Border applied to every edge of new tables, `None` for no borders
    pub table_border: Option<(BorderStyle, f64, String)>,

    /// ZIP compression used when saving
    pub compression: Compression,

    /// Indentation width for pretty-printed dumps
    pub indent: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            page: PageSetup::default(),
            table_width_percent: 100.0,
            table_border: Some((BorderStyle::Single, 0.5, "auto".to_string())),
            compression: Compression::Deflated,
            indent: 2,
        }
    }
}

impl DocumentOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page setup.
    pub fn with_page(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
    }

    /// Set the default table width in percent.
    pub fn with_table_width_percent(mut self, percent: f64) -> Self {
        self.table_width_percent = percent;
        self
    }

    /// Set the default table border (style, width in points, color).
    pub fn with_table_border(mut self, style: BorderStyle, width: f64, color: impl Into<String>) -> Self {
        self.table_border = Some((style, width, color.into()));
        self
    }

    /// Create tables without borders.
    pub fn without_table_borders(mut self) -> Self {
        self.table_border = None;
        self
    }

    /// Set the ZIP compression.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the indentation width of pretty-printed dumps.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = DocumentOptions::default();
        assert_eq!(opts.page, PageSetup::a4());
        assert_eq!(opts.page.width, 11906);
        assert_eq!(opts.table_width_percent, 100.0);
        assert_eq!(opts.compression, Compression::Deflated);
    }

    #[test]
    fn test_builder_chain() {
        let opts = DocumentOptions::new()
            .with_page(PageSetup::letter().landscape().margins(720, 720, 720, 720))
            .with_table_width_percent(50.0)
            .without_table_borders()
            .with_compression(Compression::Stored);

        assert_eq!(opts.page.width, 15840);
        assert_eq!(opts.page.height, 12240);
        assert_eq!(opts.page.margin_left, 720);
        assert!(opts.table_border.is_none());
        assert_eq!(opts.compression, Compression::Stored);
    }

    #[test]
    fn test_landscape_is_idempotent() {
        let once = PageSetup::a4().landscape();
        assert_eq!(once, once.landscape());
    }
}
