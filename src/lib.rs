//! # docxcraft
//!
//! Build and edit Microsoft Word (DOCX) documents.
//!
//! This library keeps the body of a document as an element tree and hands out
//! small `Copy` handles (paragraphs, runs, sections, tables, cells) that are
//! resolved against the document on every call. Sections are derived from
//! section-break paragraphs, and tables keep a logical grid that tracks
//! merged cells.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docxcraft::{Document, Orientation};
//!
//! let mut doc = Document::new();
//! doc.append_paragraph_with_text("Portrait page");
//! let first = doc.append_section_break().section(&doc);
//! doc.append_paragraph_with_text("Landscape page");
//! doc.last_section().set_orientation(&mut doc, Orientation::Landscape);
//! assert_eq!(first.next(&doc), doc.last_section());
//!
//! let table = doc.append_table(3, 4);
//! let mut a = table.cell(&doc, 0, 0);
//! let mut b = table.cell(&doc, 0, 1);
//! table.merge_cells(&mut doc, &mut a, &mut b);
//!
//! doc.save("output.docx")?;
//! # Ok::<(), docxcraft::Error>(())
//! ```
//!
//! ## Loading Documents
//!
//! ```no_run
//! let doc = docxcraft::open("report.docx")?;
//! for section in doc.sections() {
//!     println!("{} paragraphs", section.paragraphs(&doc).len());
//! }
//! # Ok::<(), docxcraft::Error>(())
//! ```

pub mod container;
pub mod docx;
pub mod error;
pub mod options;
pub mod units;
pub mod xml;

// Re-exports
pub use container::{Compression, DocxPackage};
pub use docx::{
    Alignment, BorderEdge, BorderStyle, CellAlignment, Document, DocumentOutline, FontStyle,
    FrameAnchor, FrameWrapping, HorizontalPosition, JsonFormat, Orientation, PageMargins,
    PageNumberFormat, Paragraph, ParagraphKind, Run, Section, SectionOutline, SectionProperties,
    Side, Table, TableAlignment, TableCell, TableOutline, TableWidth, TextFrame, VerticalPosition,
};
pub use error::{Error, Result};
pub use options::{DocumentOptions, PageSetup};

use std::path::Path;

/// Open a DOCX file.
///
/// # Example
///
/// ```no_run
/// let doc = docxcraft::open("document.docx")?;
/// println!("Paragraphs: {}", doc.paragraph_count());
/// # Ok::<(), docxcraft::Error>(())
/// ```
pub fn open(path: impl AsRef<Path>) -> Result<Document> {
    Document::open(path)
}

/// Load a DOCX document from bytes.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("document.docx")?;
/// let doc = docxcraft::from_bytes(data)?;
/// # Ok::<(), docxcraft::Error>(())
/// ```
pub fn from_bytes(data: Vec<u8>) -> Result<Document> {
    Document::from_bytes(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_round_trip() {
        let mut doc = Document::new();
        doc.append_paragraph_with_text("hello");
        let bytes = doc.to_bytes().unwrap();

        let loaded = from_bytes(bytes).unwrap();
        assert_eq!(loaded.paragraph_count(), 1);
        assert_eq!(loaded.first_paragraph().text(&loaded), "hello");
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(open("does-not-exist.docx"), Err(Error::Io(_))));
    }
}
