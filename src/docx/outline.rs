//! Serializable structural summary of a document.

use serde::Serialize;

use super::document::Document;
use super::paragraph::Paragraph;
use super::section::SectionProperties;
use super::table::GridCell;
use crate::error::Result;

/// JSON output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

/// Sections and tables of a document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutline {
    pub paragraph_count: usize,
    pub sections: Vec<SectionOutline>,
    pub tables: Vec<TableOutline>,
}

/// One section: its paragraph range (0-based body indices) and page layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionOutline {
    pub first_paragraph: usize,
    pub last_paragraph: usize,
    pub paragraph_count: usize,
    /// Ends at a paragraph carrier rather than the body-level properties
    pub split: bool,
    pub properties: Option<SectionProperties>,
}

/// One body table: grid size, physical cells per row and merged regions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOutline {
    pub rows: usize,
    pub cols: usize,
    pub physical_cells: Vec<usize>,
    pub merged: Vec<GridCell>,
}

impl DocumentOutline {
    pub fn from_document(doc: &Document) -> Self {
        let body: Vec<_> = doc.paragraphs();
        let index_of = |p: Paragraph| body.iter().position(|&b| b == p).unwrap_or(0);

        let sections = doc
            .sections()
            .iter()
            .map(|s| {
                let paragraphs = s.paragraphs(doc);
                SectionOutline {
                    first_paragraph: index_of(s.first_paragraph(doc)),
                    last_paragraph: index_of(s.last_paragraph(doc)),
                    paragraph_count: paragraphs.len(),
                    split: s.is_split(doc),
                    properties: s.properties(doc),
                }
            })
            .collect();

        let tables = doc
            .tables()
            .iter()
            .filter_map(|t| {
                let grid = t.grid(doc)?;
                Some(TableOutline {
                    rows: grid.rows(),
                    cols: grid.cols(),
                    physical_cells: (0..grid.rows()).map(|r| t.physical_cell_count(doc, r)).collect(),
                    merged: grid.regions().filter(|c| c.is_merged()).collect(),
                })
            })
            .collect();

        Self {
            paragraph_count: body.len(),
            sections,
            tables,
        }
    }

    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        to_json(self, format)
    }

    /// Only the section list as JSON.
    pub fn sections_json(&self, format: JsonFormat) -> Result<String> {
        to_json(&self.sections, format)
    }

    /// Only the table list as JSON.
    pub fn tables_json(&self, format: JsonFormat) -> Result<String> {
        to_json(&self.tables, format)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    Ok(match format {
        JsonFormat::Compact => serde_json::to_string(value)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
    })
}
