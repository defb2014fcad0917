//! The document: element tree, body, and per-table grids.

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use super::frame::TextFrame;
use super::paragraph::Paragraph;
use super::schema::{self, BODY, P, P_PR, SECT_PR, TBL};
use super::section::Section;
use super::table::{Grid, Table};
use crate::container::{self, DocxPackage};
use crate::error::{Error, Result};
use crate::options::{DocumentOptions, PageSetup};
use crate::xml::{reader, writer, NodeId, PropertyStore, XmlTree};

const NAMESPACES: &[(&str, &str)] = &[
    (
        "xmlns:w",
        "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    ),
    (
        "xmlns:r",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    ),
    (
        "xmlns:m",
        "http://schemas.openxmlformats.org/officeDocument/2006/math",
    ),
    ("xmlns:v", "urn:schemas-microsoft-com:vml"),
    (
        "xmlns:wp",
        "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing",
    ),
    ("xmlns:w10", "urn:schemas-microsoft-com:office:word"),
    (
        "xmlns:w14",
        "http://schemas.microsoft.com/office/word/2010/wordml",
    ),
    (
        "xmlns:mc",
        "http://schemas.openxmlformats.org/markup-compatibility/2006",
    ),
    ("mc:Ignorable", "w14"),
];

/// An in-memory WordprocessingML document.
///
/// The document owns the element tree. [`Paragraph`], [`Section`],
/// [`Table`] and cell handles are `Copy` views into it; pass the document
/// back to them to read or edit.
pub struct Document {
    pub(crate) tree: XmlTree,
    pub(crate) body: NodeId,
    pub(crate) grids: HashMap<NodeId, Grid>,
    options: DocumentOptions,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with default options.
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    /// Create an empty document whose body section follows `options.page`.
    pub fn with_options(options: DocumentOptions) -> Self {
        let mut tree = XmlTree::new("w:document");
        let root = tree.root();
        for (key, value) in NAMESPACES {
            tree.set_attr(root, key, value);
        }
        let body = tree.child_or_append(root, BODY).unwrap_or(root);
        let mut doc = Self {
            tree,
            body,
            grids: HashMap::new(),
            options,
        };
        doc.ensure_body_section();
        doc
    }

    /// Open a `.docx` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let package = DocxPackage::open(path)?;
        Self::from_package(&package)
    }

    /// Load a document from `.docx` bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let package = DocxPackage::from_bytes(data)?;
        Self::from_package(&package)
    }

    /// Load a document from a reader over `.docx` bytes.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let package = DocxPackage::from_reader(reader)?;
        Self::from_package(&package)
    }

    fn from_package(package: &DocxPackage) -> Result<Self> {
        let xml = package.read_main_document()?;
        Self::from_xml(&xml)
    }

    /// Load a document from the XML text of its main part.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let tree = reader::parse_document(xml)?;
        let root = tree.root();
        if !tree.is(root, "w:document") {
            return Err(Error::InvalidData(format!(
                "root element is <{}>, expected <w:document>",
                tree.name(root).unwrap_or_default()
            )));
        }
        let body = tree
            .child(root, BODY)
            .ok_or_else(|| Error::MissingComponent("w:body".to_string()))?;

        let mut doc = Self {
            tree,
            body,
            grids: HashMap::new(),
            options: DocumentOptions::default(),
        };
        doc.ensure_body_section();

        let tables: Vec<NodeId> = doc.tree.children_named(body, TBL).collect();
        for tbl in tables {
            let grid = Table::read_grid(&doc.tree, tbl);
            doc.grids.insert(tbl, grid);
        }
        log::debug!(
            "loaded document: {} paragraphs, {} tables",
            doc.paragraph_count(),
            doc.grids.len()
        );
        Ok(doc)
    }

    /// Options the document was created with.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Make sure the body ends with a `w:sectPr`, creating the default one.
    fn ensure_body_section(&mut self) {
        if let Some(sect) = self.tree.last_child(self.body, SECT_PR) {
            if self.tree.children(self.body).last() == Some(&sect) {
                return;
            }
            // Body-level section properties must be the last body child.
            let copy = self.tree.append_copy(self.body, sect);
            if copy.is_some() {
                self.tree.remove(sect);
            }
            return;
        }

        if self.tree.child(self.body, P).is_some() {
            log::warn!("document body has no section properties, using defaults");
        }
        let page = self.options.page;
        if let Some(sect) = self.tree.append_child(self.body, SECT_PR) {
            write_page_setup(&mut self.tree, sect, &page);
        }
    }

    /// Body-level `w:sectPr` that applies to the final section.
    pub(crate) fn body_section_properties(&self) -> Option<NodeId> {
        self.tree.last_child(self.body, SECT_PR)
    }

    // ---- paragraphs -------------------------------------------------------

    /// First body paragraph, or an invalid paragraph when the body has none.
    pub fn first_paragraph(&self) -> Paragraph {
        Paragraph::from_node(self.tree.child(self.body, P))
    }

    /// Last body paragraph, or an invalid paragraph when the body has none.
    pub fn last_paragraph(&self) -> Paragraph {
        Paragraph::from_node(self.tree.last_child(self.body, P))
    }

    /// Body paragraphs in document order.
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        self.tree
            .children_named(self.body, P)
            .map(|p| Paragraph::from_node(Some(p)))
            .collect()
    }

    pub fn paragraph_count(&self) -> usize {
        self.tree.children_named(self.body, P).count()
    }

    /// Append an empty paragraph at the end of the body.
    pub fn append_paragraph(&mut self) -> Paragraph {
        let p = match self.body_section_properties() {
            Some(sect) => self.tree.insert_before(sect, P),
            None => self.tree.append_child(self.body, P),
        };
        self.with_properties(p)
    }

    /// Append a paragraph holding one run of `text`.
    pub fn append_paragraph_with_text(&mut self, text: &str) -> Paragraph {
        let p = self.append_paragraph();
        p.append_run_with_text(self, text);
        p
    }

    /// Insert an empty paragraph at the start of the body.
    pub fn prepend_paragraph(&mut self) -> Paragraph {
        let p = self.tree.prepend_child(self.body, P);
        self.with_properties(p)
    }

    /// Insert a paragraph holding `text` at the start of the body.
    pub fn prepend_paragraph_with_text(&mut self, text: &str) -> Paragraph {
        let p = self.prepend_paragraph();
        p.append_run_with_text(self, text);
        p
    }

    /// Insert an empty paragraph right before `p`.
    pub fn insert_paragraph_before(&mut self, p: Paragraph) -> Paragraph {
        let node = p.node(self).and_then(|n| self.tree.insert_before(n, P));
        self.with_properties(node)
    }

    /// Insert an empty paragraph right after `p`.
    pub fn insert_paragraph_after(&mut self, p: Paragraph) -> Paragraph {
        let node = p.node(self).and_then(|n| self.tree.insert_after(n, P));
        self.with_properties(node)
    }

    /// Remove `p` and its content.
    ///
    /// A section break carried by `p` goes with it, fusing its section into
    /// the following one. The only block of a table cell cannot be removed.
    pub fn remove_paragraph(&mut self, p: Paragraph) -> bool {
        let Some(node) = p.node(self) else {
            return false;
        };
        if let Some(parent) = self.tree.parent(node) {
            if self.tree.is(parent, schema::TC) {
                let blocks = self
                    .tree
                    .children(parent)
                    .iter()
                    .filter(|&&c| self.tree.is(c, P) || self.tree.is(c, TBL))
                    .count();
                if blocks <= 1 {
                    log::debug!("refusing to remove the only block of a table cell");
                    return false;
                }
            }
        }
        self.tree.remove(node)
    }

    /// Append a paragraph containing only a page break.
    pub fn append_page_break(&mut self) -> Paragraph {
        let p = self.append_paragraph();
        p.append_page_break(self);
        p
    }

    /// Append a paragraph that ends a section.
    pub fn append_section_break(&mut self) -> Paragraph {
        let p = self.append_paragraph();
        p.insert_section_break(self);
        p
    }

    fn with_properties(&mut self, p: Option<NodeId>) -> Paragraph {
        if let Some(p) = p {
            self.tree.append_child(p, P_PR);
        }
        Paragraph::from_node(p)
    }

    // ---- sections ---------------------------------------------------------

    /// Section containing the first body paragraph.
    pub fn first_section(&self) -> Section {
        Section::locate(self, self.first_paragraph())
    }

    /// Section containing the last body paragraph.
    pub fn last_section(&self) -> Section {
        Section::locate(self, self.last_paragraph())
    }

    /// Section containing `p`.
    pub fn section_of(&self, p: Paragraph) -> Section {
        Section::locate(self, p)
    }

    /// All sections in document order.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut s = self.first_section();
        while s.is_valid(self) {
            sections.push(s);
            s = s.next(self);
        }
        sections
    }

    // ---- tables and frames ------------------------------------------------

    /// Append a `rows`×`cols` table at the end of the body.
    pub fn append_table(&mut self, rows: usize, cols: usize) -> Table {
        let tbl = match self.body_section_properties() {
            Some(sect) => self.tree.insert_before(sect, TBL),
            None => self.tree.append_child(self.body, TBL),
        };
        let Some(tbl) = tbl else {
            return Table::from_node(None);
        };
        let table = Table::build(self, tbl, rows, cols);

        let percent = self.options.table_width_percent;
        table.set_width_percent(self, percent);
        if let Some((style, width, color)) = self.options.table_border.clone() {
            table.set_all_borders(self, style, width, &color);
        }
        table
    }

    /// Body tables in document order.
    pub fn tables(&self) -> Vec<Table> {
        self.tree
            .children_named(self.body, TBL)
            .map(|t| Table::from_node(Some(t)))
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.grids.len()
    }

    /// Append a text frame of `width`×`height` twips.
    pub fn append_text_frame(&mut self, width: i32, height: i32) -> TextFrame {
        let p = self.append_paragraph();
        let frame = TextFrame::from_paragraph(p);
        frame.set_size(self, width, height);
        frame
    }

    // ---- serialization ----------------------------------------------------

    /// XML text of the main document part.
    pub fn to_xml(&self, pretty: bool) -> Result<String> {
        let indent = pretty.then_some(self.options.indent);
        let bytes = writer::write_document(&self.tree, Vec::new(), indent)?;
        String::from_utf8(bytes).map_err(|e| Error::InvalidData(e.to_string()))
    }

    /// Pretty-printed XML of the body element.
    pub fn body_xml(&self) -> Result<String> {
        writer::subtree_to_string(&self.tree, self.body, Some(self.options.indent))
    }

    /// Write the `.docx` package into `out`.
    pub fn write_to<W: Write + Seek>(&self, out: W) -> Result<W> {
        let xml = writer::write_document(&self.tree, Vec::new(), None)?;
        container::write_package(out, &xml, self.options.compression)
    }

    /// Serialize the `.docx` package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Save the `.docx` package to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))?
            .flush()?;
        log::debug!("saved {}", path.display());
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.body_xml().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("paragraphs", &self.paragraph_count())
            .field("tables", &self.grids.len())
            .field("nodes", &self.tree.len())
            .finish()
    }
}

fn write_page_setup(tree: &mut XmlTree, sect: NodeId, page: &PageSetup) {
    if let Some(sz) = tree.child_or_insert_ordered(sect, "w:pgSz", schema::SECT_PR_ORDER) {
        tree.put_attr_i32(sz, "w:w", page.width);
        tree.put_attr_i32(sz, "w:h", page.height);
        if page.width > page.height {
            tree.put_attr(sz, "w:orient", "landscape");
        }
    }
    if let Some(mar) = tree.child_or_insert_ordered(sect, "w:pgMar", schema::SECT_PR_ORDER) {
        tree.put_attr_i32(mar, "w:top", page.margin_top);
        tree.put_attr_i32(mar, "w:right", page.margin_right);
        tree.put_attr_i32(mar, "w:bottom", page.margin_bottom);
        tree.put_attr_i32(mar, "w:left", page.margin_left);
        tree.put_attr_i32(mar, "w:header", page.header);
        tree.put_attr_i32(mar, "w:footer", page.footer);
        tree.put_attr_i32(mar, "w:gutter", 0);
    }
    if let Some(cols) = tree.child_or_insert_ordered(sect, "w:cols", schema::SECT_PR_ORDER) {
        tree.put_attr_i32(cols, "w:space", page.column_space);
    }
    if let Some(grid) = tree.child_or_insert_ordered(sect, "w:docGrid", schema::SECT_PR_ORDER) {
        tree.put_attr(grid, "w:type", "lines");
        tree.put_attr_i32(grid, "w:linePitch", page.line_pitch);
    }
}
