//! Tables, cells and the merge engine.
//!
//! A table is a `w:tbl` element paired with a [`Grid`] owned by the
//! document. The grid is the logical view (which region every position
//! belongs to); the `w:tr`/`w:tc` elements are the physical view. Merges
//! are validated against the grid first and then applied to both.

pub mod grid;

pub use grid::{Grid, GridCell, MergeDirection, MergePlan, PhysicalCell, VMerge};

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::paragraph::Paragraph;
use super::schema::{
    GRID_COL, GRID_SPAN, P, P_PR, TBL, TBL_BORDERS_ORDER, TBL_CELL_MAR_ORDER, TBL_GRID, TBL_PR,
    TBL_PR_ORDER, TC, TC_PR, TC_PR_ORDER, TR, VAL, V_MERGE,
};
use crate::xml::{NodeId, PropertyStore, XmlTree};

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    None,
    #[default]
    Single,
    Thick,
    Double,
    Dotted,
    Dashed,
    DotDash,
    DotDotDash,
}

impl BorderStyle {
    /// Value of the `w:val` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::None => "none",
            BorderStyle::Single => "single",
            BorderStyle::Thick => "thick",
            BorderStyle::Double => "double",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Dashed => "dashed",
            BorderStyle::DotDash => "dotDash",
            BorderStyle::DotDotDash => "dotDotDash",
        }
    }
}

/// Edge of a table border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderEdge {
    Top,
    Bottom,
    Left,
    Right,
    InsideHorizontal,
    InsideVertical,
}

impl BorderEdge {
    fn element(&self) -> &'static str {
        match self {
            BorderEdge::Top => "w:top",
            BorderEdge::Bottom => "w:bottom",
            BorderEdge::Left => "w:start",
            BorderEdge::Right => "w:end",
            BorderEdge::InsideHorizontal => "w:insideH",
            BorderEdge::InsideVertical => "w:insideV",
        }
    }
}

/// Side of a cell margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    fn element(&self) -> &'static str {
        match self {
            Side::Top => "w:top",
            Side::Bottom => "w:bottom",
            Side::Left => "w:start",
            Side::Right => "w:end",
        }
    }
}

/// Horizontal placement of a table on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableAlignment {
    Left,
    Center,
    Right,
}

/// Vertical alignment of text in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellAlignment {
    Top,
    Center,
    Bottom,
}

/// Preferred table width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableWidth {
    Auto,
    /// Percentage of the text area
    Percent(f64),
    /// Absolute width in twips
    Twips(i32),
}

/// Handle to a `w:tbl` of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    node: Option<NodeId>,
}

impl Table {
    pub(crate) fn from_node(node: Option<NodeId>) -> Self {
        Self { node }
    }

    /// Populate an empty `w:tbl` with `rows`×`cols` unit cells.
    pub(crate) fn build(doc: &mut Document, tbl: NodeId, rows: usize, cols: usize) -> Self {
        let page = doc.options().page;
        let text_width = page.width - page.margin_left - page.margin_right;
        let col_width = if cols > 0 { text_width / cols as i32 } else { 0 };

        let tree = &mut doc.tree;
        tree.append_child(tbl, TBL_PR);
        if let Some(tbl_grid) = tree.append_child(tbl, TBL_GRID) {
            for _ in 0..cols {
                if let Some(col) = tree.append_child(tbl_grid, GRID_COL) {
                    tree.put_attr_i32(col, "w:w", col_width);
                }
            }
        }
        for _ in 0..rows {
            let Some(tr) = tree.append_child(tbl, TR) else {
                continue;
            };
            for _ in 0..cols {
                let Some(tc) = tree.append_child(tr, TC) else {
                    continue;
                };
                if let Some(tc_pr) = tree.append_child(tc, TC_PR) {
                    if let Some(tc_w) = tree.append_child(tc_pr, "w:tcW") {
                        tree.put_attr_i32(tc_w, "w:w", col_width);
                        tree.put_attr(tc_w, "w:type", "dxa");
                    }
                }
                // A cell needs at least one block-level element.
                if let Some(p) = tree.append_child(tc, P) {
                    tree.append_child(p, P_PR);
                }
            }
        }

        doc.grids.insert(tbl, Grid::new(rows, cols));
        log::debug!("created {}x{} table", rows, cols);
        Self::from_node(Some(tbl))
    }

    /// Rebuild the grid of a loaded table from its span markers.
    pub(crate) fn read_grid(tree: &XmlTree, tbl: NodeId) -> Grid {
        let rows: Vec<Vec<PhysicalCell>> = tree
            .children_named(tbl, TR)
            .map(|tr| {
                tree.children_named(tr, TC)
                    .map(|tc| read_physical_cell(tree, tc))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = rows
            .iter()
            .map(|r| r.iter().map(|c| c.grid_span.max(1)).sum())
            .collect();
        if widths.windows(2).any(|w| w[0] != w[1]) {
            log::warn!("table rows span different column counts: {:?}", widths);
        }
        Grid::from_physical(&rows)
    }

    /// The `w:tbl` element, if it is still part of the document.
    pub fn node(&self, doc: &Document) -> Option<NodeId> {
        self.node
            .filter(|&n| doc.tree.is(n, TBL) && doc.grids.contains_key(&n))
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        self.node(doc).is_some()
    }

    /// Logical grid of the table.
    pub fn grid<'a>(&self, doc: &'a Document) -> Option<&'a Grid> {
        self.node(doc).and_then(|n| doc.grids.get(&n))
    }

    pub fn row_count(&self, doc: &Document) -> usize {
        self.grid(doc).map_or(0, |g| g.rows())
    }

    pub fn col_count(&self, doc: &Document) -> usize {
        self.grid(doc).map_or(0, |g| g.cols())
    }

    /// Number of `w:tc` elements in `row`.
    pub fn physical_cell_count(&self, doc: &Document, row: usize) -> usize {
        self.row_node(doc, row)
            .map_or(0, |tr| doc.tree.children_named(tr, TC).count())
    }

    fn row_node(&self, doc: &Document, row: usize) -> Option<NodeId> {
        let tbl = self.node(doc)?;
        doc.tree.children_named(tbl, TR).nth(row)
    }

    /// Physical cell at `index` among the `w:tc` elements of `row`.
    fn physical_cell(&self, doc: &Document, row: usize, index: usize) -> Option<NodeId> {
        let tr = self.row_node(doc, row)?;
        doc.tree.children_named(tr, TC).nth(index)
    }

    /// Handle to the cell covering `(row, col)`.
    ///
    /// For a position inside a merged region the handle points at the
    /// region origin. Out-of-range positions give an invalid handle.
    pub fn cell(&self, doc: &Document, row: usize, col: usize) -> TableCell {
        let invalid = TableCell {
            table: *self,
            region: None,
            tc: None,
        };
        let Some(grid) = self.grid(doc) else {
            return invalid;
        };
        let Some(region) = grid.get(row, col).copied() else {
            return invalid;
        };
        let tc = grid
            .physical_index(region.origin_row, region.origin_col)
            .and_then(|index| self.physical_cell(doc, region.origin_row, index));
        match tc {
            Some(tc) => TableCell {
                table: *self,
                region: Some(region),
                tc: Some(tc),
            },
            None => invalid,
        }
    }

    /// Merge the regions of `a` and `b` into one.
    ///
    /// The regions must be edge-adjacent with equal extent along the shared
    /// edge. On success both handles point at the merged region and every
    /// other handle into either region goes stale. On failure nothing
    /// changes and `false` is returned.
    pub fn merge_cells(&self, doc: &mut Document, a: &mut TableCell, b: &mut TableCell) -> bool {
        let Some(tbl) = self.node(doc) else {
            return false;
        };
        if a.table != *self || b.table != *self || !a.is_valid(doc) || !b.is_valid(doc) {
            log::debug!("merge rejected: invalid, stale or foreign cell handle");
            return false;
        }
        let (Some(ra), Some(rb)) = (a.region, b.region) else {
            return false;
        };
        let Some(grid) = doc.grids.get(&tbl) else {
            return false;
        };
        let Some(plan) = grid.plan_merge(&ra, &rb) else {
            log::debug!(
                "merge rejected: regions at ({}, {}) and ({}, {}) are not mergeable",
                ra.origin_row,
                ra.origin_col,
                rb.origin_row,
                rb.origin_col
            );
            return false;
        };

        // Resolve every physical cell the merge touches before editing.
        let survivor = plan.survivor;
        let absorbed = plan.absorbed;
        let rows: Vec<usize> = match plan.direction {
            MergeDirection::Horizontal => survivor.rows().collect(),
            MergeDirection::Vertical => absorbed.rows().collect(),
        };
        let mut pairs = Vec::with_capacity(rows.len());
        for row in rows {
            let keep = match plan.direction {
                MergeDirection::Horizontal => grid
                    .physical_index(row, survivor.origin_col)
                    .and_then(|i| self.physical_cell(doc, row, i)),
                MergeDirection::Vertical => None,
            };
            let drop = grid
                .physical_index(row, absorbed.origin_col)
                .and_then(|i| self.physical_cell(doc, row, i));
            match (plan.direction, keep, drop) {
                (MergeDirection::Horizontal, Some(_), Some(_))
                | (MergeDirection::Vertical, None, Some(_)) => pairs.push((keep, drop)),
                _ => {
                    log::debug!("merge rejected: row {} lacks a physical cell", row);
                    return false;
                }
            }
        }
        let Some(top) = grid
            .physical_index(survivor.origin_row, survivor.origin_col)
            .and_then(|i| self.physical_cell(doc, survivor.origin_row, i))
        else {
            return false;
        };

        let (_, merged_cols) = plan.merged_spans();
        let tree = &mut doc.tree;
        match plan.direction {
            MergeDirection::Horizontal => {
                for (keep, drop) in pairs {
                    let (Some(keep), Some(drop)) = (keep, drop) else {
                        continue;
                    };
                    absorb_content(tree, drop, keep);
                    widen(tree, keep, drop);
                    set_grid_span(tree, keep, merged_cols);
                    tree.remove(drop);
                }
            }
            MergeDirection::Vertical => {
                for (_, drop) in pairs {
                    let Some(drop) = drop else {
                        continue;
                    };
                    absorb_content(tree, drop, top);
                    set_v_merge(tree, drop, None);
                }
                set_v_merge(tree, top, Some("restart"));
            }
        }

        let Some(grid) = doc.grids.get_mut(&tbl) else {
            return false;
        };
        let merged = grid.apply(&plan);
        log::debug!(
            "merged {:?}: origin ({}, {}) spans {}x{}",
            plan.direction,
            merged.origin_row,
            merged.origin_col,
            merged.row_span,
            merged.col_span
        );

        for handle in [a, b] {
            handle.region = Some(merged);
            handle.tc = Some(top);
        }
        true
    }

    fn properties(&self, doc: &mut Document) -> Option<NodeId> {
        let tbl = self.node(doc)?;
        doc.tree.child_or_insert_before(tbl, TBL_PR, TBL_GRID)
    }

    /// Set the preferred table width.
    pub fn set_width(&self, doc: &mut Document, width: TableWidth) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        let (w, unit) = match width {
            TableWidth::Auto => (0, "auto"),
            TableWidth::Percent(pct) => ((pct * 50.0).round() as i32, "pct"),
            TableWidth::Twips(twips) => (twips, "dxa"),
        };
        put_width(&mut doc.tree, pr, "w:tblW", TBL_PR_ORDER, w, unit);
    }

    pub fn set_width_auto(&self, doc: &mut Document) {
        self.set_width(doc, TableWidth::Auto);
    }

    /// Set the width as a percentage of the text area.
    pub fn set_width_percent(&self, doc: &mut Document, percent: f64) {
        self.set_width(doc, TableWidth::Percent(percent));
    }

    /// Preferred table width, `None` when unset.
    pub fn width(&self, doc: &Document) -> Option<TableWidth> {
        let tbl = self.node(doc)?;
        let tbl_w = doc.tree.child(doc.tree.child(tbl, TBL_PR)?, "w:tblW")?;
        let w = doc.tree.attr_i32(tbl_w, "w:w").unwrap_or(0);
        match doc.tree.attr(tbl_w, "w:type") {
            Some("pct") => Some(TableWidth::Percent(f64::from(w) / 50.0)),
            Some("dxa") => Some(TableWidth::Twips(w)),
            _ => Some(TableWidth::Auto),
        }
    }

    pub fn set_alignment(&self, doc: &mut Document, alignment: TableAlignment) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        let val = match alignment {
            TableAlignment::Left => "start",
            TableAlignment::Center => "center",
            TableAlignment::Right => "end",
        };
        if let Some(jc) = doc.tree.child_or_insert_ordered(pr, "w:jc", TBL_PR_ORDER) {
            doc.tree.put_attr(jc, VAL, val);
        }
    }

    /// Set one border edge. `width` is in points.
    pub fn set_border(
        &self,
        doc: &mut Document,
        edge: BorderEdge,
        style: BorderStyle,
        width: f64,
        color: &str,
    ) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        let tree = &mut doc.tree;
        let Some(borders) = tree.child_or_insert_ordered(pr, "w:tblBorders", TBL_PR_ORDER) else {
            return;
        };
        if let Some(border) = tree.child_or_insert_ordered(borders, edge.element(), TBL_BORDERS_ORDER) {
            put_border(tree, border, style, width, color);
        }
    }

    /// Set the top, bottom, left and right edges.
    pub fn set_outside_borders(&self, doc: &mut Document, style: BorderStyle, width: f64, color: &str) {
        for edge in [BorderEdge::Top, BorderEdge::Bottom, BorderEdge::Left, BorderEdge::Right] {
            self.set_border(doc, edge, style, width, color);
        }
    }

    /// Set the borders between rows and between columns.
    pub fn set_inside_borders(&self, doc: &mut Document, style: BorderStyle, width: f64, color: &str) {
        self.set_border(doc, BorderEdge::InsideHorizontal, style, width, color);
        self.set_border(doc, BorderEdge::InsideVertical, style, width, color);
    }

    pub fn set_all_borders(&self, doc: &mut Document, style: BorderStyle, width: f64, color: &str) {
        self.set_outside_borders(doc, style, width, color);
        self.set_inside_borders(doc, style, width, color);
    }

    /// Set the default margin of every cell on one side, in twips.
    pub fn set_cell_margin(&self, doc: &mut Document, side: Side, twips: i32) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        let tree = &mut doc.tree;
        if let Some(mar) = tree.child_or_insert_ordered(pr, "w:tblCellMar", TBL_PR_ORDER) {
            put_width(tree, mar, side.element(), TBL_CELL_MAR_ORDER, twips, "dxa");
        }
    }

    /// Set all four default cell margins, in twips.
    pub fn set_cell_margins(&self, doc: &mut Document, top: i32, bottom: i32, left: i32, right: i32) {
        self.set_cell_margin(doc, Side::Top, top);
        self.set_cell_margin(doc, Side::Bottom, bottom);
        self.set_cell_margin(doc, Side::Left, left);
        self.set_cell_margin(doc, Side::Right, right);
    }
}

/// Handle to one region of a table.
///
/// A handle goes stale when its region is merged through another handle;
/// stale handles are rejected by [`Table::merge_cells`] and read as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCell {
    table: Table,
    region: Option<GridCell>,
    tc: Option<NodeId>,
}

impl TableCell {
    /// The `w:tc` element, if the handle is neither stale nor out of range.
    pub fn node(&self, doc: &Document) -> Option<NodeId> {
        let region = self.region?;
        let tc = self.tc?;
        let grid = self.table.grid(doc)?;
        (grid.is_current(&region) && doc.tree.is(tc, TC)).then_some(tc)
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        self.node(doc).is_some()
    }

    /// Region descriptor, `None` for invalid or stale handles.
    pub fn region(&self, doc: &Document) -> Option<GridCell> {
        self.node(doc).and(self.region)
    }

    /// Row of the region origin.
    pub fn row(&self, doc: &Document) -> Option<usize> {
        self.region(doc).map(|r| r.origin_row)
    }

    /// Column of the region origin.
    pub fn col(&self, doc: &Document) -> Option<usize> {
        self.region(doc).map(|r| r.origin_col)
    }

    pub fn row_span(&self, doc: &Document) -> Option<usize> {
        self.region(doc).map(|r| r.row_span)
    }

    pub fn col_span(&self, doc: &Document) -> Option<usize> {
        self.region(doc).map(|r| r.col_span)
    }

    pub fn first_paragraph(&self, doc: &Document) -> Paragraph {
        Paragraph::from_node(self.node(doc).and_then(|tc| doc.tree.child(tc, P)))
    }

    pub fn paragraphs(&self, doc: &Document) -> Vec<Paragraph> {
        match self.node(doc) {
            Some(tc) => doc
                .tree
                .children_named(tc, P)
                .map(|p| Paragraph::from_node(Some(p)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Append an empty paragraph to the cell.
    pub fn append_paragraph(&self, doc: &mut Document) -> Paragraph {
        let p = self.node(doc).and_then(|tc| doc.tree.append_child(tc, P));
        if let Some(p) = p {
            doc.tree.append_child(p, P_PR);
        }
        Paragraph::from_node(p)
    }

    /// Text of the cell paragraphs, one line each.
    pub fn text(&self, doc: &Document) -> String {
        self.paragraphs(doc)
            .iter()
            .map(|p| p.text(doc))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn properties(&self, doc: &mut Document) -> Option<NodeId> {
        let tc = self.node(doc)?;
        doc.tree.child_or_insert_before(tc, TC_PR, P)
    }

    /// Set the preferred cell width in twips.
    pub fn set_width(&self, doc: &mut Document, twips: i32) {
        if let Some(pr) = self.properties(doc) {
            put_width(&mut doc.tree, pr, "w:tcW", TC_PR_ORDER, twips, "dxa");
        }
    }

    pub fn set_vertical_alignment(&self, doc: &mut Document, alignment: CellAlignment) {
        let Some(pr) = self.properties(doc) else {
            return;
        };
        let val = match alignment {
            CellAlignment::Top => "top",
            CellAlignment::Center => "center",
            CellAlignment::Bottom => "bottom",
        };
        if let Some(v_align) = doc.tree.child_or_insert_ordered(pr, "w:vAlign", TC_PR_ORDER) {
            doc.tree.put_attr(v_align, VAL, val);
        }
    }
}

fn read_physical_cell(tree: &XmlTree, tc: NodeId) -> PhysicalCell {
    let pr = tree.child(tc, TC_PR);
    let grid_span = pr
        .and_then(|pr| tree.child(pr, GRID_SPAN))
        .and_then(|span| tree.attr_i32(span, VAL))
        .map_or(1, |v| v.max(1) as usize);
    let v_merge = match pr.and_then(|pr| tree.child(pr, V_MERGE)) {
        None => VMerge::None,
        Some(vm) if tree.attr(vm, VAL) == Some("restart") => VMerge::Restart,
        Some(_) => VMerge::Continue,
    };
    PhysicalCell { grid_span, v_merge }
}

fn put_width(tree: &mut XmlTree, parent: NodeId, name: &str, order: &[&str], w: i32, unit: &str) {
    if let Some(el) = tree.child_or_insert_ordered(parent, name, order) {
        tree.put_attr_i32(el, "w:w", w);
        tree.put_attr(el, "w:type", unit);
    }
}

fn put_border(tree: &mut XmlTree, border: NodeId, style: BorderStyle, width: f64, color: &str) {
    tree.put_attr(border, VAL, style.as_str());
    tree.put_attr_i32(border, "w:sz", (width * 8.0).round() as i32);
    tree.put_attr(border, "w:color", color);
}

fn cell_properties(tree: &mut XmlTree, tc: NodeId) -> Option<NodeId> {
    tree.child_or_insert_before(tc, TC_PR, P)
}

fn set_grid_span(tree: &mut XmlTree, tc: NodeId, span: usize) {
    let Some(pr) = cell_properties(tree, tc) else {
        return;
    };
    if span <= 1 {
        if let Some(el) = tree.child(pr, GRID_SPAN) {
            tree.remove(el);
        }
    } else if let Some(el) = tree.child_or_insert_ordered(pr, GRID_SPAN, TC_PR_ORDER) {
        tree.put_attr_i32(el, VAL, span as i32);
    }
}

/// Recreate the `w:vMerge` marker of `tc` from scratch.
fn set_v_merge(tree: &mut XmlTree, tc: NodeId, val: Option<&str>) {
    let Some(pr) = cell_properties(tree, tc) else {
        return;
    };
    if let Some(old) = tree.child(pr, V_MERGE) {
        tree.remove(old);
    }
    if let Some(el) = tree.child_or_insert_ordered(pr, V_MERGE, TC_PR_ORDER) {
        if let Some(val) = val {
            tree.put_attr(el, VAL, val);
        }
    }
}

/// Add the absorbed cell's width to the survivor when both are in twips.
fn widen(tree: &mut XmlTree, keep: NodeId, drop: NodeId) {
    let width = |tree: &XmlTree, tc: NodeId| {
        let tc_w = tree.child(tree.child(tc, TC_PR)?, "w:tcW")?;
        (tree.attr(tc_w, "w:type") == Some("dxa"))
            .then(|| tree.attr_i32(tc_w, "w:w"))
            .flatten()
    };
    if let (Some(a), Some(b)) = (width(tree, keep), width(tree, drop)) {
        if let Some(pr) = cell_properties(tree, keep) {
            put_width(tree, pr, "w:tcW", TC_PR_ORDER, a + b, "dxa");
        }
    }
}

/// Move the non-empty blocks of `from` to the end of `into`.
///
/// `from` keeps at least one empty paragraph.
fn absorb_content(tree: &mut XmlTree, from: NodeId, into: NodeId) {
    let blocks: Vec<NodeId> = tree
        .children(from)
        .iter()
        .copied()
        .filter(|&c| {
            tree.is(c, TBL)
                || (tree.is(c, P) && tree.children(c).iter().any(|&k| !tree.is(k, P_PR)))
        })
        .collect();
    for block in blocks {
        if tree.append_copy(into, block).is_some() {
            tree.remove(block);
        }
    }
    if tree.child(from, P).is_none() && tree.child(from, TBL).is_none() {
        if let Some(p) = tree.append_child(from, P) {
            tree.append_child(p, P_PR);
        }
    }
}
