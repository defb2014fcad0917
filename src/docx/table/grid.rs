//! Logical cell grid of a table.
//!
//! Every grid position stores the descriptor of the rectangular region it
//! belongs to. All positions of a region carry identical descriptors, so any
//! position answers "where does my region start and how far does it reach".
//! Each region also carries a version that changes whenever the region is
//! merged, which lets cell handles detect that they went stale.

use serde::{Deserialize, Serialize};

/// Region descriptor stored at every position the region covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub origin_row: usize,
    pub origin_col: usize,
    pub row_span: usize,
    pub col_span: usize,
    /// Changes every time the region is rewritten by a merge
    #[serde(skip)]
    pub version: u32,
}

impl GridCell {
    /// Check if the region covers more than one position.
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }

    /// Rows covered by the region.
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.origin_row..self.origin_row + self.row_span
    }

    /// Columns covered by the region.
    pub fn cols(&self) -> std::ops::Range<usize> {
        self.origin_col..self.origin_col + self.col_span
    }

    /// Check if the region covers `(row, col)`.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows().contains(&row) && self.cols().contains(&col)
    }
}

/// Direction of an accepted merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDirection {
    /// Regions side by side in the same rows
    Horizontal,
    /// Regions stacked in the same columns
    Vertical,
}

/// A validated merge of two regions, computed before anything is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePlan {
    pub direction: MergeDirection,
    /// Left or top region; its origin becomes the merged origin
    pub survivor: GridCell,
    /// Right or bottom region
    pub absorbed: GridCell,
}

impl MergePlan {
    /// Spans of the merged region as (row_span, col_span).
    pub fn merged_spans(&self) -> (usize, usize) {
        match self.direction {
            MergeDirection::Horizontal => (
                self.survivor.row_span,
                self.survivor.col_span + self.absorbed.col_span,
            ),
            MergeDirection::Vertical => (
                self.survivor.row_span + self.absorbed.row_span,
                self.survivor.col_span,
            ),
        }
    }
}

/// Physical span markers of one `w:tc`, as read from a loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicalCell {
    /// `w:gridSpan` value, 1 when absent
    pub grid_span: usize,
    pub v_merge: VMerge,
}

/// `w:vMerge` state of a physical cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VMerge {
    #[default]
    None,
    Restart,
    Continue,
}

/// rows×cols matrix of region descriptors.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<GridCell>,
    next_version: u32,
}

impl Grid {
    /// Create a grid of unit regions.
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        let mut version = 0;
        for row in 0..rows {
            for col in 0..cols {
                version += 1;
                cells.push(GridCell {
                    origin_row: row,
                    origin_col: col,
                    row_span: 1,
                    col_span: 1,
                    version,
                });
            }
        }
        Self {
            rows,
            cols,
            cells,
            next_version: version + 1,
        }
    }

    /// Rebuild a grid from the physical cells of each row.
    ///
    /// A `Continue` cell joins the region above it when that region starts in
    /// the same column with the same width; otherwise it opens a region of
    /// its own. Rows narrower than the widest row leave their trailing
    /// positions as unit regions without a physical cell.
    pub fn from_physical(rows: &[Vec<PhysicalCell>]) -> Self {
        let cols = rows
            .iter()
            .map(|r| r.iter().map(|c| c.grid_span.max(1)).sum::<usize>())
            .max()
            .unwrap_or(0);
        let mut grid = Self::new(rows.len(), cols);

        for (r, row) in rows.iter().enumerate() {
            let mut col = 0;
            for cell in row {
                let span = cell.grid_span.max(1);
                let above = r
                    .checked_sub(1)
                    .and_then(|up| grid.get(up, col).copied())
                    .filter(|a| a.origin_col == col && a.col_span == span);

                let region = match (cell.v_merge, above) {
                    (VMerge::Continue, Some(above)) => GridCell {
                        row_span: above.row_span + 1,
                        ..above
                    },
                    _ => GridCell {
                        origin_row: r,
                        origin_col: col,
                        row_span: 1,
                        col_span: span,
                        version: 0,
                    },
                };
                grid.fill(region);
                col += span;
            }
        }

        let origins: Vec<GridCell> = grid.regions().collect();
        for region in origins {
            let version = grid.bump_version();
            grid.fill(GridCell { version, ..region });
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Descriptor at `(row, col)`, `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<&GridCell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    /// Check if `cell` is still the current descriptor of its region.
    pub fn is_current(&self, cell: &GridCell) -> bool {
        self.get(cell.origin_row, cell.origin_col) == Some(cell)
    }

    /// Distinct regions in row-major order of their origins.
    pub fn regions(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(i, c)| c.origin_row == i / self.cols && c.origin_col == i % self.cols)
            .map(|(_, c)| *c)
    }

    /// Number of physical cells in `row`: one per region column-start.
    pub fn physical_cells_in_row(&self, row: usize) -> usize {
        (0..self.cols)
            .filter(|&col| self.get(row, col).is_some_and(|c| c.origin_col == col))
            .count()
    }

    /// Index among the physical cells of `row` of the cell covering `col`.
    ///
    /// Every region has one physical cell in each row it spans, so the index
    /// is the number of region column-starts left of the region's origin.
    pub fn physical_index(&self, row: usize, col: usize) -> Option<usize> {
        let cell = self.get(row, col)?;
        Some(
            (0..cell.origin_col)
                .filter(|&c| self.get(row, c).is_some_and(|g| g.origin_col == c))
                .count(),
        )
    }

    /// Validate a merge of regions `a` and `b` without mutating anything.
    ///
    /// Both descriptors must be current. Returns `None` for a self-merge,
    /// stale descriptors, or any placement other than edge-adjacent regions
    /// with equal perpendicular extent.
    pub fn plan_merge(&self, a: &GridCell, b: &GridCell) -> Option<MergePlan> {
        if !self.is_current(a) || !self.is_current(b) || a == b {
            return None;
        }

        if a.origin_row == b.origin_row && a.row_span == b.row_span {
            let (left, right) = if a.origin_col < b.origin_col { (a, b) } else { (b, a) };
            if right.origin_col == left.origin_col + left.col_span {
                return Some(MergePlan {
                    direction: MergeDirection::Horizontal,
                    survivor: *left,
                    absorbed: *right,
                });
            }
        }

        if a.origin_col == b.origin_col && a.col_span == b.col_span {
            let (top, bottom) = if a.origin_row < b.origin_row { (a, b) } else { (b, a) };
            if bottom.origin_row == top.origin_row + top.row_span {
                return Some(MergePlan {
                    direction: MergeDirection::Vertical,
                    survivor: *top,
                    absorbed: *bottom,
                });
            }
        }

        None
    }

    /// Rewrite every position of the merged region; returns its descriptor.
    pub fn apply(&mut self, plan: &MergePlan) -> GridCell {
        let (row_span, col_span) = plan.merged_spans();
        let merged = GridCell {
            origin_row: plan.survivor.origin_row,
            origin_col: plan.survivor.origin_col,
            row_span,
            col_span,
            version: self.bump_version(),
        };
        self.fill(merged);
        merged
    }

    fn bump_version(&mut self) -> u32 {
        let version = self.next_version;
        self.next_version = self.next_version.wrapping_add(1);
        version
    }

    fn fill(&mut self, region: GridCell) {
        for row in region.rows() {
            for col in region.cols() {
                if row < self.rows && col < self.cols {
                    self.cells[row * self.cols + col] = region;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_uniform(grid: &Grid) {
        for region in grid.regions() {
            for row in region.rows() {
                for col in region.cols() {
                    assert_eq!(grid.get(row, col), Some(&region), "at ({}, {})", row, col);
                }
            }
        }
    }

    #[test]
    fn test_new_grid_is_unit() {
        let grid = Grid::new(3, 4);
        for row in 0..3 {
            for col in 0..4 {
                let cell = grid.get(row, col).unwrap();
                assert_eq!((cell.origin_row, cell.origin_col), (row, col));
                assert_eq!((cell.row_span, cell.col_span), (1, 1));
            }
            assert_eq!(grid.physical_cells_in_row(row), 4);
        }
        assert!(grid.get(3, 0).is_none());
        assert!(grid.get(0, 4).is_none());
        assert_eq!(grid.regions().count(), 12);
    }

    #[test]
    fn test_horizontal_merge() {
        let mut grid = Grid::new(3, 4);
        let a = *grid.get(1, 2).unwrap();
        let b = *grid.get(1, 1).unwrap();
        let plan = grid.plan_merge(&a, &b).unwrap();
        assert_eq!(plan.direction, MergeDirection::Horizontal);
        assert_eq!(plan.survivor.origin_col, 1);

        let merged = grid.apply(&plan);
        assert_eq!((merged.origin_row, merged.origin_col), (1, 1));
        assert_eq!(merged.col_span, 2);
        assert_eq!(grid.get(1, 2), Some(&merged));
        assert_eq!(grid.physical_cells_in_row(1), 3);
        assert_eq!(grid.physical_index(1, 3), Some(2));
        assert_eq!(grid.physical_index(1, 2), Some(1));
        assert_uniform(&grid);
    }

    #[test]
    fn test_vertical_merge_keeps_physical_cells() {
        let mut grid = Grid::new(4, 2);
        let top = *grid.get(0, 1).unwrap();
        let bottom = *grid.get(1, 1).unwrap();
        let merged = grid.apply(&grid.plan_merge(&top, &bottom).unwrap());
        assert_eq!(merged.row_span, 2);
        assert_eq!(grid.get(1, 1), Some(&merged));
        assert_eq!(grid.physical_cells_in_row(1), 2);

        let next = *grid.get(2, 1).unwrap();
        let merged = grid.apply(&grid.plan_merge(&next, &merged).unwrap());
        assert_eq!((merged.origin_row, merged.row_span), (0, 3));
        assert_uniform(&grid);
    }

    #[test]
    fn test_rejections() {
        let mut grid = Grid::new(3, 3);
        let c00 = *grid.get(0, 0).unwrap();
        let c11 = *grid.get(1, 1).unwrap();
        let c02 = *grid.get(0, 2).unwrap();
        assert!(grid.plan_merge(&c00, &c00).is_none(), "self");
        assert!(grid.plan_merge(&c00, &c11).is_none(), "diagonal");
        assert!(grid.plan_merge(&c00, &c02).is_none(), "gap");

        // (0,0)-(0,1) wide region vs single (1,0): mismatched width.
        let c01 = *grid.get(0, 1).unwrap();
        let wide = grid.apply(&grid.plan_merge(&c00, &c01).unwrap());
        let c10 = *grid.get(1, 0).unwrap();
        assert!(grid.plan_merge(&wide, &c10).is_none(), "mismatched extent");

        // Descriptors taken before the merge are stale.
        assert!(grid.plan_merge(&c01, &c02).is_none(), "stale");
        assert!(grid.plan_merge(&wide, &c02).is_some());
    }

    #[test]
    fn test_block_merge() {
        let mut grid = Grid::new(3, 3);
        let c00 = *grid.get(0, 0).unwrap();
        let c01 = *grid.get(0, 1).unwrap();
        let c10 = *grid.get(1, 0).unwrap();
        let c11 = *grid.get(1, 1).unwrap();
        let top = grid.apply(&grid.plan_merge(&c00, &c01).unwrap());
        let bottom = grid.apply(&grid.plan_merge(&c10, &c11).unwrap());
        let block = grid.apply(&grid.plan_merge(&bottom, &top).unwrap());
        assert_eq!((block.row_span, block.col_span), (2, 2));
        assert_eq!(grid.physical_cells_in_row(0), 2);
        assert_eq!(grid.physical_cells_in_row(1), 2);
        assert_eq!(grid.physical_index(1, 2), Some(1));
        assert_uniform(&grid);
    }

    #[test]
    fn test_from_physical() {
        let unit = PhysicalCell { grid_span: 1, v_merge: VMerge::None };
        let rows = vec![
            vec![
                PhysicalCell { grid_span: 2, v_merge: VMerge::Restart },
                unit,
            ],
            vec![
                PhysicalCell { grid_span: 2, v_merge: VMerge::Continue },
                unit,
            ],
            vec![unit, unit, unit],
        ];
        let grid = Grid::from_physical(&rows);
        assert_eq!((grid.rows(), grid.cols()), (3, 3));

        let block = *grid.get(1, 1).unwrap();
        assert_eq!((block.origin_row, block.origin_col), (0, 0));
        assert_eq!((block.row_span, block.col_span), (2, 2));
        assert_eq!(grid.physical_cells_in_row(1), 2);
        assert_eq!(grid.get(2, 1).unwrap().row_span, 1);
        assert_uniform(&grid);

        let versions: std::collections::HashSet<u32> = grid.regions().map(|r| r.version).collect();
        assert_eq!(versions.len(), grid.regions().count());
    }

    #[test]
    fn test_from_physical_orphan_continue() {
        let rows = vec![vec![PhysicalCell { grid_span: 1, v_merge: VMerge::Continue }]];
        let grid = Grid::from_physical(&rows);
        let cell = grid.get(0, 0).unwrap();
        assert_eq!((cell.row_span, cell.col_span), (1, 1));
    }
}
