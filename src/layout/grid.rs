//! Pre-computed layout data for a sheet.
//!
//! Positions are computed once per sheet, enabling O(log n) hit testing by
//! binary search over the row and column prefix sums.

use serde::Serialize;

use super::merges::MergeIndex;
use crate::types::{CellAddr, MergeRegion, Sheet};

/// Smallest height a visible row is laid out with.
pub const MIN_ROW_HEIGHT: f32 = 4.0;
/// Smallest width a visible column is laid out with.
pub const MIN_COL_WIDTH: f32 = 4.0;

/// Axis-aligned rectangle, in layout units or screen pixels depending on use.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring rectangle.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlapping area, or `None` when the rectangles only touch or are apart.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// True when `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// The merged region covering one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeInfo {
    /// True if this cell is the top-left origin of the merge
    pub is_origin: bool,
    pub origin_row: u32,
    pub origin_col: u32,
    pub row_span: u32,
    pub col_span: u32,
}

impl MergeInfo {
    pub fn origin(&self) -> CellAddr {
        CellAddr::new(self.origin_row, self.origin_col)
    }
}

/// Cumulative row/column offsets and merge lookup for one sheet.
#[derive(Debug, Clone)]
pub struct LayoutGrid {
    /// `col_positions[i]` = x of column i's left edge; one extra final edge.
    col_positions: Vec<f32>,
    /// `row_positions[i]` = y of row i's top edge; one extra final edge.
    row_positions: Vec<f32>,
    /// Merges clamped to the grid extent
    merges: MergeIndex,
}

fn prefix_sums(count: u32, size: impl Fn(u32) -> f32) -> Vec<f32> {
    let mut positions = Vec::with_capacity(count as usize + 1);
    let mut edge = 0.0_f32;
    for i in 0..count {
        positions.push(edge);
        edge += size(i);
    }
    positions.push(edge); // Final edge
    positions
}

impl LayoutGrid {
    /// Lay out a sheet. Hidden rows and columns collapse to zero size; every
    /// other row and column is at least `MIN_ROW_HEIGHT`/`MIN_COL_WIDTH`.
    pub fn compute(sheet: &Sheet) -> Self {
        let row_positions = prefix_sums(sheet.row_count, |row| {
            if sheet.is_row_hidden(row) {
                0.0
            } else {
                sanitize(sheet.row_height(row)).max(MIN_ROW_HEIGHT)
            }
        });
        let col_positions = prefix_sums(sheet.col_count, |col| {
            if sheet.is_col_hidden(col) {
                0.0
            } else {
                sanitize(sheet.col_width(col)).max(MIN_COL_WIDTH)
            }
        });

        let merges = sheet
            .merges
            .iter()
            .filter_map(|m| {
                let end_row = m.end_row.min(sheet.row_count.checked_sub(1)?);
                let end_col = m.end_col.min(sheet.col_count.checked_sub(1)?);
                (m.start_row <= end_row && m.start_col <= end_col).then_some(MergeRegion {
                    end_row,
                    end_col,
                    ..*m
                })
            })
            .collect();

        Self {
            col_positions,
            row_positions,
            merges: MergeIndex::new(merges),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn row_count(&self) -> u32 {
        self.row_positions.len().saturating_sub(1) as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn col_count(&self) -> u32 {
        self.col_positions.len().saturating_sub(1) as u32
    }

    pub fn total_width(&self) -> f32 {
        self.col_positions.last().copied().unwrap_or(0.0)
    }

    pub fn total_height(&self) -> f32 {
        self.row_positions.last().copied().unwrap_or(0.0)
    }

    /// Top edge of a row; `row == row_count()` gives the bottom edge of the grid.
    pub fn row_offset(&self, row: u32) -> f32 {
        self.row_positions
            .get(row as usize)
            .copied()
            .unwrap_or_else(|| self.total_height())
    }

    /// Left edge of a column; `col == col_count()` gives the right edge of the grid.
    pub fn col_offset(&self, col: u32) -> f32 {
        self.col_positions
            .get(col as usize)
            .copied()
            .unwrap_or_else(|| self.total_width())
    }

    pub fn row_height(&self, row: u32) -> f32 {
        self.row_offset(row.saturating_add(1)) - self.row_offset(row)
    }

    pub fn col_width(&self, col: u32) -> f32 {
        self.col_offset(col.saturating_add(1)) - self.col_offset(col)
    }

    /// Row whose band contains `y`. Zero-height rows are never returned.
    pub fn row_at(&self, y: f32) -> Option<u32> {
        index_at(&self.row_positions, y)
    }

    /// Column whose band contains `x`. Zero-width columns are never returned.
    pub fn col_at(&self, x: f32) -> Option<u32> {
        index_at(&self.col_positions, x)
    }

    /// Nearest row above `row` with a non-zero height.
    pub fn prev_visible_row(&self, row: u32) -> Option<u32> {
        prev_band(&self.row_positions, self.row_offset(row))
    }

    /// Nearest row below `row` with a non-zero height.
    pub fn next_visible_row(&self, row: u32) -> Option<u32> {
        self.row_at(self.row_offset(row.saturating_add(1)))
    }

    /// Nearest column left of `col` with a non-zero width.
    pub fn prev_visible_col(&self, col: u32) -> Option<u32> {
        prev_band(&self.col_positions, self.col_offset(col))
    }

    /// Nearest column right of `col` with a non-zero width.
    pub fn next_visible_col(&self, col: u32) -> Option<u32> {
        self.col_at(self.col_offset(col.saturating_add(1)))
    }

    /// Cell under a layout-space point. Points inside a merge resolve to its
    /// top-left cell; points outside the content extents give `None`.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<CellAddr> {
        let row = self.row_at(y)?;
        let col = self.col_at(x)?;
        Some(
            self.merge_at(row, col)
                .map_or(CellAddr::new(row, col), |m| m.origin()),
        )
    }

    /// Merge covering a cell, if any.
    pub fn merge_at(&self, row: u32, col: u32) -> Option<MergeInfo> {
        self.merges.find(row, col).map(|m| MergeInfo {
            is_origin: row == m.start_row && col == m.start_col,
            origin_row: m.start_row,
            origin_col: m.start_col,
            row_span: m.row_span(),
            col_span: m.col_span(),
        })
    }

    /// Layout rectangle of a cell. Any cell of a merge yields the whole merge.
    pub fn cell_rect(&self, row: u32, col: u32) -> Option<Rect> {
        if row >= self.row_count() || col >= self.col_count() {
            return None;
        }
        let (row, col, row_span, col_span) = match self.merge_at(row, col) {
            Some(m) => (m.origin_row, m.origin_col, m.row_span, m.col_span),
            None => (row, col, 1, 1),
        };
        let x = self.col_offset(col);
        let y = self.row_offset(row);
        Some(Rect::new(
            x,
            y,
            self.col_offset(col + col_span) - x,
            self.row_offset(row + row_span) - y,
        ))
    }

    /// Inclusive range of rows intersecting `[y0, y1)`, or `None` if the band
    /// misses the content.
    pub fn row_range(&self, y0: f32, y1: f32) -> Option<(u32, u32)> {
        band_range(&self.row_positions, y0, y1)
    }

    /// Inclusive range of columns intersecting `[x0, x1)`.
    pub fn col_range(&self, x0: f32, x1: f32) -> Option<(u32, u32)> {
        band_range(&self.col_positions, x0, x1)
    }

    /// Row ranges `[start, end)` where the vertical line at the left edge of
    /// `col` must not be drawn.
    pub fn vline_skips(&self, col: u32) -> Vec<(u32, u32)> {
        self.merges.vline_skips(col)
    }

    /// Column ranges `[start, end)` where the horizontal line at the top edge
    /// of `row` must not be drawn.
    pub fn hline_skips(&self, row: u32) -> Vec<(u32, u32)> {
        self.merges.hline_skips(row)
    }
}

fn sanitize(size: f32) -> f32 {
    if size.is_finite() {
        size
    } else {
        0.0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn index_at(positions: &[f32], v: f32) -> Option<u32> {
    let total = positions.last().copied()?;
    if !(v >= 0.0 && v < total) {
        return None;
    }
    // Last edge <= v; equal edges of zero-size bands resolve past them.
    let idx = positions.partition_point(|&p| p <= v).checked_sub(1)?;
    (idx + 1 < positions.len()).then_some(idx as u32)
}

/// Last non-empty band ending at or before `edge`.
#[allow(clippy::cast_possible_truncation)]
fn prev_band(positions: &[f32], edge: f32) -> Option<u32> {
    let idx = positions.partition_point(|&p| p < edge).checked_sub(1)?;
    Some(idx as u32)
}

#[allow(clippy::cast_possible_truncation)]
fn band_range(positions: &[f32], v0: f32, v1: f32) -> Option<(u32, u32)> {
    let total = positions.last().copied()?;
    let count = positions.len().checked_sub(1)?;
    if count == 0 || v1 <= 0.0 || v0 >= total || v1 <= v0 {
        return None;
    }
    let first = positions.partition_point(|&p| p <= v0.max(0.0)).checked_sub(1)?;
    let last = positions
        .partition_point(|&p| p < v1)
        .checked_sub(1)?
        .min(count - 1);
    Some((first.min(count - 1) as u32, last.max(first) as u32))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{ColMeta, MergeRegion, RowMeta, SheetState};
    use std::collections::BTreeMap;

    fn sheet(rows: u32, cols: u32) -> Sheet {
        Sheet {
            name: "Sheet1".into(),
            state: SheetState::Visible,
            tab_color: None,
            row_count: rows,
            col_count: cols,
            rows: Vec::new(),
            cols: Vec::new(),
            default_row_height: 20.0,
            default_col_width: 64.0,
            cells: BTreeMap::new(),
            merges: Vec::new(),
        }
    }

    #[test]
    fn prefix_sums_use_defaults() {
        let grid = LayoutGrid::compute(&sheet(10, 5));
        assert_eq!(grid.row_count(), 10);
        assert_eq!(grid.col_count(), 5);
        assert_eq!(grid.total_width(), 64.0 * 5.0);
        assert_eq!(grid.total_height(), 20.0 * 10.0);
        assert_eq!(grid.col_offset(2), 128.0);
    }

    #[test]
    fn floors_apply_to_visible_rows_only() {
        let mut s = sheet(3, 3);
        s.rows = vec![
            RowMeta {
                height: Some(0.0),
                hidden: false,
            },
            RowMeta {
                height: Some(30.0),
                hidden: true,
            },
        ];
        s.cols = vec![ColMeta {
            width: Some(1.0),
            hidden: false,
        }];
        let grid = LayoutGrid::compute(&s);
        assert_eq!(grid.row_height(0), MIN_ROW_HEIGHT);
        assert_eq!(grid.row_height(1), 0.0);
        assert_eq!(grid.row_height(2), 20.0);
        assert_eq!(grid.col_width(0), MIN_COL_WIDTH);
    }

    #[test]
    fn hit_testing_skips_hidden_rows() {
        let mut s = sheet(3, 1);
        s.rows = vec![
            RowMeta::default(),
            RowMeta {
                height: None,
                hidden: true,
            },
        ];
        let grid = LayoutGrid::compute(&s);
        assert_eq!(grid.row_at(0.0), Some(0));
        assert_eq!(grid.row_at(19.9), Some(0));
        assert_eq!(grid.row_at(20.0), Some(2));
        assert_eq!(grid.row_at(40.0), None);
        assert_eq!(grid.row_at(-0.1), None);
    }

    #[test]
    fn merge_interior_resolves_to_anchor() {
        let mut s = sheet(4, 4);
        s.merges.push(MergeRegion {
            start_row: 1,
            start_col: 1,
            end_row: 2,
            end_col: 2,
        });
        let grid = LayoutGrid::compute(&s);
        assert_eq!(grid.cell_at(64.0 * 2.5, 20.0 * 2.5), Some(CellAddr::new(1, 1)));
        assert_eq!(grid.cell_at(10.0, 10.0), Some(CellAddr::new(0, 0)));
        assert_eq!(grid.cell_rect(2, 2), Some(Rect::new(64.0, 20.0, 128.0, 40.0)));
        assert!(grid.merge_at(1, 1).unwrap().is_origin);
        assert!(!grid.merge_at(2, 1).unwrap().is_origin);
    }

    #[test]
    fn merges_produce_grid_line_skips() {
        let mut s = sheet(4, 4);
        s.merges.push(MergeRegion {
            start_row: 0,
            start_col: 0,
            end_row: 1,
            end_col: 2,
        });
        let grid = LayoutGrid::compute(&s);
        assert_eq!(grid.vline_skips(1), &[(0, 2)]);
        assert_eq!(grid.vline_skips(2), &[(0, 2)]);
        assert!(grid.vline_skips(3).is_empty());
        assert_eq!(grid.hline_skips(1), &[(0, 3)]);
        assert!(grid.hline_skips(2).is_empty());
    }

    #[test]
    fn neighbours_step_over_hidden_bands() {
        let mut s = sheet(6, 3);
        s.rows = vec![
            RowMeta::default(),
            RowMeta {
                height: None,
                hidden: true,
            },
            RowMeta {
                height: None,
                hidden: true,
            },
        ];
        s.cols = vec![
            ColMeta::default(),
            ColMeta {
                width: None,
                hidden: true,
            },
        ];
        let grid = LayoutGrid::compute(&s);

        assert_eq!(grid.next_visible_row(0), Some(3));
        assert_eq!(grid.prev_visible_row(3), Some(0));
        assert_eq!(grid.prev_visible_row(0), None);
        assert_eq!(grid.next_visible_row(5), None);
        assert_eq!(grid.next_visible_col(0), Some(2));
        assert_eq!(grid.prev_visible_col(2), Some(0));
    }

    #[test]
    fn ranges_cover_intersecting_bands() {
        let grid = LayoutGrid::compute(&sheet(10, 10));
        assert_eq!(grid.row_range(0.0, 40.0), Some((0, 1)));
        assert_eq!(grid.row_range(10.0, 41.0), Some((0, 2)));
        assert_eq!(grid.row_range(-50.0, 5.0), Some((0, 0)));
        assert_eq!(grid.row_range(190.0, 500.0), Some((9, 9)));
        assert_eq!(grid.row_range(200.0, 300.0), None);
        assert_eq!(grid.col_range(-10.0, 0.0), None);
    }

    #[test]
    fn empty_sheet_has_no_cells() {
        let grid = LayoutGrid::compute(&sheet(0, 0));
        assert_eq!(grid.total_width(), 0.0);
        assert_eq!(grid.cell_at(0.0, 0.0), None);
        assert_eq!(grid.cell_rect(0, 0), None);
        assert_eq!(grid.row_range(0.0, 100.0), None);
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersect(&Rect::new(10.0, 0.0, 5.0, 5.0)), None);
        assert!(a.encloses(&Rect::new(1.0, 1.0, 2.0, 2.0)));
    }
}
