//! Virtualized cell enumeration.
//!
//! [`render`] walks only the rows and columns intersecting the viewport (plus
//! an overscan band) and yields one [`DrawInstruction`] per drawable cell.
//! The walk is lazy and borrows the layout immutably, so the same iterator
//! can be cloned and replayed for an unchanged viewport.

use serde::Serialize;

use super::ViewportState;
use crate::layout::{LayoutGrid, Rect};
use crate::types::{is_false, Sheet, StyleRef};

/// Everything a host needs to paint one cell (or one merged region).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawInstruction {
    /// Anchor row; for a merge, its top-left cell
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
    /// Full cell rectangle in screen pixels, possibly extending off-screen
    pub rect: Rect,
    /// Visible part of `rect` in screen pixels, when a viewport edge cuts it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<Rect>,
    /// Cell lies entirely in the overscan band
    #[serde(skip_serializing_if = "is_false")]
    pub overscan: bool,
    pub style: StyleRef,
    pub text: String,
}

impl DrawInstruction {
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }

    /// Screen area that actually needs painting.
    pub fn paint_rect(&self) -> Rect {
        self.clip.unwrap_or(self.rect)
    }
}

/// Lazy, restartable iterator over the draw instructions of one viewport.
#[derive(Debug, Clone)]
pub struct VisibleCells<'a> {
    grid: &'a LayoutGrid,
    sheet: &'a Sheet,
    viewport: ViewportState,
    /// Visible area in layout units
    visible: Rect,
    date1904: bool,
    /// Inclusive row/column ranges after overscan expansion
    rows: (u32, u32),
    cols: (u32, u32),
    cursor: Option<(u32, u32)>,
}

/// Enumerate the drawable cells of `sheet` inside `viewport`, expanded by
/// `overscan` rows and columns on every side.
pub fn render<'a>(
    grid: &'a LayoutGrid,
    sheet: &'a Sheet,
    viewport: &ViewportState,
    overscan: u32,
) -> VisibleCells<'a> {
    let visible = viewport.visible_rect();
    let ranges = grid
        .row_range(visible.y, visible.bottom())
        .zip(grid.col_range(visible.x, visible.right()));

    let (rows, cols, cursor) = match ranges {
        Some(((r0, r1), (c0, c1))) => {
            let rows = widen(
                (r0, r1),
                overscan,
                |r| grid.prev_visible_row(r),
                |r| grid.next_visible_row(r),
            );
            let cols = widen(
                (c0, c1),
                overscan,
                |c| grid.prev_visible_col(c),
                |c| grid.next_visible_col(c),
            );
            (rows, cols, Some((rows.0, cols.0)))
        }
        None => ((0, 0), (0, 0), None),
    };

    VisibleCells {
        grid,
        sheet,
        viewport: *viewport,
        visible,
        date1904: false,
        rows,
        cols,
        cursor,
    }
}

/// Extend an inclusive range by `count` non-empty bands on each side.
fn widen(
    (mut first, mut last): (u32, u32),
    count: u32,
    prev: impl Fn(u32) -> Option<u32>,
    next: impl Fn(u32) -> Option<u32>,
) -> (u32, u32) {
    for _ in 0..count {
        match prev(first) {
            Some(row) => first = row,
            None => break,
        }
    }
    for _ in 0..count {
        match next(last) {
            Some(row) => last = row,
            None => break,
        }
    }
    (first, last)
}

impl<'a> VisibleCells<'a> {
    /// Format dates with the 1904 date system.
    #[must_use]
    pub fn with_date1904(mut self, date1904: bool) -> Self {
        self.date1904 = date1904;
        self
    }

    /// Inclusive row range walked, overscan included.
    pub fn row_range(&self) -> (u32, u32) {
        self.rows
    }

    /// Inclusive column range walked, overscan included.
    pub fn col_range(&self) -> (u32, u32) {
        self.cols
    }

    fn advance(&mut self, row: u32, col: u32) {
        self.cursor = if col < self.cols.1 {
            Some((row, col + 1))
        } else if row < self.rows.1 {
            Some((row + 1, self.cols.0))
        } else {
            None
        };
    }

    fn instruction_at(&self, row: u32, col: u32) -> Option<DrawInstruction> {
        let (anchor_row, anchor_col, row_span, col_span) = match self.grid.merge_at(row, col) {
            Some(m) => {
                // A merge is emitted once, at its first coordinate inside the walked range.
                let first = (m.origin_row.max(self.rows.0), m.origin_col.max(self.cols.0));
                if (row, col) != first {
                    return None;
                }
                (m.origin_row, m.origin_col, m.row_span, m.col_span)
            }
            None => (row, col, 1, 1),
        };

        let cell = self.sheet.cell(anchor_row, anchor_col);
        let merged = row_span > 1 || col_span > 1;
        if !merged {
            match cell {
                Some(c) if !c.is_blank() => {}
                _ => return None,
            }
        }

        let rect = self.grid.cell_rect(anchor_row, anchor_col)?;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return None;
        }

        let (overscan, clip) = match rect.intersect(&self.visible) {
            None => (true, None),
            Some(_) if self.visible.encloses(&rect) => (false, None),
            Some(part) => (false, Some(self.viewport.rect_to_screen(&part))),
        };

        Some(DrawInstruction {
            row: anchor_row,
            col: anchor_col,
            row_span,
            col_span,
            rect: self.viewport.rect_to_screen(&rect),
            clip,
            overscan,
            style: cell.map(|c| c.format.clone()).unwrap_or_default(),
            text: cell
                .map(|c| c.display_text(self.date1904).to_string())
                .unwrap_or_default(),
        })
    }
}

impl Iterator for VisibleCells<'_> {
    type Item = DrawInstruction;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (row, col) = self.cursor?;
            self.advance(row, col);
            if let Some(instruction) = self.instruction_at(row, col) {
                return Some(instruction);
            }
        }
    }
}

impl std::iter::FusedIterator for VisibleCells<'_> {}
