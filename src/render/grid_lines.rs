//! Grid line segments for the visible area.

use serde::Serialize;

use super::ViewportState;
use crate::layout::LayoutGrid;

/// One straight grid line segment in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl GridLine {
    pub fn is_vertical(&self) -> bool {
        (self.x1 - self.x2).abs() < f32::EPSILON
    }
}

/// Grid line segments visible in `viewport`.
///
/// Lines never run through the interior of a merged region, and the
/// coinciding boundaries of hidden rows/columns are drawn once.
pub fn grid_lines(grid: &LayoutGrid, viewport: &ViewportState) -> Vec<GridLine> {
    let visible = viewport.visible_rect();
    let (Some((r0, r1)), Some((c0, c1))) = (
        grid.row_range(visible.y, visible.bottom()),
        grid.col_range(visible.x, visible.right()),
    ) else {
        return Vec::new();
    };

    let mut lines = Vec::new();

    // Vertical lines at column boundaries
    let mut last_x = None;
    for col in c0..=c1 + 1 {
        let x = grid.col_offset(col);
        if last_x.replace(x) == Some(x) || x < visible.x || x > visible.right() {
            continue;
        }
        for (start, end) in open_segments(r0, r1 + 1, &grid.vline_skips(col)) {
            let y1 = grid.row_offset(start).max(visible.y);
            let y2 = grid.row_offset(end).min(visible.bottom());
            if y2 > y1 {
                let (sx, sy1) = viewport.to_screen(x, y1);
                let (_, sy2) = viewport.to_screen(x, y2);
                lines.push(GridLine {
                    x1: sx,
                    y1: sy1,
                    x2: sx,
                    y2: sy2,
                });
            }
        }
    }

    // Horizontal lines at row boundaries
    let mut last_y = None;
    for row in r0..=r1 + 1 {
        let y = grid.row_offset(row);
        if last_y.replace(y) == Some(y) || y < visible.y || y > visible.bottom() {
            continue;
        }
        for (start, end) in open_segments(c0, c1 + 1, &grid.hline_skips(row)) {
            let x1 = grid.col_offset(start).max(visible.x);
            let x2 = grid.col_offset(end).min(visible.right());
            if x2 > x1 {
                let (sx1, sy) = viewport.to_screen(x1, y);
                let (sx2, _) = viewport.to_screen(x2, y);
                lines.push(GridLine {
                    x1: sx1,
                    y1: sy,
                    x2: sx2,
                    y2: sy,
                });
            }
        }
    }

    lines
}

/// Parts of `[start, end)` not covered by `skips` (sorted, disjoint).
fn open_segments(start: u32, end: u32, skips: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut segments = Vec::new();
    let mut current = start;
    for &(skip_start, skip_end) in skips {
        if skip_end <= current {
            continue;
        }
        if skip_start >= end {
            break;
        }
        if skip_start > current {
            segments.push((current, skip_start));
        }
        current = current.max(skip_end);
    }
    if current < end {
        segments.push((current, end));
    }
    segments
}
