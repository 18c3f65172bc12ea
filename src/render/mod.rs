//! Viewport renderer.
//!
//! Turns a laid-out sheet and a [`ViewportState`] into host-agnostic draw
//! data: per-cell [`DrawInstruction`]s and [`GridLine`] segments, both in
//! screen pixels. Nothing here touches a drawing surface.

mod grid_lines;
mod viewport;
mod visible;

pub use grid_lines::{grid_lines, GridLine};
pub use viewport::ViewportState;
pub use visible::{render, DrawInstruction, VisibleCells};

use serde::Serialize;

use crate::layout::LayoutGrid;
use crate::types::Sheet;

/// One complete frame for the host to paint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub sheet: usize,
    pub sheet_name: String,
    pub scale: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
    /// Viewport size in screen pixels
    pub width: f32,
    pub height: f32,
    /// Content extents in layout units
    pub content_width: f32,
    pub content_height: f32,
    pub cells: Vec<DrawInstruction>,
    pub grid_lines: Vec<GridLine>,
}

impl Frame {
    /// Collect every instruction and grid line of one viewport.
    pub fn build(
        grid: &LayoutGrid,
        sheet: &Sheet,
        viewport: &ViewportState,
        overscan: u32,
        date1904: bool,
    ) -> Self {
        Self {
            sheet: viewport.sheet,
            sheet_name: sheet.name.clone(),
            scale: viewport.scale,
            scroll_x: viewport.scroll_x,
            scroll_y: viewport.scroll_y,
            width: viewport.width,
            height: viewport.height,
            content_width: grid.total_width(),
            content_height: grid.total_height(),
            cells: render(grid, sheet, viewport, overscan)
                .with_date1904(date1904)
                .collect(),
            grid_lines: grid_lines(grid, viewport),
        }
    }

    /// Instructions that are at least partly on screen.
    pub fn on_screen(&self) -> impl Iterator<Item = &DrawInstruction> {
        self.cells.iter().filter(|c| !c.overscan)
    }
}
