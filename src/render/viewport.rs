//! Viewport state management for scrolling and zoom.

use serde::Serialize;

use crate::layout::{LayoutGrid, Rect};

/// Viewport state: which sheet is shown, where, and how large.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    /// Index of the displayed sheet
    pub sheet: usize,
    /// Horizontal scroll position in layout units
    pub scroll_x: f32,
    /// Vertical scroll position in layout units
    pub scroll_y: f32,
    /// Viewport width in screen pixels
    pub width: f32,
    /// Viewport height in screen pixels
    pub height: f32,
    /// Zoom scale factor (1.0 = 100%)
    pub scale: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(375.0, 667.0, 1.0)
    }
}

impl ViewportState {
    pub fn new(width: f32, height: f32, scale: f32) -> Self {
        Self {
            sheet: 0,
            scroll_x: 0.0,
            scroll_y: 0.0,
            width: width.max(0.0),
            height: height.max(0.0),
            scale,
        }
    }

    /// Show `sheet` from its origin at `scale`.
    pub fn reset(&mut self, sheet: usize, scale: f32) {
        self.sheet = sheet;
        self.scroll_x = 0.0;
        self.scroll_y = 0.0;
        self.scale = scale;
    }

    /// Visible area in layout units.
    pub fn visible_rect(&self) -> Rect {
        Rect::new(
            self.scroll_x,
            self.scroll_y,
            self.width / self.scale,
            self.height / self.scale,
        )
    }

    /// Convert layout coordinates to screen coordinates
    pub fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.scroll_x) * self.scale,
            (y - self.scroll_y) * self.scale,
        )
    }

    /// Convert screen coordinates to layout coordinates
    pub fn to_layout(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        (
            screen_x / self.scale + self.scroll_x,
            screen_y / self.scale + self.scroll_y,
        )
    }

    pub fn rect_to_screen(&self, rect: &Rect) -> Rect {
        let (x, y) = self.to_screen(rect.x, rect.y);
        Rect::new(x, y, rect.width * self.scale, rect.height * self.scale)
    }

    /// Largest scroll offsets that still keep content under the viewport.
    pub fn max_scroll(&self, grid: &LayoutGrid) -> (f32, f32) {
        let visible = self.visible_rect();
        (
            (grid.total_width() - visible.width).max(0.0),
            (grid.total_height() - visible.height).max(0.0),
        )
    }

    /// Clamp scroll position to valid range
    pub fn clamp_scroll(&mut self, grid: &LayoutGrid) {
        let (max_x, max_y) = self.max_scroll(grid);
        self.scroll_x = finite_or_zero(self.scroll_x).clamp(0.0, max_x);
        self.scroll_y = finite_or_zero(self.scroll_y).clamp(0.0, max_y);
    }

    /// Scroll by a delta in layout units. Returns true if the position changed.
    pub fn scroll_by(&mut self, dx: f32, dy: f32, grid: &LayoutGrid) -> bool {
        let before = (self.scroll_x, self.scroll_y);
        self.scroll_x += dx;
        self.scroll_y += dy;
        self.clamp_scroll(grid);
        before != (self.scroll_x, self.scroll_y)
    }

    /// Set scroll position in layout units, clamped.
    pub fn set_scroll(&mut self, x: f32, y: f32, grid: &LayoutGrid) {
        self.scroll_x = x;
        self.scroll_y = y;
        self.clamp_scroll(grid);
    }

    /// Change the scale while keeping the layout point under the screen
    /// point `(focus_x, focus_y)` fixed, then clamp.
    pub fn zoom_around(&mut self, scale: f32, focus_x: f32, focus_y: f32, grid: &LayoutGrid) {
        let (anchor_x, anchor_y) = self.to_layout(focus_x, focus_y);
        self.scale = scale;
        self.scroll_x = anchor_x - focus_x / scale;
        self.scroll_y = anchor_y - focus_y / scale;
        self.clamp_scroll(grid);
    }

    /// Resize the viewport in screen pixels and re-clamp the scroll position.
    pub fn resize(&mut self, width: f32, height: f32, grid: &LayoutGrid) {
        self.width = finite_or_zero(width).max(0.0);
        self.height = finite_or_zero(height).max(0.0);
        self.clamp_scroll(grid);
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
