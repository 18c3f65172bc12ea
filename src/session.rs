//! Preview session: one workbook, one viewport, one gesture stream.
//!
//! The session is the only stateful piece of the engine. It owns the parsed
//! workbook, the per-sheet layout cache, the viewport and the gesture
//! controller, and applies gesture commands to the viewport.

use serde::Serialize;
use std::sync::Arc;

use crate::config::PreviewConfig;
use crate::error::Result;
use crate::gesture::{
    GestureCommand, GestureController, GestureSettings, GestureState, SheetDirection, TouchEvent,
};
use crate::layout::{LayoutCache, LayoutGrid};
use crate::parser::{parse_with_cancel, CancelToken};
use crate::render::{render, Frame, ViewportState, VisibleCells};
use crate::types::{CellAddr, Sheet, Workbook};

/// What a gesture event changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureOutcome {
    /// The viewport moved or zoomed; the host should request a new frame.
    pub redraw: bool,
    pub sheet_changed: bool,
    /// Cell under a tap, resolved to the anchor of a merge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tapped: Option<CellAddr>,
}

impl GestureOutcome {
    fn merge(&mut self, other: GestureOutcome) {
        self.redraw |= other.redraw;
        self.sheet_changed |= other.sheet_changed;
        self.tapped = other.tapped.or(self.tapped);
    }
}

/// Interactive preview of one workbook.
#[derive(Debug)]
pub struct PreviewSession {
    config: PreviewConfig,
    workbook: Option<Workbook>,
    layouts: LayoutCache,
    /// Layout of the sheet the viewport shows
    layout: Option<Arc<LayoutGrid>>,
    viewport: ViewportState,
    gestures: GestureController,
    /// Scale when the current pinch began
    pinch_base: Option<f32>,
}

impl Default for PreviewSession {
    fn default() -> Self {
        Self::with_config(PreviewConfig::default())
    }
}

impl PreviewSession {
    /// Create an empty session after validating `config`.
    pub fn new(config: PreviewConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: PreviewConfig) -> Self {
        let viewport = ViewportState::new(
            config.viewport_width,
            config.viewport_height,
            config.clamp_zoom(config.default_zoom),
        );
        Self {
            gestures: GestureController::new(GestureSettings::from(&config)),
            config,
            workbook: None,
            layouts: LayoutCache::new(),
            layout: None,
            viewport,
            pinch_base: None,
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Parse `data` and show its first visible sheet. On error the previous
    /// workbook stays loaded.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        self.load_with_cancel(data, &CancelToken::new())
    }

    /// [`load`](Self::load) with a cancellation token.
    pub fn load_with_cancel(&mut self, data: &[u8], cancel: &CancelToken) -> Result<()> {
        let workbook = parse_with_cancel(data, cancel)?;
        self.load_workbook(workbook);
        Ok(())
    }

    /// Show an already parsed workbook.
    pub fn load_workbook(&mut self, workbook: Workbook) {
        let first = workbook.first_visible_sheet();
        tracing::info!(
            sheets = workbook.sheets.len(),
            first_sheet = first,
            diagnostics = workbook.diagnostics.len(),
            "workbook loaded"
        );
        self.workbook = Some(workbook);
        self.layouts.clear();
        self.show_sheet(first);
    }

    pub fn workbook(&self) -> Option<&Workbook> {
        self.workbook.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.workbook.is_some()
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn current_sheet(&self) -> usize {
        self.viewport.sheet
    }

    pub fn sheet_count(&self) -> usize {
        self.workbook.as_ref().map_or(0, |wb| wb.sheets.len())
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook
            .as_ref()
            .map(Workbook::sheet_names)
            .unwrap_or_default()
    }

    fn sheet(&self) -> Option<&Sheet> {
        self.workbook.as_ref()?.sheet(self.viewport.sheet)
    }

    /// Layout of the current sheet.
    pub fn layout(&self) -> Option<&LayoutGrid> {
        self.layout.as_deref()
    }

    /// Lazy draw instructions for the current viewport.
    pub fn visible_cells(&self) -> Option<VisibleCells<'_>> {
        let workbook = self.workbook.as_ref()?;
        let sheet = workbook.sheet(self.viewport.sheet)?;
        let grid = self.layout.as_deref()?;
        Some(
            render(grid, sheet, &self.viewport, self.config.overscan)
                .with_date1904(workbook.date1904),
        )
    }

    /// Everything needed to paint the current viewport. Empty before a
    /// workbook is loaded.
    pub fn current_frame(&self) -> Frame {
        match (&self.workbook, self.sheet(), self.layout.as_deref()) {
            (Some(workbook), Some(sheet), Some(grid)) => Frame::build(
                grid,
                sheet,
                &self.viewport,
                self.config.overscan,
                workbook.date1904,
            ),
            _ => Frame {
                sheet: self.viewport.sheet,
                scale: self.viewport.scale,
                width: self.viewport.width,
                height: self.viewport.height,
                ..Frame::default()
            },
        }
    }

    /// Show sheet `index`, clamped to the last sheet. Returns true when the
    /// displayed sheet changed; the scroll position then returns to the origin.
    pub fn switch_sheet(&mut self, index: usize) -> bool {
        let count = self.sheet_count();
        if count == 0 {
            return false;
        }
        let index = index.min(count - 1);
        if index == self.viewport.sheet {
            return false;
        }
        self.show_sheet(index);
        true
    }

    fn show_sheet(&mut self, index: usize) {
        self.gestures.reset();
        self.pinch_base = None;
        self.viewport
            .reset(index, self.config.clamp_zoom(self.config.default_zoom));
        self.layout = match &self.workbook {
            Some(workbook) => workbook
                .sheet(index)
                .map(|sheet| self.layouts.get_or_compute(index, sheet)),
            None => None,
        };
        if let Some(grid) = &self.layout {
            self.viewport.clamp_scroll(grid);
        }
        tracing::debug!(sheet = index, "showing sheet");
    }

    /// Resize the viewport (screen pixels).
    pub fn resize(&mut self, width: f32, height: f32) {
        match &self.layout {
            Some(grid) => self.viewport.resize(width, height, grid),
            None => {
                self.viewport.width = width.max(0.0);
                self.viewport.height = height.max(0.0);
            }
        }
    }

    /// Zoom to `scale` (clamped) keeping the screen point `(focus_x, focus_y)` fixed.
    pub fn set_zoom(&mut self, scale: f32, focus_x: f32, focus_y: f32) -> bool {
        let scale = self.config.clamp_zoom(scale);
        let Some(grid) = &self.layout else {
            self.viewport.scale = scale;
            return false;
        };
        let before = self.viewport;
        self.viewport.zoom_around(scale, focus_x, focus_y, grid);
        before != self.viewport
    }

    /// Scroll so that layout point `(x, y)` is at the top-left, clamped.
    pub fn scroll_to(&mut self, x: f32, y: f32) -> bool {
        let Some(grid) = &self.layout else {
            return false;
        };
        let before = self.viewport;
        self.viewport.set_scroll(x, y, grid);
        before != self.viewport
    }

    /// Cell under a screen point, resolved to the anchor of a merge.
    pub fn cell_at_screen(&self, x: f32, y: f32) -> Option<CellAddr> {
        let grid = self.layout.as_deref()?;
        let (lx, ly) = self.viewport.to_layout(x, y);
        grid.cell_at(lx, ly)
    }

    /// Feed one touch event and apply the resulting commands.
    pub fn handle_gesture(&mut self, event: &TouchEvent) -> GestureOutcome {
        let commands = self.gestures.handle(event);
        self.pinch_base = match self.gestures.state() {
            GestureState::Pinching => Some(self.pinch_base.unwrap_or(self.viewport.scale)),
            _ => None,
        };
        let mut outcome = GestureOutcome::default();
        for command in commands {
            outcome.merge(self.apply(command));
        }
        outcome
    }

    /// Apply one navigation command to the viewport. Zoom factors are relative
    /// to the scale the current pinch began at, or to the current scale
    /// outside a pinch.
    pub fn apply(&mut self, command: GestureCommand) -> GestureOutcome {
        let mut outcome = GestureOutcome::default();
        match command {
            GestureCommand::Pan { dx, dy } => {
                if let Some(grid) = &self.layout {
                    let scale = self.viewport.scale;
                    outcome.redraw = self.viewport.scroll_by(-dx / scale, -dy / scale, grid);
                }
            }
            GestureCommand::Zoom {
                factor,
                focus_x,
                focus_y,
            } => {
                let base = self.pinch_base.unwrap_or(self.viewport.scale);
                outcome.redraw = self.set_zoom(base * factor, focus_x, focus_y);
            }
            GestureCommand::Tap { x, y } => {
                outcome.tapped = self.cell_at_screen(x, y);
            }
            GestureCommand::SwitchSheet { direction } => {
                let target = self.workbook.as_ref().and_then(|wb| {
                    wb.step_visible_sheet(self.viewport.sheet, direction == SheetDirection::Next)
                });
                if let Some(index) = target {
                    outcome.sheet_changed = self.switch_sheet(index);
                    outcome.redraw = outcome.sheet_changed;
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{Cell, CellValue, MergeRegion, SheetState, StyleRef};
    use std::collections::BTreeMap;

    fn sheet(name: &str, rows: u32, cols: u32, state: SheetState) -> Sheet {
        Sheet {
            name: name.into(),
            state,
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

    fn workbook(sheets: Vec<Sheet>) -> Workbook {
        Workbook {
            sheets,
            date1904: false,
            diagnostics: Vec::new(),
        }
    }

    fn session_with(sheets: Vec<Sheet>) -> PreviewSession {
        let mut session = PreviewSession::default();
        session.load_workbook(workbook(sheets));
        session
    }

    #[test]
    fn empty_session_renders_empty_frame() {
        let session = PreviewSession::default();
        let frame = session.current_frame();
        assert!(frame.cells.is_empty());
        assert!(session.visible_cells().is_none());
        assert_eq!(session.cell_at_screen(1.0, 1.0), None);
    }

    #[test]
    fn switch_sheet_clamps_silently() {
        let mut session = session_with(vec![
            sheet("A", 10, 10, SheetState::Visible),
            sheet("B", 10, 10, SheetState::Visible),
        ]);
        assert!(session.switch_sheet(5));
        assert_eq!(session.current_sheet(), 1);
        assert!(!session.switch_sheet(1));
    }

    #[test]
    fn switching_sheet_resets_scroll() {
        let mut session = session_with(vec![
            sheet("A", 500, 50, SheetState::Visible),
            sheet("B", 500, 50, SheetState::Visible),
        ]);
        assert!(session.scroll_to(300.0, 900.0));
        session.switch_sheet(1);
        assert_eq!((session.viewport().scroll_x, session.viewport().scroll_y), (0.0, 0.0));
    }

    #[test]
    fn load_starts_on_first_visible_sheet() {
        let session = session_with(vec![
            sheet("Hidden", 1, 1, SheetState::Hidden),
            sheet("Shown", 1, 1, SheetState::Visible),
        ]);
        assert_eq!(session.current_sheet(), 1);
        assert_eq!(session.current_frame().sheet_name, "Shown");
    }

    #[test]
    fn failed_load_keeps_previous_workbook() {
        let mut session = session_with(vec![sheet("Keep", 1, 1, SheetState::Visible)]);
        assert!(session.load(b"not a workbook").is_err());
        assert_eq!(session.sheet_names(), vec!["Keep"]);
    }

    #[test]
    fn pan_command_moves_against_finger_and_clamps() {
        let mut session = session_with(vec![sheet("A", 1000, 100, SheetState::Visible)]);
        let outcome = session.apply(GestureCommand::Pan { dx: -50.0, dy: -80.0 });
        assert!(outcome.redraw);
        assert_eq!(session.viewport().scroll_x, 50.0);
        assert_eq!(session.viewport().scroll_y, 80.0);
        let outcome = session.apply(GestureCommand::Pan { dx: 500.0, dy: 500.0 });
        assert!(outcome.redraw);
        assert_eq!((session.viewport().scroll_x, session.viewport().scroll_y), (0.0, 0.0));
        assert!(!session.apply(GestureCommand::Pan { dx: 5.0, dy: 5.0 }).redraw);
    }

    #[test]
    fn zoom_command_is_clamped() {
        let mut session = session_with(vec![sheet("A", 1000, 100, SheetState::Visible)]);
        session.apply(GestureCommand::Zoom {
            factor: 100.0,
            focus_x: 10.0,
            focus_y: 10.0,
        });
        assert_eq!(session.viewport().scale, session.config().max_zoom);
        session.apply(GestureCommand::Zoom {
            factor: 0.0001,
            focus_x: 10.0,
            focus_y: 10.0,
        });
        assert_eq!(session.viewport().scale, session.config().min_zoom);
    }

    #[test]
    fn tap_inside_merge_reports_anchor() {
        let mut s = sheet("A", 10, 10, SheetState::Visible);
        s.cells.insert(
            (0, 0),
            Cell::new(CellValue::Text("Total".into()), StyleRef::default()),
        );
        s.merges.push(MergeRegion {
            start_row: 0,
            start_col: 0,
            end_row: 1,
            end_col: 1,
        });
        let mut session = session_with(vec![s]);
        let outcome = session.apply(GestureCommand::Tap { x: 100.0, y: 30.0 });
        assert_eq!(outcome.tapped, Some(CellAddr::new(0, 0)));
        assert!(!outcome.redraw);
    }

    #[test]
    fn fling_skips_hidden_sheets_and_stops_at_bounds() {
        let mut session = session_with(vec![
            sheet("A", 1, 1, SheetState::Visible),
            sheet("B", 1, 1, SheetState::Hidden),
            sheet("C", 1, 1, SheetState::Visible),
        ]);
        let next = GestureCommand::SwitchSheet {
            direction: SheetDirection::Next,
        };
        let outcome = session.apply(next);
        assert!(outcome.sheet_changed);
        assert_eq!(session.current_sheet(), 2);
        assert!(!session.apply(next).sheet_changed);
        assert_eq!(session.current_sheet(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PreviewConfig {
            min_zoom: 5.0,
            ..PreviewConfig::default()
        };
        assert!(PreviewSession::new(config).is_err());
    }
}
