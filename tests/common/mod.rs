//! Common test utilities and assertion helpers.
//!
//! Parsing helpers that panic with context, lookups by A1 reference, and
//! shortcuts for driving a [`PreviewSession`] with synthetic touches.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use xlpreview::cell_ref::parse_cell_ref;
use xlpreview::{
    Cell, CellValue, PreviewConfig, PreviewSession, Sheet, TouchEvent, Workbook,
};

// ============================================================================
// Parsing
// ============================================================================

/// Parse XLSX bytes, panicking with the error on failure.
#[must_use]
pub fn parse_workbook(data: &[u8]) -> Workbook {
    xlpreview::parse(data).unwrap_or_else(|e| panic!("parse failed: {e}"))
}

/// Session with `data` loaded into a viewport of `width` x `height`.
#[must_use]
pub fn session_for(data: &[u8], width: f32, height: f32) -> PreviewSession {
    let config = PreviewConfig {
        viewport_width: width,
        viewport_height: height,
        ..PreviewConfig::default()
    };
    let mut session = PreviewSession::new(config).unwrap();
    session.load(data).unwrap_or_else(|e| panic!("load failed: {e}"));
    session
}

// ============================================================================
// Lookups
// ============================================================================

/// Zero-based (row, col) of an A1 reference.
#[must_use]
pub fn addr(cell_ref: &str) -> (u32, u32) {
    parse_cell_ref(cell_ref.as_bytes()).unwrap_or_else(|| panic!("bad reference {cell_ref}"))
}

#[must_use]
pub fn sheet<'a>(workbook: &'a Workbook, name: &str) -> &'a Sheet {
    workbook
        .sheets
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no sheet named {name}"))
}

#[must_use]
pub fn get_cell<'a>(sheet: &'a Sheet, cell_ref: &str) -> Option<&'a Cell> {
    let (row, col) = addr(cell_ref);
    sheet.cell(row, col)
}

pub fn assert_cell_value(sheet: &Sheet, cell_ref: &str, expected: &CellValue) {
    let cell = get_cell(sheet, cell_ref)
        .unwrap_or_else(|| panic!("{}!{cell_ref} is missing", sheet.name));
    assert_eq!(&cell.value, expected, "{}!{cell_ref}", sheet.name);
}

pub fn assert_display(sheet: &Sheet, cell_ref: &str, date1904: bool, expected: &str) {
    let cell = get_cell(sheet, cell_ref)
        .unwrap_or_else(|| panic!("{}!{cell_ref} is missing", sheet.name));
    assert_eq!(cell.display_text(date1904), expected, "{}!{cell_ref}", sheet.name);
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// Touch scripts
// ============================================================================

/// One-finger drag from `from` to `to` in `steps` moves spread over
/// `duration_ms`, released at `to`.
#[must_use]
pub fn drag(from: (f32, f32), to: (f32, f32), steps: u32, duration_ms: f64) -> Vec<TouchEvent> {
    let steps = steps.max(1);
    let mut events = vec![TouchEvent::start(1, from.0, from.1, 0.0)];
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        events.push(TouchEvent::moved(
            1,
            from.0 + (to.0 - from.0) * t,
            from.1 + (to.1 - from.1) * t,
            duration_ms * f64::from(t),
        ));
    }
    events.push(TouchEvent::end(1, to.0, to.1, duration_ms));
    events
}

/// Press and release without moving.
#[must_use]
pub fn tap(x: f32, y: f32) -> Vec<TouchEvent> {
    vec![TouchEvent::start(1, x, y, 0.0), TouchEvent::end(1, x, y, 50.0)]
}
