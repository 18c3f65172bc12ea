//! xlpreview - mobile spreadsheet preview engine
//!
//! Turns XLSX bytes into an interactive, touch-navigable preview:
//! - Parsing of sheets, cell values, number formats, styles, merges, sizing
//! - Per-sheet layout with O(log n) hit testing
//! - Virtualized rendering into host-agnostic draw instructions
//! - Touch gestures: pan, pinch zoom, tap, fling between sheets
//!
//! # Usage (Rust)
//!
//! ```no_run
//! use xlpreview::{PreviewSession, TouchEvent};
//!
//! # fn main() -> xlpreview::error::Result<()> {
//! let bytes = std::fs::read("book.xlsx").unwrap_or_default();
//! let mut session = PreviewSession::default();
//! session.load(&bytes)?;
//! let outcome = session.handle_gesture(&TouchEvent::start(1, 100.0, 100.0, 0.0));
//! if outcome.redraw {
//!     let _frame = session.current_frame();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { XlPreview } from 'xlpreview';
//! await init();
//! const preview = new XlPreview(window.innerWidth, window.innerHeight);
//! preview.load(data);
//! paint(preview.frame());
//! ```

// Parsing modules
pub mod cell_ref;
pub mod color;
pub mod config;
pub mod error;
pub mod numfmt;
pub mod parser;
pub mod types;
pub mod xml_helpers;

// Preview pipeline
pub mod gesture;
pub mod layout;
pub mod render;
pub mod session;
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use config::PreviewConfig;
pub use error::{PreviewError, Result};
pub use gesture::{GestureCommand, GestureController, SheetDirection, TouchEvent, TouchKind, TouchPoint};
pub use layout::{LayoutCache, LayoutGrid, Rect};
pub use parser::{parse, parse_with_cancel, CancelToken};
pub use render::{render, DrawInstruction, Frame, ViewportState, VisibleCells};
pub use session::{GestureOutcome, PreviewSession};
pub use viewer::XlPreview;

pub use types::*;

/// Parse an XLSX file and return a JSON string representing the workbook
///
/// # Errors
/// Returns an error if the XLSX file is invalid or cannot be parsed.
#[wasm_bindgen]
pub fn parse_xlsx(data: &[u8]) -> std::result::Result<String, JsValue> {
    let workbook = parser::parse(data).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&workbook)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
