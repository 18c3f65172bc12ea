//! `XlPreview` - the JavaScript-facing wrapper around [`PreviewSession`].
//!
//! The host owns the drawing surface and the touch listeners. It forwards
//! touch events here and paints whatever [`XlPreview::frame`] returns.

use wasm_bindgen::prelude::*;

use crate::cell_ref::cell_name;
use crate::config::PreviewConfig;
use crate::gesture::TouchEvent;
use crate::session::PreviewSession;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// The preview exported to JavaScript
#[wasm_bindgen]
pub struct XlPreview {
    session: PreviewSession,
}

#[wasm_bindgen]
impl XlPreview {
    /// Create a preview for a viewport of `width` x `height` CSS pixels.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> XlPreview {
        console_error_panic_hook::set_once();
        let mut session = PreviewSession::default();
        session.resize(width, height);
        XlPreview { session }
    }

    /// Create a preview from a TOML configuration document.
    ///
    /// # Errors
    /// Returns an error if the document is not valid configuration.
    #[wasm_bindgen(js_name = "withConfig")]
    pub fn with_config(toml: &str) -> Result<XlPreview, JsValue> {
        console_error_panic_hook::set_once();
        let config = PreviewConfig::from_toml_str(toml).map_err(js_error)?;
        let session = PreviewSession::new(config).map_err(js_error)?;
        Ok(XlPreview { session })
    }

    /// Load an XLSX file from bytes
    ///
    /// # Errors
    /// Returns an error if the workbook cannot be parsed; the previously
    /// loaded workbook stays visible.
    #[wasm_bindgen]
    pub fn load(&mut self, data: &[u8]) -> Result<(), JsValue> {
        self.session.load(data).map_err(js_error)
    }

    /// Current frame as a JS object.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    #[wasm_bindgen]
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.current_frame()).map_err(js_error)
    }

    /// Current frame as a JSON string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    #[wasm_bindgen(js_name = "frameJson")]
    pub fn frame_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.current_frame()).map_err(js_error)
    }

    /// Feed a touch event `{ kind, touches: [{ id, x, y }], timestampMs }`.
    /// Returns `{ redraw, sheetChanged, tapped? }`.
    ///
    /// # Errors
    /// Returns an error if the event object has the wrong shape.
    #[wasm_bindgen]
    pub fn touch(&mut self, event: JsValue) -> Result<JsValue, JsValue> {
        let event: TouchEvent = serde_wasm_bindgen::from_value(event).map_err(js_error)?;
        let outcome = self.session.handle_gesture(&event);
        serde_wasm_bindgen::to_value(&outcome).map_err(js_error)
    }

    /// Switch to sheet `index` (clamped). Returns true if the sheet changed.
    #[wasm_bindgen(js_name = "switchSheet")]
    pub fn switch_sheet(&mut self, index: usize) -> bool {
        self.session.switch_sheet(index)
    }

    #[wasm_bindgen]
    pub fn resize(&mut self, width: f32, height: f32) {
        self.session.resize(width, height);
    }

    /// Zoom around a screen point. Returns true if the view changed.
    #[wasm_bindgen(js_name = "setZoom")]
    pub fn set_zoom(&mut self, scale: f32, focus_x: f32, focus_y: f32) -> bool {
        self.session.set_zoom(scale, focus_x, focus_y)
    }

    #[wasm_bindgen(js_name = "sheetNames")]
    pub fn sheet_names(&self) -> Vec<String> {
        self.session
            .sheet_names()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    #[wasm_bindgen(js_name = "activeSheet")]
    pub fn active_sheet(&self) -> usize {
        self.session.current_sheet()
    }

    /// A1-style name of the cell under a screen point.
    #[wasm_bindgen(js_name = "cellAt")]
    pub fn cell_at(&self, x: f32, y: f32) -> Option<String> {
        self.session
            .cell_at_screen(x, y)
            .map(|addr| cell_name(addr.row, addr.col))
    }
}

impl XlPreview {
    pub fn session(&self) -> &PreviewSession {
        &self.session
    }
}
