//! Structured error types for xlpreview.
//!
//! Only structural corruption of the workbook container is fatal. Everything
//! the parser can degrade around is recorded as a [`Diagnostic`] on the
//! workbook instead of being surfaced here.

use crate::config::ConfigError;

/// All errors that can occur while loading a workbook into a preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// The container structure could not be decoded (not a zip, missing
    /// `xl/workbook.xml`, unreadable worksheet part).
    #[error("Malformed workbook: {0}")]
    MalformedWorkbook(String),

    /// ZIP archive error.
    #[error("Malformed workbook: ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error from quick-xml.
    #[error("Malformed workbook: XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A construct that has no reasonable fallback (e.g. an encrypted package).
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// The parse was aborted through its [`crate::parser::CancelToken`].
    #[error("Parse cancelled")]
    Cancelled,

    /// Rejected configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl PreviewError {
    /// True for errors caused by an undecodable container.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedWorkbook(_) | Self::Zip(_) | Self::Xml(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PreviewError>;

#[cfg(target_arch = "wasm32")]
impl From<PreviewError> for wasm_bindgen::JsValue {
    fn from(e: PreviewError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
