//! Main XLSX parser
//!
//! Validates the container, then reads the parts in dependency order:
//! relationships, theme, shared strings, styles, workbook, and one worksheet
//! at a time. Nothing built here is visible to the caller until every sheet
//! has been read, so a failed or cancelled parse never leaks a half-built
//! workbook.

mod relationships;
mod styles;
mod worksheet;

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use zip::ZipArchive;

use crate::color::Palette;
use crate::error::{PreviewError, Result};
use crate::types::{CellAddr, Diagnostic, Workbook};

use relationships::{get_sheet_info, parse_shared_strings, parse_theme, parse_workbook_relationships};
use styles::{parse_stylesheet, ResolvedStyles};
use worksheet::{parse_sheet, SheetContext};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const WORKBOOK_PART: &str = "xl/workbook.xml";

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    use std::time::Instant;
    thread_local! {
        static START: Instant = Instant::now();
    }
    START.with(|s| s.elapsed().as_secs_f64() * 1000.0)
}

/// Cooperative cancellation flag for a running parse.
///
/// Clones share the flag, so the host can keep one handle and hand the other
/// to the parse (possibly on another thread).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PreviewError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Parse an XLSX workbook from bytes.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    parse_with_cancel(data, &CancelToken::default())
}

/// Parse an XLSX workbook, giving up with [`PreviewError::Cancelled`] as soon
/// as `cancel` is triggered.
pub fn parse_with_cancel(data: &[u8], cancel: &CancelToken) -> Result<Workbook> {
    let start = now_ms();
    validate_container(data)?;

    let mut archive = ZipArchive::new(Cursor::new(data))?;
    if archive.by_name(WORKBOOK_PART).is_err() {
        return Err(PreviewError::MalformedWorkbook(format!(
            "missing {WORKBOOK_PART}"
        )));
    }

    let mut diagnostics = Diagnostics::default();

    let relationships = parse_workbook_relationships(&mut archive);
    let theme = parse_theme(&mut archive, relationships.theme.as_deref());
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let stylesheet = parse_stylesheet(&mut archive, relationships.styles.as_deref(), &mut diagnostics);

    let palette = Palette {
        theme: theme.colors.clone(),
        indexed: (!stylesheet.indexed_colors.is_empty())
            .then(|| stylesheet.indexed_colors.clone()),
    };
    let styles = ResolvedStyles::resolve(&stylesheet, &palette, theme.minor_font.as_deref());
    let digit_width = get_digit_width(styles.default_font_name());

    let (sheet_info, date1904) = get_sheet_info(&mut archive, &relationships.worksheets)?;
    if sheet_info.is_empty() {
        return Err(PreviewError::MalformedWorkbook(
            "workbook declares no sheets".to_string(),
        ));
    }
    cancel.check()?;

    let ctx = SheetContext {
        shared_strings: &shared_strings,
        styles: &styles,
        palette: &palette,
        digit_width,
        cancel,
    };

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in &sheet_info {
        let sheet_start = now_ms();
        let sheet = parse_sheet(&mut archive, info, &ctx, &mut diagnostics)?;
        tracing::debug!(
            sheet = %sheet.name,
            rows = sheet.row_count,
            cols = sheet.col_count,
            cells = sheet.cells.len(),
            merges = sheet.merges.len(),
            elapsed_ms = now_ms() - sheet_start,
            "parsed worksheet"
        );
        sheets.push(sheet);
        cancel.check()?;
    }

    tracing::debug!(
        sheets = sheets.len(),
        shared_strings = shared_strings.len(),
        styles = styles.len(),
        diagnostics = diagnostics.0.len(),
        elapsed_ms = now_ms() - start,
        "parsed workbook"
    );

    Ok(Workbook {
        sheets,
        date1904,
        diagnostics: diagnostics.0,
    })
}

/// Reject inputs that are not a zip container before touching the archive.
fn validate_container(data: &[u8]) -> Result<()> {
    if data.starts_with(OLE_MAGIC) {
        return Err(PreviewError::UnsupportedFeature(
            "OLE compound document (legacy .xls or encrypted workbook)".to_string(),
        ));
    }
    if !data.starts_with(ZIP_MAGIC) {
        return Err(PreviewError::MalformedWorkbook(
            "not a zip container".to_string(),
        ));
    }
    Ok(())
}

/// Recovered problems collected during one parse.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub(crate) fn push(&mut self, sheet: Option<&str>, cell: Option<CellAddr>, message: String) {
        tracing::warn!(sheet = sheet.unwrap_or_default(), ?cell, "{message}");
        self.0.push(Diagnostic {
            sheet: sheet.map(ToString::to_string),
            cell,
            message,
        });
    }
}

/// Maximum digit width in pixels of a font at 11pt, 96 DPI.
///
/// Drives the character-to-pixel column width conversion. Unknown fonts use
/// Calibri's value.
fn get_digit_width(font_name: &str) -> f64 {
    match font_name {
        "Arial" => 6.5,
        "Times New Roman" => 5.7,
        "Verdana" => 7.5,
        "Consolas" => 7.7,
        "Courier New" => 7.3,
        "Tahoma" => 6.8,
        "Georgia" => 6.2,
        _ => 7.0,
    }
}
