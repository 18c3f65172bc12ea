use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::StyleRef;
use crate::numfmt::{format_boolean, format_value};

/// Zero-based (row, col) coordinate of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddr {
    pub row: u32,
    pub col: u32,
}

impl CellAddr {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// A cell value as stored in the workbook.
///
/// Dates keep their serial number; the calendar text is produced by the
/// number format at display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "camelCase")]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(f64),
    /// Spreadsheet error literal such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) | Self::Boolean(_) | Self::Date(_) | Self::Error(_) => false,
        }
    }
}

/// A single cell's value and resolved format.
#[derive(Debug, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(rename = "s")]
    pub format: StyleRef,
    /// Display text, formatted on first request.
    #[serde(skip)]
    display: OnceLock<String>,
}

impl Clone for Cell {
    fn clone(&self) -> Self {
        Self::new(self.value.clone(), self.format.clone())
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && *self.format == *other.format
    }
}

impl Cell {
    pub fn new(value: CellValue, format: StyleRef) -> Self {
        Self {
            value,
            format,
            display: OnceLock::new(),
        }
    }

    /// Text shown for this cell, computed once per cell.
    pub fn display_text(&self, date1904: bool) -> &str {
        self.display.get_or_init(|| match &self.value {
            CellValue::Empty => String::new(),
            CellValue::Text(s) | CellValue::Error(s) => s.clone(),
            CellValue::Boolean(b) => format_boolean(*b).to_string(),
            CellValue::Number(n) | CellValue::Date(n) => {
                format_value(*n, &self.format.number_format, date1904)
            }
        })
    }

    /// True when the cell has nothing to draw: no value and no visible style.
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && !self.format.has_visible_decoration()
    }
}
