use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use super::{Cell, CellAddr};

/// A complete parsed workbook. Immutable once returned by the parser.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// Whether the workbook uses the 1904 date system (Mac default).
    #[serde(skip_serializing_if = "is_false")]
    pub date1904: bool,
    /// Constructs the parser degraded around instead of failing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) fn is_false(b: &bool) -> bool {
    !b
}

impl Workbook {
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Index of the first visible sheet, or 0 if every sheet is hidden.
    pub fn first_visible_sheet(&self) -> usize {
        self.sheets
            .iter()
            .position(|s| s.state == SheetState::Visible)
            .unwrap_or(0)
    }

    /// Next visible sheet after `from` in the given direction, if any.
    pub fn step_visible_sheet(&self, from: usize, forward: bool) -> Option<usize> {
        if forward {
            self.sheets
                .iter()
                .enumerate()
                .skip(from.saturating_add(1))
                .find(|(_, s)| s.state == SheetState::Visible)
                .map(|(i, _)| i)
        } else {
            self.sheets
                .iter()
                .enumerate()
                .take(from)
                .rev()
                .find(|(_, s)| s.state == SheetState::Visible)
                .map(|(i, _)| i)
        }
    }
}

/// A recovered parse problem: logged, kept for the host, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<CellAddr>,
    pub message: String,
}

/// Sheet visibility state
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

/// Row metadata. `height` is in layout units; `None` means the sheet default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RowMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
}

/// Column metadata. `width` is in layout units; `None` means the sheet default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
}

/// Inclusive rectangular merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRegion {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeRegion {
    pub fn anchor(&self) -> CellAddr {
        CellAddr::new(self.start_row, self.start_col)
    }

    pub fn rows(&self) -> RangeInclusive<u32> {
        self.start_row..=self.end_row
    }

    pub fn cols(&self) -> RangeInclusive<u32> {
        self.start_col..=self.end_col
    }

    pub fn row_span(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row).saturating_add(1)
    }

    pub fn col_span(&self) -> u32 {
        self.end_col.saturating_sub(self.start_col).saturating_add(1)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        self.rows().contains(&row) && self.cols().contains(&col)
    }

    pub fn overlaps(&self, other: &MergeRegion) -> bool {
        self.start_row <= other.end_row
            && other.start_row <= self.end_row
            && self.start_col <= other.end_col
            && other.start_col <= self.end_col
    }

    /// A single-cell "merge" carries no layout meaning.
    pub fn is_trivial(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }
}

/// A single worksheet.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    pub state: SheetState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_color: Option<String>, // #RRGGBB
    pub row_count: u32,
    pub col_count: u32,
    /// One entry per row, indexed by declared row number.
    pub rows: Vec<RowMeta>,
    /// One entry per column, indexed by declared column number.
    pub cols: Vec<ColMeta>,
    pub default_row_height: f32,
    pub default_col_width: f32,
    /// Sparse cells keyed by (row, col).
    #[serde(with = "cell_map")]
    pub cells: BTreeMap<(u32, u32), Cell>,
    pub merges: Vec<MergeRegion>,
}

impl Sheet {
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Effective height of a row before layout floors are applied.
    pub fn row_height(&self, row: u32) -> f32 {
        match self.rows.get(row as usize) {
            Some(meta) if meta.hidden => 0.0,
            Some(meta) => meta.height.unwrap_or(self.default_row_height),
            None => self.default_row_height,
        }
    }

    /// Effective width of a column before layout floors are applied.
    pub fn col_width(&self, col: u32) -> f32 {
        match self.cols.get(col as usize) {
            Some(meta) if meta.hidden => 0.0,
            Some(meta) => meta.width.unwrap_or(self.default_col_width),
            None => self.default_col_width,
        }
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.rows.get(row as usize).is_some_and(|m| m.hidden)
    }

    pub fn is_col_hidden(&self, col: u32) -> bool {
        self.cols.get(col as usize).is_some_and(|m| m.hidden)
    }
}

/// JSON has no tuple keys; serialize the cell map as a list of `{r, c, cell}`.
mod cell_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    use crate::types::Cell;

    #[derive(Serialize)]
    struct EntryRef<'a> {
        r: u32,
        c: u32,
        cell: &'a Cell,
    }

    #[derive(Deserialize)]
    struct Entry {
        r: u32,
        c: u32,
        cell: Cell,
    }

    pub(super) fn serialize<S>(
        cells: &BTreeMap<(u32, u32), Cell>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(
            cells
                .iter()
                .map(|(&(r, c), cell)| EntryRef { r, c, cell }),
        )
    }

    pub(super) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<(u32, u32), Cell>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| ((e.r, e.c), e.cell)).collect())
    }
}
