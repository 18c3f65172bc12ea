//! Worksheet parsing - turns one sheet XML part into a [`Sheet`].

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{BTreeMap, HashSet};
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{cell_name, parse_cell_range, parse_cell_ref, MAX_COLS, MAX_ROWS};
use crate::color::Palette;
use crate::error::Result;
use crate::types::{
    Cell, CellAddr, CellValue, ColMeta, MergeRegion, RowMeta, Sheet, SheetState, StyleRef,
};
use crate::xml_helpers::{attr_bool, attr_bytes, attr_f64, attr_string, attr_u32, parse_color_attrs};

use super::styles::ResolvedStyles;
use super::{CancelToken, Diagnostics};

/// Rows read between two cancellation checks.
const CANCEL_CHECK_ROWS: u32 = 1024;

/// Default row height: 15pt at 96 DPI.
const DEFAULT_ROW_HEIGHT: f32 = 20.0;
/// Excel's default column width in characters when `sheetFormatPr` is silent.
const DEFAULT_COL_CHARS: f64 = 8.43;

/// Sheet metadata from workbook.xml
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
    pub state: SheetState,
}

/// Workbook-wide inputs shared by every sheet of one parse.
pub(super) struct SheetContext<'a> {
    pub shared_strings: &'a [String],
    pub styles: &'a ResolvedStyles,
    pub palette: &'a Palette,
    pub digit_width: f64,
    pub cancel: &'a CancelToken,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CellTypeTag {
    Number,
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    IsoDate,
    Unknown,
}

fn parse_cell_type_tag(value: Option<&[u8]>) -> CellTypeTag {
    match value {
        None | Some(b"n") => CellTypeTag::Number,
        Some(b"s") => CellTypeTag::Shared,
        Some(b"inlineStr") => CellTypeTag::Inline,
        Some(b"str") => CellTypeTag::Str,
        Some(b"b") => CellTypeTag::Bool,
        Some(b"e") => CellTypeTag::Error,
        Some(b"d") => CellTypeTag::IsoDate,
        Some(_) => CellTypeTag::Unknown,
    }
}

/// Points to layout units.
#[allow(clippy::cast_possible_truncation)]
fn points_to_px(points: f64) -> f32 {
    (points * 96.0 / 72.0) as f32
}

/// Column width in characters (as stored in `<col width>`) to whole pixels.
#[allow(clippy::cast_possible_truncation)]
fn col_chars_to_px(width: f64, digit_width: f64) -> f32 {
    let padding = (128.0 / digit_width).trunc();
    (((256.0 * width + padding) / 256.0) * digit_width).trunc() as f32
}

/// `defaultColWidth` (characters, without padding) to whole pixels.
#[allow(clippy::cast_possible_truncation)]
fn default_col_chars_to_px(width: f64, digit_width: f64) -> f32 {
    let chars = ((width * digit_width + 5.0) / digit_width * 256.0).floor() / 256.0;
    (chars * digit_width).round() as f32
}

/// Mutable state of one worksheet while its XML is streamed.
struct SheetBuilder<'a> {
    sheet: Sheet,
    sheet_name: &'a str,
    unknown_styles: HashSet<u32>,
}

impl<'a> SheetBuilder<'a> {
    fn new(info: &'a SheetInfo, digit_width: f64) -> Self {
        Self {
            sheet: Sheet {
                name: info.name.clone(),
                state: info.state,
                tab_color: None,
                row_count: 0,
                col_count: 0,
                rows: Vec::new(),
                cols: Vec::new(),
                default_row_height: DEFAULT_ROW_HEIGHT,
                default_col_width: default_col_chars_to_px(DEFAULT_COL_CHARS, digit_width),
                cells: BTreeMap::new(),
                merges: Vec::new(),
            },
            sheet_name: &info.name,
            unknown_styles: HashSet::new(),
        }
    }

    fn extend_extent(&mut self, last_row: u32, last_col: u32) {
        self.sheet.row_count = self.sheet.row_count.max(last_row.saturating_add(1)).min(MAX_ROWS);
        self.sheet.col_count = self.sheet.col_count.max(last_col.saturating_add(1)).min(MAX_COLS);
    }

    fn row_meta_mut(&mut self, row: u32) -> Option<&mut RowMeta> {
        let index = row as usize;
        if self.sheet.rows.len() <= index {
            self.sheet.rows.resize(index + 1, RowMeta::default());
        }
        self.sheet.rows.get_mut(index)
    }

    fn set_col_meta(&mut self, first: u32, last: u32, meta: ColMeta) {
        let end = last as usize + 1;
        if self.sheet.cols.len() < end {
            self.sheet.cols.resize(end, ColMeta::default());
        }
        for slot in self.sheet.cols.iter_mut().skip(first as usize).take(end - first as usize) {
            *slot = meta;
        }
    }

    /// Format for a cell's `s` attribute, falling back to the default format
    /// for indexes the stylesheet does not define.
    fn style(
        &mut self,
        styles: &ResolvedStyles,
        index: Option<u32>,
        diagnostics: &mut Diagnostics,
    ) -> (StyleRef, bool) {
        if let Some((format, is_date)) = styles.get(index) {
            return (format.clone(), is_date);
        }
        let index = index.unwrap_or(0);
        if self.unknown_styles.insert(index) {
            diagnostics.push(
                Some(self.sheet_name),
                None,
                format!("unknown style index {index}, using default format"),
            );
        }
        (styles.fallback().clone(), false)
    }

    fn add_merge(&mut self, merge: MergeRegion, diagnostics: &mut Diagnostics) {
        if merge.is_trivial() {
            return;
        }
        if let Some(existing) = self.sheet.merges.iter().find(|m| m.overlaps(&merge)) {
            diagnostics.push(
                Some(self.sheet_name),
                Some(merge.anchor()),
                format!(
                    "merge {}:{} overlaps {}:{}, dropped",
                    cell_name(merge.start_row, merge.start_col),
                    cell_name(merge.end_row, merge.end_col),
                    cell_name(existing.start_row, existing.start_col),
                    cell_name(existing.end_row, existing.end_col),
                ),
            );
            return;
        }
        self.extend_extent(merge.end_row, merge.end_col);
        self.sheet.merges.push(merge);
    }

    /// Drop every cell a merge covers except its anchor.
    fn drop_covered_cells(&mut self) {
        let mut covered = Vec::new();
        for merge in &self.sheet.merges {
            let anchor = (merge.start_row, merge.start_col);
            covered.extend(
                self.sheet
                    .cells
                    .range((merge.start_row, 0)..=(merge.end_row, u32::MAX))
                    .map(|(&key, _)| key)
                    .filter(|&(r, c)| merge.contains(r, c) && (r, c) != anchor),
            );
        }
        if !covered.is_empty() {
            tracing::debug!(
                sheet = self.sheet_name,
                dropped = covered.len(),
                "dropped values under merged cells"
            );
        }
        for key in covered {
            self.sheet.cells.remove(&key);
        }
    }

    fn finish(mut self) -> Sheet {
        self.drop_covered_cells();
        self.sheet
    }
}

/// Parse a single worksheet. The part is required: a missing file or broken
/// XML fails the whole parse.
#[allow(clippy::too_many_lines)]
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    ctx: &SheetContext<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;
    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut builder = SheetBuilder::new(info, ctx.digit_width);
    let mut buf = Vec::new();
    let mut inner_buf = Vec::new();
    let mut in_sheet_pr = false;
    let mut next_row: u32 = 0;
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut rows_seen: u32 = 0;

    loop {
        buf.clear();
        let event = xml.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let has_children = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"sheetPr" => in_sheet_pr = has_children,
                    b"tabColor" if in_sheet_pr => {
                        builder.sheet.tab_color = ctx.palette.resolve(&parse_color_attrs(e));
                    }
                    b"dimension" => {
                        if let Some((_, _, end_row, end_col)) =
                            attr_string(e, b"ref").as_deref().and_then(parse_cell_range)
                        {
                            builder.extend_extent(end_row, end_col);
                        }
                    }
                    b"sheetFormatPr" => {
                        if let Some(width) = attr_f64(e, b"defaultColWidth").filter(|w| *w >= 0.0) {
                            builder.sheet.default_col_width =
                                default_col_chars_to_px(width, ctx.digit_width);
                        } else if let Some(base) = attr_u32(e, b"baseColWidth") {
                            builder.sheet.default_col_width = default_col_chars_to_px(
                                f64::from(base) + (DEFAULT_COL_CHARS - 8.0),
                                ctx.digit_width,
                            );
                        }
                        if let Some(height) = attr_f64(e, b"defaultRowHeight").filter(|h| *h >= 0.0) {
                            builder.sheet.default_row_height = points_to_px(height);
                        }
                    }
                    b"col" => {
                        let first = attr_u32(e, b"min").unwrap_or(1).clamp(1, MAX_COLS);
                        let last = attr_u32(e, b"max").unwrap_or(first).clamp(first, MAX_COLS);
                        let meta = ColMeta {
                            width: attr_f64(e, b"width")
                                .filter(|w| *w >= 0.0)
                                .map(|w| col_chars_to_px(w, ctx.digit_width)),
                            hidden: attr_bool(e, b"hidden").unwrap_or(false),
                        };
                        builder.set_col_meta(first - 1, last - 1, meta);
                    }
                    b"row" => {
                        current_row = attr_u32(e, b"r")
                            .filter(|r| (1..=MAX_ROWS).contains(r))
                            .map_or(next_row, |r| r - 1);
                        next_row = current_row.saturating_add(1);
                        next_col = 0;

                        let height = attr_f64(e, b"ht").filter(|h| *h >= 0.0).map(points_to_px);
                        let hidden = attr_bool(e, b"hidden").unwrap_or(false);
                        if height.is_some() || hidden {
                            if let Some(meta) = builder.row_meta_mut(current_row) {
                                *meta = RowMeta { height, hidden };
                            }
                        }

                        rows_seen = rows_seen.wrapping_add(1);
                        if rows_seen % CANCEL_CHECK_ROWS == 0 {
                            ctx.cancel.check()?;
                        }
                    }
                    b"c" => {
                        let (row, col) = match attr_bytes(e, b"r") {
                            Some(r) => parse_cell_ref(&r).unwrap_or((current_row, next_col)),
                            None => (current_row, next_col),
                        };
                        next_col = col.saturating_add(1);
                        builder.extend_extent(row, col);

                        let raw = if has_children {
                            read_cell_contents(&mut xml, &mut inner_buf)?
                        } else {
                            None
                        };
                        let tag = parse_cell_type_tag(attr_bytes(e, b"t").as_deref());
                        let (format, is_date) = builder.style(ctx.styles, attr_u32(e, b"s"), diagnostics);

                        let addr = CellAddr::new(row, col);
                        let value = resolve_cell_value(
                            raw,
                            tag,
                            is_date,
                            ctx.shared_strings,
                            |message| diagnostics.push(Some(&info.name), Some(addr), message),
                        );

                        let cell = Cell::new(value, format);
                        if !cell.is_blank() {
                            builder.sheet.cells.insert((row, col), cell);
                        }
                    }
                    b"mergeCell" => {
                        if let Some((start_row, start_col, end_row, end_col)) =
                            attr_string(e, b"ref").as_deref().and_then(parse_cell_range)
                        {
                            builder.add_merge(
                                MergeRegion {
                                    start_row,
                                    start_col,
                                    end_row,
                                    end_col,
                                },
                                diagnostics,
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => {
                if e.local_name().as_ref() == b"sheetPr" {
                    in_sheet_pr = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

/// Read the children of a `<c>` element up to its end tag, returning the text
/// of `<v>` or the flattened text of `<is>`. Formulas (`<f>`) are skipped.
fn read_cell_contents<R: BufRead>(xml: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<Option<String>> {
    let mut value: Option<String> = None;
    let mut capture = false;
    let mut in_inline = false;
    let mut in_phonetic = false;

    loop {
        buf.clear();
        match xml.read_event_into(buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"v" => {
                    capture = true;
                    value.get_or_insert_with(String::new);
                }
                b"is" => {
                    in_inline = true;
                    value.get_or_insert_with(String::new);
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_inline && !in_phonetic => capture = true,
                _ => {}
            },
            Event::Text(ref e) if capture => {
                let text = e.unescape()?;
                value.get_or_insert_with(String::new).push_str(&text);
            }
            Event::CData(ref e) if capture => {
                value
                    .get_or_insert_with(String::new)
                    .push_str(&String::from_utf8_lossy(e));
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"c" => break,
                b"v" | b"t" => capture = false,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(value)
}

/// Turn the raw text of a cell into a typed value. Problems are reported
/// through `report` and degrade to text.
fn resolve_cell_value(
    raw: Option<String>,
    tag: CellTypeTag,
    is_date_format: bool,
    shared_strings: &[String],
    mut report: impl FnMut(String),
) -> CellValue {
    let Some(raw) = raw else {
        return CellValue::Empty;
    };

    match tag {
        CellTypeTag::Number => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && is_date_format => CellValue::Date(n),
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(raw),
        },
        CellTypeTag::Shared => {
            let text = raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| shared_strings.get(i));
            match text {
                Some(text) => CellValue::Text(text.clone()),
                None => {
                    report(format!("shared string index {raw} out of range"));
                    CellValue::Text(String::new())
                }
            }
        }
        CellTypeTag::Inline | CellTypeTag::Str | CellTypeTag::IsoDate => CellValue::Text(raw),
        CellTypeTag::Bool => match raw.trim() {
            "1" | "true" => CellValue::Boolean(true),
            "0" | "false" => CellValue::Boolean(false),
            _ => CellValue::Text(raw),
        },
        CellTypeTag::Error => CellValue::Error(raw),
        CellTypeTag::Unknown => {
            report("unknown cell type, shown as raw text".to_string());
            CellValue::Text(raw)
        }
    }
}
