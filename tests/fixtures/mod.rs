//! Test fixtures for generating valid XLSX files in memory.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, StyleBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Data")
//!             .cell("A1", "Total", Some(StyleBuilder::new().bold()))
//!             .cell("C2", 42.0, None)
//!             .merge("A1:B2"),
//!     )
//!     .build();
//!
//! let workbook = xlpreview::parse(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Style Builder
// ============================================================================

/// A cell format, written as one `cellXfs` entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    pub bold: bool,
    pub italic: bool,
    pub font_color: Option<String>,
    pub bg_color: Option<String>,
    pub border: Option<String>,
    pub number_format: Option<String>,
    pub align_horizontal: Option<String>,
    pub wrap_text: bool,
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Font color as ARGB, e.g. `FFFF0000`.
    #[must_use]
    pub fn font_color(mut self, argb: &str) -> Self {
        self.font_color = Some(argb.to_string());
        self
    }

    /// Solid fill as ARGB.
    #[must_use]
    pub fn bg_color(mut self, argb: &str) -> Self {
        self.bg_color = Some(argb.to_string());
        self
    }

    /// Same border style on all four sides.
    #[must_use]
    pub fn border_all(mut self, style: &str) -> Self {
        self.border = Some(style.to_string());
        self
    }

    #[must_use]
    pub fn number_format(mut self, code: &str) -> Self {
        self.number_format = Some(code.to_string());
        self
    }

    #[must_use]
    pub fn align_horizontal(mut self, align: &str) -> Self {
        self.align_horizontal = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn wrap_text(mut self) -> Self {
        self.wrap_text = true;
        self
    }
}

// ============================================================================
// Cell Value
// ============================================================================

/// Represents a cell value that can be added to a sheet.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Shared string
    String(String),
    Number(f64),
    Boolean(bool),
    /// Error literal such as `#DIV/0!`
    Error(String),
    InlineString(String),
    /// Style only
    Empty,
    /// Cell written verbatim: `(type attribute, inner XML)`
    Raw(Option<String>, String),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<StyleBuilder>,
    /// Explicit `s` attribute, bypassing the style table
    pub raw_style: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: f64,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct RowHeight {
    pub row: u32,
    pub height: Option<f64>,
    pub hidden: bool,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub state: Option<String>,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<ColumnWidth>,
    pub row_heights: Vec<RowHeight>,
    pub dimension: Option<String>,
    pub default_row_height: Option<f64>,
    pub default_col_width: Option<f64>,
    /// Replaces the generated worksheet XML entirely
    pub raw_xml: Option<String>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// `hidden` or `veryHidden`.
    #[must_use]
    pub fn state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    #[must_use]
    pub fn cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
            raw_style: None,
        });
        self
    }

    #[must_use]
    pub fn styled_cell(self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cell(cell_ref, CellValue::Empty, Some(style))
    }

    /// Cell with an explicit `s` index, valid or not.
    #[must_use]
    pub fn cell_with_style_index<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        index: u32,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style: None,
            raw_style: Some(index),
        });
        self
    }

    /// Add a merge range (e.g., "A1:B2").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    /// Column width in characters for 1-based columns `min..=max`.
    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width,
            hidden: false,
        });
        self
    }

    #[must_use]
    pub fn hide_cols(mut self, min: u32, max: u32) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width: 8.43,
            hidden: true,
        });
        self
    }

    /// Row height in points for a 1-based row.
    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push(RowHeight {
            row,
            height: Some(height),
            hidden: false,
        });
        self
    }

    #[must_use]
    pub fn hide_row(mut self, row: u32) -> Self {
        self.row_heights.push(RowHeight {
            row,
            height: None,
            hidden: true,
        });
        self
    }

    #[must_use]
    pub fn dimension(mut self, range: &str) -> Self {
        self.dimension = Some(range.to_string());
        self
    }

    /// `sheetFormatPr` defaults: row height in points, column width in characters.
    #[must_use]
    pub fn defaults(mut self, row_height: Option<f64>, col_width: Option<f64>) -> Self {
        self.default_row_height = row_height;
        self.default_col_width = col_width;
        self
    }

    #[must_use]
    pub fn raw_xml(mut self, xml: &str) -> Self {
        self.raw_xml = Some(xml.to_string());
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    date1904: bool,
    without_styles: bool,
    without_shared_strings: bool,
    without_workbook_rels: bool,
    extra_parts: Vec<(String, String)>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    #[must_use]
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Leave out `xl/styles.xml`.
    #[must_use]
    pub fn without_styles(mut self) -> Self {
        self.without_styles = true;
        self
    }

    /// Leave out `xl/sharedStrings.xml` even if shared strings are referenced.
    #[must_use]
    pub fn without_shared_strings(mut self) -> Self {
        self.without_shared_strings = true;
        self
    }

    /// Leave out `xl/_rels/workbook.xml.rels`.
    #[must_use]
    pub fn without_workbook_rels(mut self) -> Self {
        self.without_workbook_rels = true;
        self
    }

    /// Add or replace an arbitrary part.
    #[must_use]
    pub fn part(mut self, path: &str, content: &str) -> Self {
        self.extra_parts.push((path.to_string(), content.to_string()));
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut styles = StylesCollector::default();
        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Some(style) = &cell.style {
                    styles.add_style(style);
                }
                if let CellValue::String(s) = &cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut parts: Vec<(String, String)> = vec![
            (
                "[Content_Types].xml".to_string(),
                generate_content_types(self.sheets.len()),
            ),
            ("_rels/.rels".to_string(), generate_rels()),
            ("xl/workbook.xml".to_string(), generate_workbook(&self.sheets, self.date1904)),
        ];
        if !self.without_workbook_rels {
            parts.push((
                "xl/_rels/workbook.xml.rels".to_string(),
                generate_workbook_rels(self.sheets.len()),
            ));
        }
        if !self.without_styles {
            parts.push(("xl/styles.xml".to_string(), styles.generate_styles_xml()));
        }
        if !self.without_shared_strings && !shared_strings.is_empty() {
            parts.push((
                "xl/sharedStrings.xml".to_string(),
                generate_shared_strings(&shared_strings),
            ));
        }
        for (i, sheet) in self.sheets.iter().enumerate() {
            let xml = sheet
                .raw_xml
                .clone()
                .unwrap_or_else(|| generate_sheet_xml(sheet, &shared_strings, &styles));
            parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), xml));
        }
        for (path, content) in self.extra_parts {
            parts.retain(|(p, _)| *p != path);
            parts.push((path, content));
        }

        for (path, content) in parts {
            zip.start_file(path, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// Styles Collector
// ============================================================================

/// Collects styles; index 0 of every table is the default.
#[derive(Debug, Default)]
struct StylesCollector {
    styles: Vec<StyleBuilder>,
    num_fmts: Vec<(u32, String)>,
}

impl StylesCollector {
    fn add_style(&mut self, style: &StyleBuilder) -> u32 {
        if let Some(index) = self.style_index(style) {
            return index;
        }
        if let Some(code) = &style.number_format {
            if builtin_format_id(code).is_none() && !self.num_fmts.iter().any(|(_, c)| c == code) {
                let id = 164 + self.num_fmts.len() as u32;
                self.num_fmts.push((id, code.clone()));
            }
        }
        self.styles.push(style.clone());
        self.styles.len() as u32
    }

    fn style_index(&self, style: &StyleBuilder) -> Option<u32> {
        self.styles
            .iter()
            .position(|s| s == style)
            .map(|i| i as u32 + 1)
    }

    fn num_fmt_id(&self, code: &str) -> u32 {
        builtin_format_id(code)
            .or_else(|| {
                self.num_fmts
                    .iter()
                    .find(|(_, c)| c == code)
                    .map(|(id, _)| *id)
            })
            .unwrap_or(0)
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.num_fmts.is_empty() {
            write!(xml, r#"<numFmts count="{}">"#, self.num_fmts.len()).unwrap();
            for (id, code) in &self.num_fmts {
                write!(
                    xml,
                    r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#,
                    escape_xml(code)
                )
                .unwrap();
            }
            xml.push_str("</numFmts>");
        }

        // One font, fill and border per style, after the defaults.
        write!(xml, r#"<fonts count="{}">"#, self.styles.len() + 1).unwrap();
        xml.push_str(r#"<font><sz val="11"/><name val="Calibri"/></font>"#);
        for style in &self.styles {
            xml.push_str("<font>");
            if style.bold {
                xml.push_str("<b/>");
            }
            if style.italic {
                xml.push_str("<i/>");
            }
            xml.push_str(r#"<sz val="11"/>"#);
            if let Some(color) = &style.font_color {
                write!(xml, r#"<color rgb="{color}"/>"#).unwrap();
            }
            xml.push_str(r#"<name val="Calibri"/></font>"#);
        }
        xml.push_str("</fonts>");

        write!(xml, r#"<fills count="{}">"#, self.styles.len() + 2).unwrap();
        xml.push_str(r#"<fill><patternFill patternType="none"/></fill>"#);
        xml.push_str(r#"<fill><patternFill patternType="gray125"/></fill>"#);
        for style in &self.styles {
            match &style.bg_color {
                Some(color) => write!(
                    xml,
                    r#"<fill><patternFill patternType="solid"><fgColor rgb="{color}"/></patternFill></fill>"#
                )
                .unwrap(),
                None => xml.push_str(r#"<fill><patternFill patternType="none"/></fill>"#),
            }
        }
        xml.push_str("</fills>");

        write!(xml, r#"<borders count="{}">"#, self.styles.len() + 1).unwrap();
        xml.push_str("<border><left/><right/><top/><bottom/><diagonal/></border>");
        for style in &self.styles {
            match &style.border {
                Some(kind) => {
                    xml.push_str("<border>");
                    for side in ["left", "right", "top", "bottom"] {
                        write!(
                            xml,
                            r#"<{side} style="{kind}"><color rgb="FF000000"/></{side}>"#
                        )
                        .unwrap();
                    }
                    xml.push_str("<diagonal/></border>");
                }
                None => xml.push_str("<border><left/><right/><top/><bottom/><diagonal/></border>"),
            }
        }
        xml.push_str("</borders>");

        write!(xml, r#"<cellXfs count="{}">"#, self.styles.len() + 1).unwrap();
        xml.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#);
        for (i, style) in self.styles.iter().enumerate() {
            let index = i + 1;
            let num_fmt = style
                .number_format
                .as_deref()
                .map_or(0, |code| self.num_fmt_id(code));
            write!(
                xml,
                r#"<xf numFmtId="{num_fmt}" fontId="{index}" fillId="{}" borderId="{index}" xfId="0""#,
                index + 1
            )
            .unwrap();
            if style.align_horizontal.is_some() || style.wrap_text {
                xml.push_str(r#" applyAlignment="1"><alignment"#);
                if let Some(h) = &style.align_horizontal {
                    write!(xml, r#" horizontal="{h}""#).unwrap();
                }
                if style.wrap_text {
                    xml.push_str(r#" wrapText="1""#);
                }
                xml.push_str("/></xf>");
            } else {
                xml.push_str("/>");
            }
        }
        xml.push_str("</cellXfs>");
        xml.push_str("</styleSheet>");
        xml
    }
}

fn builtin_format_id(code: &str) -> Option<u32> {
    match code {
        "General" => Some(0),
        "0" => Some(1),
        "0.00" => Some(2),
        "#,##0" => Some(3),
        "#,##0.00" => Some(4),
        "0%" => Some(9),
        "0.00%" => Some(10),
        "mm-dd-yy" => Some(14),
        "d-mmm-yy" => Some(15),
        "h:mm" => Some(20),
        _ => None,
    }
}

// ============================================================================
// Part generators
// ============================================================================

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Split "AB12" into (letters, 1-based row).
fn split_ref(cell_ref: &str) -> (&str, u32) {
    let idx = cell_ref
        .find(|c: char| c.is_ascii_digit())
        .expect("cell reference has a row number");
    (&cell_ref[..idx], cell_ref[idx..].parse().expect("row number"))
}

fn col_index(letters: &str) -> u32 {
    letters
        .bytes()
        .fold(0, |acc, b| acc * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1))
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for i in 1..=sheet_count {
        write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        )
        .unwrap();
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
        .to_string()
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        write!(
            xml,
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        )
        .unwrap();
    }
    write!(
        xml,
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    )
    .unwrap();
    write!(
        xml,
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 2
    )
    .unwrap();
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder], date1904: bool) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    if date1904 {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        write!(
            xml,
            r#"<sheet name="{}" sheetId="{}""#,
            escape_xml(&sheet.name),
            i + 1
        )
        .unwrap();
        if let Some(state) = &sheet.state {
            write!(xml, r#" state="{state}""#).unwrap();
        }
        write!(xml, r#" r:id="rId{}"/>"#, i + 1).unwrap();
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    write!(
        xml,
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    )
    .unwrap();
    for s in strings {
        write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(s)).unwrap();
    }
    xml.push_str("</sst>");
    xml
}

fn generate_sheet_xml(
    sheet: &SheetBuilder,
    shared_strings: &[String],
    styles: &StylesCollector,
) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    if let Some(dimension) = &sheet.dimension {
        write!(xml, r#"<dimension ref="{dimension}"/>"#).unwrap();
    }

    if sheet.default_row_height.is_some() || sheet.default_col_width.is_some() {
        xml.push_str("<sheetFormatPr");
        if let Some(width) = sheet.default_col_width {
            write!(xml, r#" defaultColWidth="{width}""#).unwrap();
        }
        write!(
            xml,
            r#" defaultRowHeight="{}""#,
            sheet.default_row_height.unwrap_or(15.0)
        )
        .unwrap();
        xml.push_str("/>");
    }

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for col in &sheet.col_widths {
            write!(
                xml,
                r#"<col min="{}" max="{}" width="{}" customWidth="1""#,
                col.min, col.max, col.width
            )
            .unwrap();
            if col.hidden {
                xml.push_str(r#" hidden="1""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</cols>");
    }

    // Rows in ascending order, cells within a row in column order.
    let mut rows: Vec<u32> = sheet
        .cells
        .iter()
        .map(|c| split_ref(&c.cell_ref).1)
        .chain(sheet.row_heights.iter().map(|r| r.row))
        .collect();
    rows.sort_unstable();
    rows.dedup();

    xml.push_str("<sheetData>");
    for row in rows {
        write!(xml, r#"<row r="{row}""#).unwrap();
        for meta in sheet.row_heights.iter().filter(|r| r.row == row) {
            if let Some(height) = meta.height {
                write!(xml, r#" ht="{height}" customHeight="1""#).unwrap();
            }
            if meta.hidden {
                xml.push_str(r#" hidden="1""#);
            }
        }
        xml.push('>');

        let mut cells: Vec<&CellEntry> = sheet
            .cells
            .iter()
            .filter(|c| split_ref(&c.cell_ref).1 == row)
            .collect();
        cells.sort_by_key(|c| col_index(split_ref(&c.cell_ref).0));

        for cell in cells {
            write!(xml, r#"<c r="{}""#, cell.cell_ref).unwrap();
            let style_index = cell
                .raw_style
                .or_else(|| cell.style.as_ref().and_then(|s| styles.style_index(s)));
            if let Some(index) = style_index {
                write!(xml, r#" s="{index}""#).unwrap();
            }
            match &cell.value {
                CellValue::String(s) => {
                    let index = shared_strings.iter().position(|x| x == s).unwrap();
                    write!(xml, r#" t="s"><v>{index}</v></c>"#).unwrap();
                }
                CellValue::Number(n) => write!(xml, "><v>{n}</v></c>").unwrap(),
                CellValue::Boolean(b) => {
                    write!(xml, r#" t="b"><v>{}</v></c>"#, u8::from(*b)).unwrap();
                }
                CellValue::Error(e) => {
                    write!(xml, r#" t="e"><v>{}</v></c>"#, escape_xml(e)).unwrap();
                }
                CellValue::InlineString(s) => {
                    write!(xml, r#" t="inlineStr"><is><t>{}</t></is></c>"#, escape_xml(s)).unwrap();
                }
                CellValue::Empty => xml.push_str("/>"),
                CellValue::Raw(tag, inner) => {
                    if let Some(tag) = tag {
                        write!(xml, r#" t="{tag}""#).unwrap();
                    }
                    write!(xml, ">{inner}</c>").unwrap();
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        write!(xml, r#"<mergeCells count="{}">"#, sheet.merges.len()).unwrap();
        for range in &sheet.merges {
            write!(xml, r#"<mergeCell ref="{range}"/>"#).unwrap();
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Convenience Functions
// ============================================================================

/// One sheet, one text cell.
pub fn xlsx_with_text(text: &str) -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(SheetBuilder::new("Sheet1").cell("A1", text, None))
        .build()
}

/// Two sheets; the first has "Total" merged over A1:B2.
pub fn two_sheet_merged_total() -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Summary")
                .cell("A1", "Total", None)
                .merge("A1:B2"),
        )
        .sheet(SheetBuilder::new("Detail").cell("A1", 1.0, None).cell("C40", 2.0, None))
        .build()
}

/// A sheet with `rows` x `cols` numeric cells.
pub fn dense_grid(rows: u32, cols: u32) -> Vec<u8> {
    let mut sheet = SheetBuilder::new("Grid");
    for r in 1..=rows {
        for c in 0..cols {
            let cell_ref = format!("{}{r}", col_letters(c));
            sheet = sheet.cell(&cell_ref, f64::from(r * 1000 + c), None);
        }
    }
    XlsxBuilder::new().sheet(sheet).build()
}

/// 0-based column index to letters.
pub fn col_letters(col: u32) -> String {
    let mut name = String::new();
    let mut n = col + 1;
    while n > 0 {
        n -= 1;
        name.insert(0, char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    name
}
