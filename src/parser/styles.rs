//! Parsing of xl/styles.xml and resolution of `cellXfs` into shared formats.
//!
//! Only the parts a preview can draw are read: number formats, fonts, pattern
//! fills, borders and alignment.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::color::{ColorSpec, Palette};
use crate::numfmt::{builtin_format, is_date_format};
use crate::types::{Border, BorderStyle, CellFormat, HAlign, StyleRef, VAlign};
use crate::xml_helpers::{attr_bool, attr_f64, attr_string, attr_u32, attr_val, parse_color_attrs};

use super::Diagnostics;

#[derive(Debug, Default, Clone)]
pub(super) struct RawFont {
    pub name: Option<String>,
    pub scheme: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub color: Option<ColorSpec>,
}

#[derive(Debug, Default, Clone)]
pub(super) struct RawBorderSide {
    pub style: BorderStyle,
    pub color: Option<ColorSpec>,
}

#[derive(Debug, Default, Clone)]
pub(super) struct RawBorder {
    pub left: RawBorderSide,
    pub right: RawBorderSide,
    pub top: RawBorderSide,
    pub bottom: RawBorderSide,
}

impl RawBorder {
    fn side_mut(&mut self, name: &[u8]) -> Option<&mut RawBorderSide> {
        match name {
            b"left" | b"start" => Some(&mut self.left),
            b"right" | b"end" => Some(&mut self.right),
            b"top" => Some(&mut self.top),
            b"bottom" => Some(&mut self.bottom),
            _ => None,
        }
    }
}

/// One `<xf>` of `cellXfs`.
#[derive(Debug, Default, Clone)]
pub(super) struct RawXf {
    pub num_fmt_id: u32,
    pub font_id: Option<u32>,
    pub fill_id: Option<u32>,
    pub border_id: Option<u32>,
    pub align_h: Option<HAlign>,
    pub align_v: Option<VAlign>,
    pub wrap: bool,
    pub indent: Option<u32>,
}

#[derive(Debug, Default)]
pub(super) struct StyleSheet {
    pub num_fmts: HashMap<u32, String>,
    pub fonts: Vec<RawFont>,
    /// Foreground color of each fill; `None` for `patternType="none"`.
    pub fills: Vec<Option<ColorSpec>>,
    pub borders: Vec<RawBorder>,
    pub cell_xfs: Vec<RawXf>,
    pub indexed_colors: Vec<String>,
}

/// Parse the stylesheet part. Missing styles mean every cell uses the default
/// format; a broken part keeps whatever was read before the error.
pub(super) fn parse_stylesheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> StyleSheet {
    let Ok(file) = archive.by_name(path.unwrap_or("xl/styles.xml")) else {
        return StyleSheet::default();
    };
    match parse_styles(BufReader::new(file)) {
        Ok(stylesheet) => stylesheet,
        Err((partial, e)) => {
            diagnostics.push(None, None, format!("styles truncated: {e}"));
            partial
        }
    }
}

#[allow(clippy::too_many_lines, clippy::result_large_err)]
fn parse_styles<R: BufRead>(reader: R) -> Result<StyleSheet, (StyleSheet, quick_xml::Error)> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut stylesheet = StyleSheet::default();
    let mut buf = Vec::new();

    let mut in_num_fmts = false;
    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_borders = false;
    let mut in_cell_xfs = false;
    let mut in_indexed_colors = false;
    let mut in_dxfs = false;

    let mut current_font: Option<RawFont> = None;
    let mut current_fill: Option<Option<ColorSpec>> = None;
    let mut fill_pattern: Option<String> = None;
    let mut current_border: Option<RawBorder> = None;
    let mut border_side: Option<Vec<u8>> = None;
    let mut current_xf: Option<RawXf> = None;

    loop {
        buf.clear();
        let event = match xml.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => return Err((stylesheet, e)),
        };
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();
                let name = name.as_ref();

                // Differential formats reuse font/fill/border element names.
                let name = if in_dxfs { &b""[..] } else { name };

                match name {
                    b"numFmts" => in_num_fmts = !is_empty,
                    b"fonts" => in_fonts = !is_empty,
                    b"fills" => in_fills = !is_empty,
                    b"borders" => in_borders = !is_empty,
                    b"cellXfs" => in_cell_xfs = !is_empty,
                    b"indexedColors" => in_indexed_colors = !is_empty,
                    b"dxfs" => in_dxfs = !is_empty,

                    b"numFmt" if in_num_fmts => {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            stylesheet.num_fmts.insert(id, code);
                        }
                    }

                    b"rgbColor" if in_indexed_colors => {
                        if let Some(rgb) = attr_string(e, b"rgb") {
                            let hex = rgb.get(rgb.len().saturating_sub(6)..).unwrap_or_default();
                            stylesheet.indexed_colors.push(format!("#{hex}"));
                        }
                    }

                    b"font" if in_fonts => {
                        let font = RawFont::default();
                        if is_empty {
                            stylesheet.fonts.push(font);
                        } else {
                            current_font = Some(font);
                        }
                    }
                    b"name" => {
                        if let Some(font) = current_font.as_mut() {
                            font.name = attr_val(e);
                        }
                    }
                    b"scheme" => {
                        if let Some(font) = current_font.as_mut() {
                            font.scheme = attr_val(e);
                        }
                    }
                    b"sz" => {
                        if let Some(font) = current_font.as_mut() {
                            font.size = attr_f64(e, b"val");
                        }
                    }
                    // <b/>, <i/> and <strike/> default to on; val="0" turns them off.
                    b"b" | b"i" | b"strike" => {
                        if let Some(font) = current_font.as_mut() {
                            let on = attr_bool(e, b"val").unwrap_or(true);
                            match name {
                                b"b" => font.bold = on,
                                b"i" => font.italic = on,
                                _ => font.strikethrough = on,
                            }
                        }
                    }
                    b"u" => {
                        if let Some(font) = current_font.as_mut() {
                            font.underline = attr_val(e).as_deref() != Some("none");
                        }
                    }
                    b"color" if current_font.is_some() => {
                        if let Some(font) = current_font.as_mut() {
                            font.color = Some(parse_color_attrs(e));
                        }
                    }

                    b"fill" if in_fills => {
                        if is_empty {
                            stylesheet.fills.push(None);
                        } else {
                            current_fill = Some(None);
                            fill_pattern = None;
                        }
                    }
                    b"patternFill" if current_fill.is_some() => {
                        fill_pattern = attr_string(e, b"patternType");
                    }
                    b"fgColor" => {
                        let drawn = fill_pattern.as_deref().is_some_and(|p| p != "none");
                        if let Some(fill) = current_fill.as_mut() {
                            if drawn {
                                *fill = Some(parse_color_attrs(e));
                            }
                        }
                    }

                    b"border" if in_borders => {
                        if is_empty {
                            stylesheet.borders.push(RawBorder::default());
                        } else {
                            current_border = Some(RawBorder::default());
                        }
                    }
                    b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom"
                        if current_border.is_some() =>
                    {
                        if let Some(side) = current_border.as_mut().and_then(|b| b.side_mut(name)) {
                            side.style = attr_string(e, b"style")
                                .map_or(BorderStyle::None, |s| BorderStyle::from_ooxml(&s));
                        }
                        border_side = (!is_empty).then(|| name.to_vec());
                    }
                    b"color" if current_border.is_some() => {
                        if let (Some(border), Some(side_name)) =
                            (current_border.as_mut(), border_side.as_deref())
                        {
                            if let Some(side) = border.side_mut(side_name) {
                                side.color = Some(parse_color_attrs(e));
                            }
                        }
                    }

                    b"xf" if in_cell_xfs => {
                        let xf = RawXf {
                            num_fmt_id: attr_u32(e, b"numFmtId").unwrap_or(0),
                            font_id: attr_u32(e, b"fontId"),
                            fill_id: attr_u32(e, b"fillId"),
                            border_id: attr_u32(e, b"borderId"),
                            ..RawXf::default()
                        };
                        if is_empty {
                            stylesheet.cell_xfs.push(xf);
                        } else {
                            current_xf = Some(xf);
                        }
                    }
                    b"alignment" => {
                        if let Some(xf) = current_xf.as_mut() {
                            xf.align_h = attr_string(e, b"horizontal")
                                .and_then(|h| HAlign::from_ooxml(&h));
                            xf.align_v = attr_string(e, b"vertical")
                                .and_then(|v| VAlign::from_ooxml(&v));
                            xf.wrap = attr_bool(e, b"wrapText").unwrap_or(false);
                            xf.indent = attr_u32(e, b"indent").filter(|&i| i > 0);
                        }
                    }

                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"numFmts" => in_num_fmts = false,
                b"fonts" => in_fonts = false,
                b"fills" => in_fills = false,
                b"borders" => in_borders = false,
                b"cellXfs" => in_cell_xfs = false,
                b"indexedColors" => in_indexed_colors = false,
                b"dxfs" => in_dxfs = false,
                b"font" => {
                    if let Some(font) = current_font.take() {
                        stylesheet.fonts.push(font);
                    }
                }
                b"fill" => {
                    if let Some(fill) = current_fill.take() {
                        stylesheet.fills.push(fill);
                    }
                }
                b"border" => {
                    if let Some(border) = current_border.take() {
                        stylesheet.borders.push(border);
                    }
                    border_side = None;
                }
                b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom" => {
                    border_side = None;
                }
                b"xf" => {
                    if let Some(xf) = current_xf.take() {
                        stylesheet.cell_xfs.push(xf);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(stylesheet)
}

/// `cellXfs` resolved against the workbook palette, one shared format per index.
#[derive(Debug)]
pub(super) struct ResolvedStyles {
    formats: Vec<StyleRef>,
    date_formats: Vec<bool>,
    fallback: StyleRef,
    default_font: String,
}

impl ResolvedStyles {
    pub(super) fn resolve(stylesheet: &StyleSheet, palette: &Palette, minor_font: Option<&str>) -> Self {
        let formats: Vec<StyleRef> = stylesheet
            .cell_xfs
            .iter()
            .map(|xf| StyleRef::new(resolve_xf(xf, stylesheet, palette, minor_font)))
            .collect();
        let date_formats = formats
            .iter()
            .map(|f| is_date_format(&f.number_format))
            .collect();
        let fallback = formats.first().cloned().unwrap_or_default();
        let default_font = stylesheet
            .fonts
            .first()
            .and_then(|font| font_family(font, minor_font))
            .unwrap_or("Calibri")
            .to_string();

        Self {
            formats,
            date_formats,
            fallback,
            default_font,
        }
    }

    /// Format for a cell's `s` attribute. A missing attribute means xf 0.
    /// Returns `None` for an index the stylesheet does not define.
    pub(super) fn get(&self, index: Option<u32>) -> Option<(&StyleRef, bool)> {
        let index = index.unwrap_or(0) as usize;
        match (self.formats.get(index), self.date_formats.get(index)) {
            (Some(format), Some(&is_date)) => Some((format, is_date)),
            _ if index == 0 => Some((&self.fallback, false)),
            _ => None,
        }
    }

    pub(super) fn fallback(&self) -> &StyleRef {
        &self.fallback
    }

    pub(super) fn default_font_name(&self) -> &str {
        &self.default_font
    }

    pub(super) fn len(&self) -> usize {
        self.formats.len()
    }
}

fn font_family<'a>(font: &'a RawFont, minor_font: Option<&'a str>) -> Option<&'a str> {
    match font.scheme.as_deref() {
        Some("minor") => minor_font.or(font.name.as_deref()),
        _ => font.name.as_deref(),
    }
}

fn resolve_xf(xf: &RawXf, stylesheet: &StyleSheet, palette: &Palette, minor_font: Option<&str>) -> CellFormat {
    let number_format = stylesheet
        .num_fmts
        .get(&xf.num_fmt_id)
        .map(String::as_str)
        .or_else(|| builtin_format(xf.num_fmt_id))
        .unwrap_or("General")
        .to_string();

    let mut format = CellFormat {
        number_format,
        ..CellFormat::default()
    };

    if let Some(font) = stylesheet.fonts.get(xf.font_id.unwrap_or(0) as usize) {
        format.font_family = font_family(font, minor_font).map(ToString::to_string);
        format.font_size = font.size;
        format.bold = font.bold;
        format.italic = font.italic;
        format.underline = font.underline;
        format.strikethrough = font.strikethrough;
        format.font_color = font.color.as_ref().and_then(|c| palette.resolve(c));
    }

    if let Some(Some(fill)) = xf.fill_id.and_then(|id| stylesheet.fills.get(id as usize)) {
        format.fill_color = palette.resolve(fill);
    }

    if let Some(border) = xf.border_id.and_then(|id| stylesheet.borders.get(id as usize)) {
        let side = |side: &RawBorderSide| {
            (side.style != BorderStyle::None).then(|| Border {
                style: side.style,
                color: side
                    .color
                    .as_ref()
                    .and_then(|c| palette.resolve(c))
                    .unwrap_or_else(|| "#000000".to_string()),
            })
        };
        format.border_top = side(&border.top);
        format.border_right = side(&border.right);
        format.border_bottom = side(&border.bottom);
        format.border_left = side(&border.left);
    }

    if let Some(h) = xf.align_h {
        format.align_h = h;
    }
    if let Some(v) = xf.align_v {
        format.align_v = v;
    }
    format.wrap = xf.wrap;
    format.indent = xf.indent;

    format
}
