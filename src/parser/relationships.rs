//! Package-level parts: workbook relationships, sheet list, theme, shared strings.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::color::DEFAULT_THEME_COLORS;
use crate::error::Result;
use crate::types::SheetState;
use crate::xml_helpers::{attr_bool, attr_string, attr_string_local, attr_val};

use super::worksheet::SheetInfo;
use super::WORKBOOK_PART;

/// Paths of the parts referenced from `xl/_rels/workbook.xml.rels`, resolved
/// to full archive paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// rId -> worksheet path, e.g. "rId1" -> "xl/worksheets/sheet1.xml"
    pub worksheets: HashMap<String, String>,
    pub shared_strings: Option<String>,
    pub styles: Option<String>,
    pub theme: Option<String>,
}

/// Theme colors and the body (minor) font.
#[derive(Debug)]
pub(super) struct Theme {
    pub colors: Vec<String>,
    pub minor_font: Option<String>,
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

/// Parse workbook relationships. The part is optional; a missing or broken
/// one yields the conventional default paths.
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookRelationships {
    let mut rels = WorkbookRelationships::default();

    let Ok(file) = archive.by_name("xl/_rels/workbook.xml.rels") else {
        return rels;
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_string(e, b"Id").unwrap_or_default();
                let target = attr_string(e, b"Target").unwrap_or_default();
                let rel_type = attr_string(e, b"Type").unwrap_or_default();
                let full_path = resolve_target(&target);

                match rel_type.rsplit('/').next() {
                    _ if target.is_empty() => {}
                    Some("worksheet") if !id.is_empty() => {
                        rels.worksheets.insert(id, full_path);
                    }
                    Some("sharedStrings") => rels.shared_strings = Some(full_path),
                    Some("styles") => rels.styles = Some(full_path),
                    Some("theme") => rels.theme = Some(full_path),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable workbook relationships, using defaults");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Read the sheet list (in declaration order) and the `date1904` flag from
/// `xl/workbook.xml`. This part is required: XML errors are fatal.
pub(super) fn get_sheet_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<(Vec<SheetInfo>, bool)> {
    let file = archive.by_name(WORKBOOK_PART)?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);

    let mut sheets = Vec::new();
    let mut date1904 = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    date1904 = attr_bool(e, b"date1904").unwrap_or(false);
                }
                b"sheet" => {
                    if let Some(name) = attr_string(e, b"name") {
                        let state = match attr_string(e, b"state").as_deref() {
                            Some("hidden") => SheetState::Hidden,
                            Some("veryHidden") => SheetState::VeryHidden,
                            _ => SheetState::Visible,
                        };
                        let r_id = attr_string_local(e, b"id").unwrap_or_default();
                        let path = relationships.get(&r_id).cloned().unwrap_or_else(|| {
                            format!("xl/worksheets/sheet{}.xml", sheets.len() + 1)
                        });
                        sheets.push(SheetInfo { name, path, state });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, date1904))
}

/// Parse theme colors and the minor font. Optional: falls back to the Office
/// defaults.
pub(super) fn parse_theme<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Theme {
    let mut theme = Theme {
        colors: DEFAULT_THEME_COLORS.iter().map(ToString::to_string).collect(),
        minor_font: None,
    };

    let Ok(file) = archive.by_name(path.unwrap_or("xl/theme/theme1.xml")) else {
        return theme;
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);
    let mut buf = Vec::new();

    // clrScheme child -> theme index used by styles (dk/lt pairs swap places)
    const SCHEME_SLOTS: [(&[u8], usize); 12] = [
        (b"dk1", 1),
        (b"lt1", 0),
        (b"dk2", 3),
        (b"lt2", 2),
        (b"accent1", 4),
        (b"accent2", 5),
        (b"accent3", 6),
        (b"accent4", 7),
        (b"accent5", 8),
        (b"accent6", 9),
        (b"hlink", 10),
        (b"folHlink", 11),
    ];

    let mut in_clr_scheme = false;
    let mut in_minor_font = false;
    let mut slot: Option<usize> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                match name {
                    b"clrScheme" => in_clr_scheme = true,
                    b"minorFont" => in_minor_font = true,
                    b"srgbClr" | b"sysClr" if in_clr_scheme => {
                        let value = if name == b"srgbClr" {
                            attr_val(e)
                        } else {
                            attr_string(e, b"lastClr")
                        };
                        if let (Some(index), Some(value)) = (slot, value) {
                            if value.len() == 6 {
                                if let Some(color) = theme.colors.get_mut(index) {
                                    *color = format!("#{}", value.to_ascii_uppercase());
                                }
                            }
                        }
                    }
                    b"latin" if in_minor_font && theme.minor_font.is_none() => {
                        theme.minor_font = attr_string(e, b"typeface").filter(|t| !t.is_empty());
                    }
                    _ if in_clr_scheme => {
                        if let Some(&(_, index)) = SCHEME_SLOTS.iter().find(|(n, _)| *n == name) {
                            slot = Some(index);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"clrScheme" => in_clr_scheme = false,
                b"minorFont" => in_minor_font = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable theme, using default colors");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    theme
}

/// Parse the shared string table. Rich-text runs are flattened; phonetic
/// guides (`rPh`) are skipped. Optional part.
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    let Ok(file) = archive.by_name(path.unwrap_or("xl/sharedStrings.xml")) else {
        return Vec::new();
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_rph = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_rph = true,
                b"t" if in_si && !in_rph => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(ref e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) if in_t => {
                current.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                b"rPh" => in_rph = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(error = %e, parsed = strings.len(), "shared strings truncated");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    strings
}
