//! Color resolution for style and sheet-tab colors.
//!
//! OOXML colors arrive as ARGB hex, a theme slot with optional tint, an index
//! into the legacy palette, or `auto`. Everything resolves to `#RRGGBB`.

/// Excel's 64 indexed colors (legacy palette)
pub const INDEXED_COLORS: [&str; 64] = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#800000", "#008000", "#000080", "#808000", "#800080", "#008080", "#C0C0C0", "#808080",
    "#9999FF", "#993366", "#FFFFCC", "#CCFFFF", "#660066", "#FF8080", "#0066CC", "#CCCCFF",
    "#000080", "#FF00FF", "#FFFF00", "#00FFFF", "#800080", "#800000", "#008080", "#0000FF",
    "#00CCFF", "#CCFFFF", "#CCFFCC", "#FFFF99", "#99CCFF", "#FF99CC", "#CC99FF", "#FFCC99",
    "#3366FF", "#33CCCC", "#99CC00", "#FFCC00", "#FF9900", "#FF6600", "#666699", "#969696",
    "#003366", "#339966", "#003300", "#333300", "#993300", "#993366", "#333399", "#333333",
];

/// Office theme colors in style-reference order (lt1, dk1, lt2, dk2,
/// accent1-6, hlink, folHlink).
pub const DEFAULT_THEME_COLORS: [&str; 12] = [
    "#FFFFFF", "#000000", "#E7E6E6", "#44546A", "#4472C4", "#ED7D31", "#A5A5A5", "#FFC000",
    "#5B9BD5", "#70AD47", "#0563C1", "#954F72",
];

/// Raw color attributes of a `<color>`, `<fgColor>` or `<tabColor>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorSpec {
    pub rgb: Option<String>,
    pub theme: Option<u32>,
    pub tint: Option<f64>,
    pub indexed: Option<u32>,
    pub auto: bool,
}

/// Theme and indexed palettes of one workbook.
#[derive(Debug, Clone)]
pub struct Palette {
    pub theme: Vec<String>,
    pub indexed: Option<Vec<String>>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME_COLORS.iter().map(ToString::to_string).collect(),
            indexed: None,
        }
    }
}

impl Palette {
    /// Resolve a color spec to `#RRGGBB`. Priority: rgb > theme > indexed > auto.
    pub fn resolve(&self, color: &ColorSpec) -> Option<String> {
        if let Some(rgb) = &color.rgb {
            let hex = rgb.trim_start_matches('#');
            let hex = if hex.len() == 8 { hex.get(2..)? } else { hex };
            return Rgb::from_hex(hex).map(|c| c.to_hex());
        }

        if let Some(slot) = color.theme {
            let base = self
                .theme
                .get(slot as usize)
                .map(String::as_str)
                .or_else(|| DEFAULT_THEME_COLORS.get(slot as usize).copied())?;
            let base = Rgb::from_hex(base)?;
            return Some(match color.tint {
                Some(tint) if tint.abs() > f64::EPSILON => base.tinted(tint).to_hex(),
                _ => base.to_hex(),
            });
        }

        if let Some(index) = color.indexed {
            // 64 = system foreground, 65 = system background
            match index {
                64 => return Some("#000000".to_string()),
                65 => return Some("#FFFFFF".to_string()),
                _ => {}
            }
            let custom = self
                .indexed
                .as_ref()
                .and_then(|p| p.get(index as usize))
                .cloned();
            return custom.or_else(|| INDEXED_COLORS.get(index as usize).map(|c| (*c).to_string()));
        }

        color.auto.then(|| "#000000".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

impl Rgb {
    fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| hex.get(range).and_then(|s| u8::from_str_radix(s, 16).ok());
        Some(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Lighten (tint > 0) or darken (tint < 0) in HSL space, as Excel does.
    #[allow(clippy::many_single_char_names)]
    fn tinted(self, tint: f64) -> Self {
        let (h, s, l) = self.to_hsl();
        let l = if tint < 0.0 {
            l * (1.0 + tint)
        } else {
            l + (1.0 - l) * tint
        };
        Self::from_hsl(h, s, l.clamp(0.0, 1.0))
    }

    #[allow(clippy::many_single_char_names)]
    fn to_hsl(self) -> (f64, f64, f64) {
        let r = f64::from(self.0) / 255.0;
        let g = f64::from(self.1) / 255.0;
        let b = f64::from(self.2) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;
        if d < f64::EPSILON {
            return (0.0, 0.0, l);
        }
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if (max - r).abs() < f64::EPSILON {
            ((g - b) / d).rem_euclid(6.0)
        } else if (max - g).abs() < f64::EPSILON {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        (h / 6.0, s, l)
    }

    #[allow(
        clippy::many_single_char_names,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if s < f64::EPSILON {
            return Self(to_u8(l), to_u8(l), to_u8(l));
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let hue = |t: f64| {
            let t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };
        Self(
            to_u8(hue(h + 1.0 / 3.0)),
            to_u8(hue(h)),
            to_u8(hue(h - 1.0 / 3.0)),
        )
    }
}
