use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;
use std::sync::Arc;

/// Resolved display format of a cell.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    /// Number format code (`General`, `0.00`, `yyyy-mm-dd`, ...)
    pub number_format: String,

    // Font
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,

    // Fill
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,

    // Borders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_top: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_right: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_bottom: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_left: Option<Border>,

    // Alignment
    pub align_h: HAlign,
    pub align_v: VAlign,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub wrap: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
}

impl Default for CellFormat {
    fn default() -> Self {
        Self {
            number_format: "General".to_string(),
            font_family: None,
            font_size: None,
            font_color: None,
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            fill_color: None,
            border_top: None,
            border_right: None,
            border_bottom: None,
            border_left: None,
            align_h: HAlign::General,
            align_v: VAlign::Bottom,
            wrap: false,
            indent: None,
        }
    }
}

impl CellFormat {
    /// True when an empty cell with this format still paints something.
    pub fn has_visible_decoration(&self) -> bool {
        self.fill_color.is_some()
            || self.border_top.is_some()
            || self.border_right.is_some()
            || self.border_bottom.is_some()
            || self.border_left.is_some()
    }
}

/// Shared handle to a resolved format; cells with the same style index share one.
#[derive(Debug, Clone, Default)]
pub struct StyleRef(pub Arc<CellFormat>);

impl StyleRef {
    pub fn new(format: CellFormat) -> Self {
        Self(Arc::new(format))
    }
}

impl PartialEq for StyleRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Deref for StyleRef {
    type Target = CellFormat;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Serialize for StyleRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StyleRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let format = CellFormat::deserialize(deserializer)?;
        Ok(Self(Arc::new(format)))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Border {
    pub style: BorderStyle,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderStyle {
    /// Map an OOXML `style` attribute; unknown styles degrade to `Thin`.
    pub fn from_ooxml(value: &str) -> Self {
        match value {
            "none" | "" => Self::None,
            "thin" => Self::Thin,
            "medium" => Self::Medium,
            "thick" => Self::Thick,
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            "double" => Self::Double,
            "hair" => Self::Hair,
            "mediumDashed" => Self::MediumDashed,
            "dashDot" => Self::DashDot,
            "mediumDashDot" => Self::MediumDashDot,
            "dashDotDot" => Self::DashDotDot,
            "mediumDashDotDot" => Self::MediumDashDotDot,
            "slantDashDot" => Self::SlantDashDot,
            _ => Self::Thin,
        }
    }

    /// Stroke width in layout units.
    pub fn width(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Hair => 0.5,
            Self::Thin | Self::Dashed | Self::Dotted | Self::DashDot | Self::DashDotDot => 1.0,
            Self::Medium
            | Self::MediumDashed
            | Self::MediumDashDot
            | Self::MediumDashDotDot
            | Self::SlantDashDot => 2.0,
            Self::Thick | Self::Double => 3.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HAlign {
    /// Text left, numbers right, booleans and errors centred.
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HAlign {
    pub fn from_ooxml(value: &str) -> Option<Self> {
        Some(match value {
            "general" => Self::General,
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "fill" => Self::Fill,
            "justify" => Self::Justify,
            "centerContinuous" => Self::CenterContinuous,
            "distributed" => Self::Distributed,
            _ => return None,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VAlign {
    Top,
    Center,
    #[default]
    Bottom,
    Justify,
    Distributed,
}

impl VAlign {
    pub fn from_ooxml(value: &str) -> Option<Self> {
        Some(match value {
            "top" => Self::Top,
            "center" => Self::Center,
            "bottom" => Self::Bottom,
            "justify" => Self::Justify,
            "distributed" => Self::Distributed,
            _ => return None,
        })
    }
}
