//! Host-facing tuning knobs for a preview session.
//!
//! All fields have defaults, so a host can pass an empty TOML document (or
//! nothing at all) and only override what it cares about:
//!
//! ```toml
//! min_zoom = 0.5
//! max_zoom = 3.0
//! fling_velocity = 0.8
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating a [`PreviewConfig`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The document is not valid TOML or has unknown keys.
    #[error("Invalid TOML: {0}")]
    Parse(String),

    /// A value is outside the range the engine can work with.
    #[error("{field} is out of range: {value}")]
    OutOfRange {
        /// Offending field name.
        field: &'static str,
        /// Value that was rejected.
        value: f64,
    },

    /// `min_zoom` is greater than `max_zoom`.
    #[error("min_zoom ({min}) is greater than max_zoom ({max})")]
    ZoomBounds {
        /// Configured minimum.
        min: f32,
        /// Configured maximum.
        max: f32,
    },
}

/// Default lower zoom bound: a typical sheet fits a phone screen.
pub const DEFAULT_MIN_ZOOM: f32 = 0.25;
/// Default upper zoom bound: one cell's text is comfortably readable.
pub const DEFAULT_MAX_ZOOM: f32 = 4.0;
/// Default pan dead zone in screen pixels.
pub const DEFAULT_PAN_DEAD_ZONE: f32 = 8.0;
/// Default fling threshold in screen pixels per millisecond.
pub const DEFAULT_FLING_VELOCITY: f32 = 0.6;

/// Tuning for gesture handling and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Smallest allowed zoom scale.
    pub min_zoom: f32,
    /// Largest allowed zoom scale.
    pub max_zoom: f32,
    /// Zoom applied after `load` and on sheet change.
    pub default_zoom: f32,
    /// Extra rows/columns rendered beyond each viewport edge.
    pub overscan: u32,
    /// Distance a contact must travel before a press becomes a pan.
    pub pan_dead_zone: f32,
    /// Horizontal release velocity that turns a pan into a sheet switch.
    pub fling_velocity: f32,
    /// Initial viewport width in screen pixels.
    pub viewport_width: f32,
    /// Initial viewport height in screen pixels.
    pub viewport_height: f32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            default_zoom: 1.0,
            overscan: 1,
            pan_dead_zone: DEFAULT_PAN_DEAD_ZONE,
            fling_velocity: DEFAULT_FLING_VELOCITY,
            viewport_width: 375.0,
            viewport_height: 667.0,
        }
    }
}

impl PreviewConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
            ("default_zoom", self.default_zoom),
            ("fling_velocity", self.fling_velocity),
            ("viewport_width", self.viewport_width),
            ("viewport_height", self.viewport_height),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: f64::from(value),
                });
            }
        }
        if !self.pan_dead_zone.is_finite() || self.pan_dead_zone < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "pan_dead_zone",
                value: f64::from(self.pan_dead_zone),
            });
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::ZoomBounds {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        Ok(())
    }

    /// Clamp a zoom scale to the configured bounds.
    pub fn clamp_zoom(&self, scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(self.min_zoom, self.max_zoom)
        } else {
            self.default_zoom.clamp(self.min_zoom, self.max_zoom)
        }
    }
}
