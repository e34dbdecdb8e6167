//! Editor tunables.
//!
//! Every field has a default, so a config file (or JS object) only needs to
//! name the values it changes:
//!
//! ```toml
//! history_limit = 100
//!
//! [viewport]
//! max_zoom = 8.0
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serialization back to TOML failed.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo states kept
    pub history_limit: usize,
    /// Crop selections must be strictly larger than this on both sides (image pixels)
    pub min_crop_size: f64,
    pub viewport: ViewportConfig,
    pub export: ExportConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            min_crop_size: 10.0,
            viewport: ViewportConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Zoom, pan and animation tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplier applied by the zoom-in button
    pub zoom_in_factor: f64,
    /// Multiplier applied by the zoom-out button
    pub zoom_out_factor: f64,
    /// Exponential wheel sensitivity per unit of `deltaY`
    pub wheel_sensitivity: f64,
    /// Fraction of the remaining distance covered per animation frame
    pub easing: f64,
    /// Zoom difference below which the animation snaps and stops
    pub zoom_epsilon: f64,
    /// Pan difference (CSS pixels) below which the animation snaps and stops
    pub pan_epsilon: f64,
    /// Minimum visible part of the image when panning (CSS pixels)
    pub pan_margin: f64,
    /// Space left around the image by fit-to-screen (CSS pixels)
    pub fit_padding: f64,
    /// Arrow-key pan distance (CSS pixels)
    pub key_pan_step: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_in_factor: 1.25,
            zoom_out_factor: 0.8,
            wheel_sensitivity: 0.0015,
            easing: 0.15,
            zoom_epsilon: 0.001,
            pan_epsilon: 0.5,
            pan_margin: 100.0,
            fit_padding: 40.0,
            key_pan_step: 50.0,
        }
    }
}

impl ViewportConfig {
    /// Replace values that would break the viewport with their defaults.
    ///
    /// Zoom bounds must be positive and ordered, the easing rate must lie
    /// in (0, 1], and the settle epsilons must be strictly positive so the
    /// animation can stop.
    pub fn sanitized(mut self) -> Self {
        let dv = Self::default();

        if !(self.min_zoom > 0.0 && self.max_zoom >= self.min_zoom && self.max_zoom.is_finite()) {
            self.min_zoom = dv.min_zoom;
            self.max_zoom = dv.max_zoom;
        }
        if !(self.zoom_in_factor > 1.0 && self.zoom_in_factor.is_finite()) {
            self.zoom_in_factor = dv.zoom_in_factor;
        }
        if !(self.zoom_out_factor > 0.0 && self.zoom_out_factor < 1.0) {
            self.zoom_out_factor = dv.zoom_out_factor;
        }
        if !(self.easing > 0.0 && self.easing <= 1.0) {
            self.easing = dv.easing;
        }
        for (value, default) in [
            (&mut self.zoom_epsilon, dv.zoom_epsilon),
            (&mut self.pan_epsilon, dv.pan_epsilon),
        ] {
            if !(value.is_finite() && *value > 0.0) {
                *value = default;
            }
        }
        for (value, default) in [
            (&mut self.wheel_sensitivity, dv.wheel_sensitivity),
            (&mut self.pan_margin, dv.pan_margin),
            (&mut self.fit_padding, dv.fit_padding),
            (&mut self.key_pan_step, dv.key_pan_step),
        ] {
            if !(value.is_finite() && *value >= 0.0) {
                *value = default;
            }
        }
        self
    }

    /// Clamp a zoom factor into the configured range.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            1.0_f64.clamp(self.min_zoom, self.max_zoom)
        }
    }
}

/// Export defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// JPEG quality in (0, 1]
    pub jpeg_quality: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { jpeg_quality: 0.92 }
    }
}

impl EditorConfig {
    /// Parse a TOML document, filling unspecified fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML or wrongly typed values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replace values that would break the editor with their defaults.
    ///
    /// The history must keep at least one entry; see
    /// [`ViewportConfig::sanitized`] for the viewport rules.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.viewport = self.viewport.sanitized();

        if self.history_limit == 0 {
            self.history_limit = defaults.history_limit;
        }
        if !(self.min_crop_size.is_finite() && self.min_crop_size >= 0.0) {
            self.min_crop_size = defaults.min_crop_size;
        }
        if !(self.export.jpeg_quality > 0.0 && self.export.jpeg_quality <= 1.0) {
            self.export.jpeg_quality = defaults.export.jpeg_quality;
        }
        self
    }
}
