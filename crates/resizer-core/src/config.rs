//! Persisted process-wide settings.
//!
//! The configuration lives in a small JSON sidecar (`config.json` in the
//! working directory by default). It is read once at startup and rewritten in
//! full after every change.
//!
//! # Load behaviour
//!
//! - Missing file: defaults are used and written out.
//! - Malformed file: the problem is logged, defaults are used and the file is
//!   left untouched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::ExportOptions;
use crate::viewport::ViewportSettings;

/// Default sidecar file name.
pub const CONFIG_FILE: &str = "config.json";

/// Errors that can occur reading, writing or editing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown configuration field: {0}")]
    UnknownField(String),

    #[error("Invalid value {value:?} for {field}")]
    InvalidValue { field: String, value: String },
}

/// Crop output and interaction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    /// Horizontal drags move content with the pointer.
    pub invert_image_x: bool,
    /// Vertical drags move content with the pointer.
    pub invert_image_y: bool,
    /// Initial zoom for a newly loaded image, in percent of the fit scale.
    pub default_scale: f64,
    /// Zoom percent per wheel notch.
    pub scale_multiplier: f64,
    /// Output width in pixels.
    pub cropper_width: u32,
    /// Output height in pixels.
    pub cropper_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            invert_image_x: true,
            invert_image_y: true,
            default_scale: 100.0,
            scale_multiplier: 2.0,
            cropper_width: 512,
            cropper_height: 512,
        }
    }
}

impl Config {
    /// Field names as they appear in the JSON file.
    pub const FIELDS: [&'static str; 6] = [
        "InvertImageX",
        "InvertImageY",
        "DefaultScale",
        "ScaleMultiplier",
        "CropperWidth",
        "CropperHeight",
    ];

    /// Crop width divided by crop height.
    pub fn crop_aspect(&self) -> f64 {
        if self.cropper_height == 0 {
            return 1.0;
        }
        self.cropper_width as f64 / self.cropper_height as f64
    }

    pub fn viewport_settings(&self) -> ViewportSettings {
        ViewportSettings {
            crop_aspect: self.crop_aspect(),
            invert_x: self.invert_image_x,
            invert_y: self.invert_image_y,
            zoom_step: self.scale_multiplier,
            initial_zoom: self.default_scale / 100.0,
        }
        .sanitized()
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions::new(self.cropper_width, self.cropper_height)
    }

    /// Set one field from its JSON name and a textual value.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();
        match field {
            "InvertImageX" => self.invert_image_x = value.parse().map_err(|_| invalid())?,
            "InvertImageY" => self.invert_image_y = value.parse().map_err(|_| invalid())?,
            "DefaultScale" => self.default_scale = parse_finite(value).ok_or_else(invalid)?,
            "ScaleMultiplier" => self.scale_multiplier = parse_finite(value).ok_or_else(invalid)?,
            "CropperWidth" => self.cropper_width = parse_nonzero(value).ok_or_else(invalid)?,
            "CropperHeight" => self.cropper_height = parse_nonzero(value).ok_or_else(invalid)?,
            other => return Err(ConfigError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Read and parse a configuration file.
    pub fn read(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Serialize and write the whole configuration to `path`.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_nonzero(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|v| *v > 0)
}

/// The loaded configuration plus the file it is saved to.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Load the configuration at `path`. Never fails; see the module docs.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if !path.exists() {
            let store = Self {
                path,
                config: Config::default(),
            };
            if let Err(err) = store.save() {
                log::warn!("could not write default configuration: {err}");
            }
            return store;
        }

        let config = match Config::read(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("bad config in {}, using defaults: {err}", path.display());
                Config::default()
            }
        };
        Self { path, config }
    }

    /// Load `config.json` from the working directory.
    pub fn load_default() -> Self {
        Self::load(CONFIG_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Write the current configuration in full.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.config.write(&self.path)
    }

    /// Apply `change` and re-save if anything actually changed.
    pub fn update(&mut self, change: impl FnOnce(&mut Config)) -> Result<(), ConfigError> {
        let before = self.config.clone();
        change(&mut self.config);
        if self.config == before {
            return Ok(());
        }
        self.save()
    }

    /// Set one field by its JSON name and re-save.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), ConfigError> {
        let mut next = self.config.clone();
        next.set_field(field, value)?;
        self.update(|config| *config = next)
    }
}
