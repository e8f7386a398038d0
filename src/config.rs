//! Run configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! reproduces the stock run: `C2-mitosis.tif`, the two mitosis landmarks,
//! zoom 4 and TIFF frames in `./output_images/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::enums::{DisplayMode, Interpolation, Rendering};
use crate::exporter::ExportConfig;
use crate::point::Point3D;
use crate::renderer::Renderer;
use crate::volume_loader::StackShape;

/// Smallest ray step, as a fraction of the smallest voxel size.
const MIN_STEP_PER_VOXEL: f64 = 1e-3;
const MIN_INDEX_WIDTH: usize = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Multi-page TIFF holding the (t, z, y, x) stack
    pub input: PathBuf,
    pub stack: StackShape,
    /// Voxel size (z, y, x) in world units
    pub scale: [f64; 3],
    pub landmarks: Landmarks,
    pub marker: MarkerStyle,
    pub camera: CameraConfig,
    pub canvas: CanvasConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// The two points whose connecting line is laid horizontal, in world
/// coordinates (z, y, x).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    pub point1: Point3D,
    pub point2: Point3D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub name: String,
    pub size: f64,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub zoom: f64,
    pub display: DisplayMode,
    pub rendering: Rendering,
    pub interpolation: Interpolation,
    /// Ray sampling distance in world units
    pub step: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "landmark_timelapse=debug,warn"
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("C2-mitosis.tif"),
            stack: StackShape::default(),
            scale: [1.0; 3],
            landmarks: Landmarks::default(),
            marker: MarkerStyle::default(),
            camera: CameraConfig::default(),
            canvas: CanvasConfig::default(),
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for Landmarks {
    fn default() -> Self {
        Self {
            point1: Point3D::new(2.0, 65.0, 70.0),
            point2: Point3D::new(5.0, 140.0, 95.0),
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            name: "Points".to_string(),
            size: 10.0,
            color: [255, 0, 0],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom: 4.0,
            display: DisplayMode::Volumetric,
            rendering: Rendering::MaximumIntensity,
            interpolation: Interpolation::Linear,
            step: 0.5,
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return invalid("canvas width and height must be non-zero");
        }
        if !(self.camera.zoom.is_finite() && self.camera.zoom > 0.0) {
            return invalid("camera.zoom must be a positive number");
        }
        if self.scale.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return invalid("scale entries must be positive numbers");
        }
        let smallest_voxel = self.scale.iter().copied().fold(f64::INFINITY, f64::min);
        let min_step = MIN_STEP_PER_VOXEL * smallest_voxel;
        if !(self.camera.step.is_finite() && self.camera.step >= min_step) {
            return invalid("camera.step must be at least 1/1000 of the smallest voxel size");
        }
        if self.export.extension.trim().is_empty() {
            return invalid("export.extension must not be empty");
        }
        if self.export.index_width < MIN_INDEX_WIDTH {
            return invalid("export.index_width must be at least 3");
        }
        let has_separator = |s: &str| s.contains(['/', '\\']);
        if has_separator(&self.export.prefix) || has_separator(&self.export.extension) {
            return invalid("export.prefix and export.extension must not contain path separators");
        }
        Ok(())
    }

    pub fn renderer(&self) -> Renderer {
        Renderer {
            rendering: self.camera.rendering,
            interpolation: self.camera.interpolation,
            step: self.camera.step,
            ..Renderer::new(self.canvas.width, self.canvas.height)
        }
    }
}
