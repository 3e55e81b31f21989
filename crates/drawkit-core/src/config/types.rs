//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};

use crate::pipeline::planner::{BoundingBox, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH};
use crate::types::OutputFormat;

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum source file size in megabytes
    pub max_file_size_mb: u64,

    /// Memory ceiling for a single decode or compositing allocation, in megabytes
    pub max_alloc_mb: u64,

    /// Maximum natural image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_alloc_mb: 512,
            max_image_dimension: 20000,
        }
    }
}

impl LimitsConfig {
    /// Memory ceiling in bytes.
    pub fn max_alloc_bytes(&self) -> u64 {
        self.max_alloc_mb.saturating_mul(1024 * 1024)
    }

    /// File size ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Canvas bounding box and decode budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Maximum background width in pixels
    pub max_width: u32,

    /// Maximum background height in pixels
    pub max_height: u32,

    /// Decoded pixel count is kept at or above this multiple of the target pixel count
    pub pixel_budget_multiplier: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            pixel_budget_multiplier: 2,
        }
    }
}

impl CanvasConfig {
    /// The configured bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.max_width, self.max_height)
    }
}

/// Encoded output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format ("png", "jpeg", or "webp")
    pub format: OutputFormat,

    /// Default quality (0-100)
    pub quality: u32,

    /// Directory where the CLI writes compressed backgrounds
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 80,
            dir: "~/.drawkit/backgrounds".to_string(),
        }
    }
}

/// Orientation metadata handling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Also honor EXIF orientation embedded in encoded byte sources
    /// (file sources are always honored)
    pub read_encoded_bytes: bool,
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of images compressed concurrently by the CLI
    pub parallel_workers: usize,

    /// Supported input extensions for directory discovery
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
                "tif".to_string(),
                "tiff".to_string(),
            ],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
