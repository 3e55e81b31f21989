//! Core data types for the background pipeline.
//!
//! These are the values that flow between pipeline stages. All of them live
//! for a single pipeline call; nothing here is shared across invocations.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::canvas::transform::Affine;
use crate::error::{PipelineError, PipelineResult};

/// Decoded pixels: 8-bit RGBA, fixed size at creation.
pub type PixelBuffer = RgbaImage;

/// Where a background image comes from.
///
/// The pipeline only ever borrows the source; the caller keeps ownership.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An encoded image on disk
    File(PathBuf),
    /// An encoded image held in memory
    Bytes(Vec<u8>),
    /// Pixels that are already decoded
    Pixels(PixelBuffer),
}

impl ImageSource {
    /// Source backed by a file on disk.
    pub fn file(path: impl AsRef<Path>) -> Self {
        ImageSource::File(path.as_ref().to_path_buf())
    }

    /// Short description used in error messages and logs.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::File(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<encoded bytes: {} B>", bytes.len()),
            ImageSource::Pixels(buf) => {
                format!("<pixel buffer: {}x{}>", buf.width(), buf.height())
            }
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::File(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<PixelBuffer> for ImageSource {
    fn from(buf: PixelBuffer) -> Self {
        ImageSource::Pixels(buf)
    }
}

/// Natural dimensions reported by a bounds-only decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub natural_width: u32,
    pub natural_height: u32,
}

impl ProbeResult {
    pub fn pixel_count(&self) -> u64 {
        self.natural_width as u64 * self.natural_height as u64
    }
}

/// Target size and decode divisor computed by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalePlan {
    pub target_width: u32,
    pub target_height: u32,
    pub downsample_factor: u32,
}

impl ScalePlan {
    pub fn pixel_count(&self) -> u64 {
        self.target_width as u64 * self.target_height as u64
    }
}

/// Rotation needed to show an image right-side-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrientationHint {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl OrientationHint {
    /// Map an EXIF `Orientation` tag value to a hint.
    ///
    /// Only the pure rotations (6, 3, 8) are corrected; mirrored and unknown
    /// values fall back to `Normal`.
    pub fn from_exif(value: u32) -> Self {
        match value {
            6 => OrientationHint::Rotate90,
            3 => OrientationHint::Rotate180,
            8 => OrientationHint::Rotate270,
            _ => OrientationHint::Normal,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            OrientationHint::Normal => OrientationHint::Normal,
            OrientationHint::Rotate90 => OrientationHint::Rotate270,
            OrientationHint::Rotate180 => OrientationHint::Rotate180,
            OrientationHint::Rotate270 => OrientationHint::Rotate90,
        }
    }

    /// Clockwise rotation in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            OrientationHint::Normal => 0,
            OrientationHint::Rotate90 => 90,
            OrientationHint::Rotate180 => 180,
            OrientationHint::Rotate270 => 270,
        }
    }
}

/// Encoder quality, validated to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: Quality = Quality(100);

    /// Validate a caller-supplied quality value.
    pub fn new(value: u32) -> PipelineResult<Self> {
        if value > 100 {
            return Err(PipelineError::InvalidArgument(format!(
                "quality must be between 0 and 100, got {}",
                value
            )));
        }
        Ok(Quality(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Quality {
    type Error = PipelineError;

    fn try_from(value: u32) -> PipelineResult<Self> {
        Quality::new(value)
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless; quality selects compression effort
    #[default]
    Png,
    /// Lossy; alpha is dropped
    #[serde(alias = "jpg")]
    Jpeg,
    /// Lossless WebP
    WebP,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    /// MIME type, used for data URIs.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Jpeg => write!(f, "jpeg"),
            OutputFormat::WebP => write!(f, "webp"),
        }
    }
}

/// The pipeline's terminal artifact: a complete, non-empty encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedOutput(Vec<u8>);

impl EncodedOutput {
    /// Wrap encoder output. Callers must never see an empty stream.
    pub(crate) fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Self(bytes))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for EncodedOutput {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for EncodedOutput {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Everything a canvas needs to install a background.
#[derive(Debug, Clone)]
pub struct CompressedBackground {
    /// Encoded background image
    pub bytes: EncodedOutput,
    /// Transform used to place the decoded source into the target buffer
    pub transform: Affine,
    /// Width of the encoded image (after orientation correction)
    pub width: u32,
    /// Height of the encoded image (after orientation correction)
    pub height: u32,
    /// Rotation that was applied
    pub orientation: OrientationHint,
    /// Natural size of the source, as probed
    pub probe: ProbeResult,
    /// Plan the image was produced from
    pub plan: ScalePlan,
}
