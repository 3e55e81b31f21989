//! Drawkit Core - background image ingestion for a drawing canvas.
//!
//! Takes an arbitrary source image (a file, encoded bytes, or decoded pixels)
//! and produces a bounded, upright, encoded bitmap sized to the canvas,
//! without ever holding more decoded pixels than the canvas needs.
//!
//! # Architecture
//!
//! ```text
//! Source → Probe → Plan → Bounded Decode → Composite → Orient → Encode
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use drawkit_core::{BackgroundCompressor, Config, ImageSource};
//!
//! fn main() -> drawkit_core::Result<()> {
//!     let config = Config::load()?;
//!     let compressor = BackgroundCompressor::new(&config);
//!
//!     let bytes = compressor.compress(&ImageSource::file("./photo.jpg"), 80)?;
//!     println!("Encoded {} bytes", bytes.len());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod canvas;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use canvas::{Affine, BackgroundSink, DrawMove, ViewSizer};
pub use config::Config;
pub use error::{ConfigError, DrawkitError, ErrorKind, PipelineError, PipelineResult, Result};
pub use output::{CompressionReport, ReportFormat, ReportWriter};
pub use pipeline::{compress, BackgroundCompressor, BoundingBox, Planner};
pub use types::{
    CompressedBackground, EncodedOutput, ImageSource, OrientationHint, OutputFormat, PixelBuffer,
    ProbeResult, Quality, ScalePlan,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_compressor_from_config() {
        let mut config = Config::default();
        config.canvas.max_width = 100;
        config.canvas.max_height = 100;
        let compressor = BackgroundCompressor::new(&config);
        assert_eq!(compressor.planner().bounds().max_width, 100);
    }
}
