//! Pipeline orchestration - wires together all stages.

use crate::canvas::BackgroundSink;
use crate::config::Config;
use crate::error::PipelineResult;
use crate::types::{CompressedBackground, EncodedOutput, ImageSource, OrientationHint, Quality};

use super::composite::Compositor;
use super::decode::BoundedDecoder;
use super::encode::Encoder;
use super::orientation::OrientationCorrector;
use super::planner::Planner;

/// Turns any [`ImageSource`] into a bounded, upright, encoded background.
///
/// Holds only immutable configuration, so one instance can serve concurrent
/// calls from several threads.
pub struct BackgroundCompressor {
    planner: Planner,
    decoder: BoundedDecoder,
    compositor: Compositor,
    encoder: Encoder,
    read_encoded_orientation: bool,
}

impl Default for BackgroundCompressor {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl BackgroundCompressor {
    /// Create a new compressor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            planner: Planner::new(
                config.canvas.bounding_box(),
                config.canvas.pixel_budget_multiplier,
            ),
            decoder: BoundedDecoder::new(config.limits.clone()),
            compositor: Compositor::new(config.limits.max_alloc_bytes()),
            encoder: Encoder::new(config.output.format),
            read_encoded_orientation: config.orientation.read_encoded_bytes,
        }
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn decoder(&self) -> &BoundedDecoder {
        &self.decoder
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Compress a source and return only the encoded bytes.
    pub fn compress(&self, source: &ImageSource, quality: u32) -> PipelineResult<EncodedOutput> {
        self.process(source, quality).map(|bg| bg.bytes)
    }

    /// Compress a source and hand the result to a canvas.
    pub fn apply_to<S: BackgroundSink + ?Sized>(
        &self,
        sink: &mut S,
        source: &ImageSource,
        quality: u32,
    ) -> PipelineResult<()> {
        let background = self.process(source, quality)?;
        sink.set_background_image(background.bytes, background.transform);
        Ok(())
    }

    /// Run the full pipeline.
    ///
    /// Quality is checked before anything is read, so a bad argument costs no
    /// decode work. Each stage consumes the previous stage's buffer.
    pub fn process(&self, source: &ImageSource, quality: u32) -> PipelineResult<CompressedBackground> {
        let quality = Quality::new(quality)?;
        let origin = source.describe();
        let start = std::time::Instant::now();
        tracing::debug!("Compressing background: {}", origin);

        let probe = self.decoder.probe(source)?;
        let plan = self.planner.plan(probe)?;
        tracing::trace!(
            "  Plan: {}x{} -> {}x{} (factor {})",
            probe.natural_width,
            probe.natural_height,
            plan.target_width,
            plan.target_height,
            plan.downsample_factor
        );

        let decode_start = std::time::Instant::now();
        let decoded = self.decoder.decode_scaled(source, plan.downsample_factor)?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let composite_start = std::time::Instant::now();
        let (src_w, src_h) = decoded.dimensions();
        let transform = Compositor::placement(src_w, src_h, &plan);
        let composited = self.compositor.composite(&decoded, &plan, &origin)?;
        drop(decoded);
        tracing::trace!("  Composite: {:?}", composite_start.elapsed());

        let orientation = self.orientation_of(source);
        let upright = OrientationCorrector::correct(composited, orientation);
        let (width, height) = upright.dimensions();

        let encode_start = std::time::Instant::now();
        let bytes = self.encoder.encode(upright, quality)?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        tracing::debug!(
            "Compressed {} in {:?} ({}x{}, {} bytes)",
            origin,
            start.elapsed(),
            width,
            height,
            bytes.len()
        );

        Ok(CompressedBackground {
            bytes,
            transform,
            width,
            height,
            orientation,
            probe,
            plan,
        })
    }

    fn orientation_of(&self, source: &ImageSource) -> OrientationHint {
        match source {
            ImageSource::File(path) => OrientationCorrector::read_file(path),
            ImageSource::Bytes(bytes) if self.read_encoded_orientation => {
                OrientationCorrector::read_bytes(bytes)
            }
            ImageSource::Bytes(_) => OrientationHint::Normal,
            ImageSource::Pixels(_) => OrientationHint::Normal,
        }
    }
}

/// Compress a source with the default configuration.
pub fn compress(source: &ImageSource, quality: u32) -> PipelineResult<EncodedOutput> {
    BackgroundCompressor::default().compress(source, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::PixelBuffer;

    #[test]
    fn test_quality_checked_before_source() {
        // A missing file would be InvalidImage; the quality error must win
        let source = ImageSource::file("/nonexistent/photo.jpg");
        let err = compress(&source, 150).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_pixels_source_end_to_end() {
        let source = ImageSource::Pixels(PixelBuffer::new(1224, 918));
        let bg = BackgroundCompressor::default().process(&source, 80).unwrap();
        assert_eq!((bg.width, bg.height), (612, 459));
        assert_eq!(bg.orientation, OrientationHint::Normal);
        assert_eq!((bg.probe.natural_width, bg.probe.natural_height), (1224, 918));
    }

    #[test]
    fn test_compressor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BackgroundCompressor>();
    }
}
