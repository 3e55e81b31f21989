//! Final serialization of the background buffer.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{EncodedOutput, OutputFormat, PixelBuffer, Quality};

/// Encodes finished buffers into a single output format.
pub struct Encoder {
    format: OutputFormat,
}

impl Encoder {
    /// Create a new encoder for the given format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Encode and release `buf`.
    ///
    /// Output is a pure function of the pixels, format, and quality: no
    /// timestamps or other ambient data are written.
    pub fn encode(&self, buf: PixelBuffer, quality: Quality) -> PipelineResult<EncodedOutput> {
        let (width, height) = buf.dimensions();
        let mut out = Vec::with_capacity((width as usize * height as usize) / 2);

        let result = match self.format {
            OutputFormat::Png => {
                let (compression, filter) = png_settings(quality);
                PngEncoder::new_with_quality(&mut out, compression, filter).write_image(
                    buf.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                )
            }
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(buf).into_rgb8();
                JpegEncoder::new_with_quality(&mut out, quality.get().max(1)).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
            OutputFormat::WebP => WebPEncoder::new_lossless(&mut out).write_image(
                buf.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
        };
        result.map_err(|e| {
            PipelineError::InvalidArgument(format!(
                "cannot encode {}x{} as {}: {}",
                width, height, self.format, e
            ))
        })?;

        tracing::trace!(
            "Encoded {}x{} as {} (quality {}): {} bytes",
            width,
            height,
            self.format,
            quality.get(),
            out.len()
        );
        EncodedOutput::new(out).ok_or_else(|| {
            PipelineError::InvalidArgument(format!("{} encoder produced no data", self.format))
        })
    }
}

/// PNG is lossless, so quality only trades encode time for size.
fn png_settings(quality: Quality) -> (CompressionType, FilterType) {
    match quality.get() {
        90..=100 => (CompressionType::Best, FilterType::Adaptive),
        50..=89 => (CompressionType::Default, FilterType::Adaptive),
        _ => (CompressionType::Fast, FilterType::Sub),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> PixelBuffer {
        PixelBuffer::from_fn(33, 21, |x, y| Rgba([x as u8 * 7, y as u8 * 11, 90, 255]))
    }

    fn q(v: u32) -> Quality {
        Quality::new(v).unwrap()
    }

    #[test]
    fn test_png_roundtrip_dimensions_and_pixels() {
        let buf = sample();
        let bytes = Encoder::new(OutputFormat::Png)
            .encode(buf.clone(), Quality::MAX)
            .unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert_eq!(decoded, buf);
    }

    #[test]
    fn test_jpeg_has_magic_and_dimensions() {
        let bytes = Encoder::new(OutputFormat::Jpeg)
            .encode(sample(), q(80))
            .unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (33, 21));
    }

    #[test]
    fn test_jpeg_quality_zero_still_encodes() {
        let bytes = Encoder::new(OutputFormat::Jpeg)
            .encode(sample(), q(0))
            .unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_webp_is_riff() {
        let bytes = Encoder::new(OutputFormat::WebP)
            .encode(sample(), q(50))
            .unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        for format in [OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::WebP] {
            let encoder = Encoder::new(format);
            let a = encoder.encode(sample(), q(75)).unwrap();
            let b = encoder.encode(sample(), q(75)).unwrap();
            assert_eq!(a, b, "{}", format);
        }
    }

    #[test]
    fn test_png_settings_by_quality() {
        assert!(matches!(png_settings(q(100)).0, CompressionType::Best));
        assert!(matches!(png_settings(q(80)).0, CompressionType::Default));
        assert!(matches!(png_settings(q(10)).0, CompressionType::Fast));
    }
}
