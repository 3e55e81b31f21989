//! Two-pass bounded decoding: a header-only probe, then a full decode reduced
//! by the planned downsample factor.
//!
//! The probe never allocates pixel memory; it reads just enough of the
//! container to report dimensions. Decoding runs under an allocation ceiling
//! taken from [`LimitsConfig`], checked against the size actually produced.
//!
//! JPEG streams use the DCT's native 1/2, 1/4 and 1/8 scales, so a large
//! photo is never materialized at natural size when the plan shrinks it.
//! Other formats are decoded at natural size and area-averaged down.

use image::imageops;
use image::{
    DynamicImage, GrayImage, ImageBuffer, ImageDecoder as _, ImageError, ImageFormat, ImageReader,
    Limits, Luma, RgbImage,
};
use jpeg_decoder::{CodingProcess, PixelFormat};
use std::borrow::Cow;
use std::io::{BufRead, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ImageSource, PixelBuffer, ProbeResult};

use super::validate::Validator;

/// Decoder for every [`ImageSource`] variant, bounded by a memory ceiling.
pub struct BoundedDecoder {
    limits: LimitsConfig,
    validator: Validator,
}

impl BoundedDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            limits,
        }
    }

    /// Read the natural dimensions of a source without decoding pixels.
    pub fn probe(&self, source: &ImageSource) -> PipelineResult<ProbeResult> {
        let origin = source.describe();
        let (width, height) = match source {
            ImageSource::File(path) => {
                self.validator.validate_file(path)?;
                Self::dimensions_of(Self::open_file(path, &origin)?, &origin)?
            }
            ImageSource::Bytes(bytes) => {
                self.validator.validate_bytes(&origin, bytes)?;
                Self::dimensions_of(Self::open_bytes(bytes, &origin)?, &origin)?
            }
            ImageSource::Pixels(buf) => buf.dimensions(),
        };

        if width == 0 || height == 0 {
            return Err(PipelineError::invalid_image(
                origin,
                format!("zero-sized image ({}x{})", width, height),
            ));
        }
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::invalid_image(
                origin,
                format!("{}x{} exceeds the {}px dimension limit", width, height, max_dim),
            ));
        }

        tracing::trace!("Probed {}: {}x{}", origin, width, height);
        Ok(ProbeResult {
            natural_width: width,
            natural_height: height,
        })
    }

    /// Decode a source at `1/factor` of its natural resolution.
    ///
    /// The result is `⌊w/factor⌋ × ⌊h/factor⌋` (each side at least 1). For
    /// already-decoded pixel sources the factor is ignored and the caller's
    /// buffer is borrowed as-is.
    pub fn decode_scaled<'a>(
        &self,
        source: &'a ImageSource,
        factor: u32,
    ) -> PipelineResult<Cow<'a, PixelBuffer>> {
        let origin = source.describe();
        let factor = factor.max(1);
        let reduced = match source {
            ImageSource::File(path) => {
                self.decode_reduced(Self::open_file(path, &origin)?, factor, &origin)?
            }
            ImageSource::Bytes(bytes) => {
                self.decode_reduced(Self::open_bytes(bytes, &origin)?, factor, &origin)?
            }
            ImageSource::Pixels(buf) => return Ok(Cow::Borrowed(buf)),
        };
        Ok(Cow::Owned(reduced))
    }

    fn decode_reduced<R: BufRead + Seek>(
        &self,
        reader: ImageReader<R>,
        factor: u32,
        origin: &str,
    ) -> PipelineResult<PixelBuffer> {
        let reader = if factor > 1 && reader.format() == Some(ImageFormat::Jpeg) {
            let mut inner = reader.into_inner();
            if let Some(reduced) = self.decode_jpeg_scaled(&mut inner, factor, origin)? {
                return Ok(reduced);
            }
            inner
                .seek(SeekFrom::Start(0))
                .map_err(|e| PipelineError::decode(origin, format!("cannot rewind source: {}", e)))?;
            ImageReader::with_format(inner, ImageFormat::Jpeg)
        } else {
            reader
        };

        let full = self.decode_full(reader, origin)?;
        if factor == 1 {
            return Ok(full);
        }
        let reduced = reduce(&full, factor);
        tracing::trace!(
            "Downsampled {} by {}: {}x{} -> {}x{}",
            origin,
            factor,
            full.width(),
            full.height(),
            reduced.width(),
            reduced.height()
        );
        Ok(reduced)
    }

    /// Decode a JPEG at the smallest DCT scale that still covers the reduced
    /// size, then area-average down to exactly that size.
    ///
    /// `Ok(None)` hands the stream back to the general decoder (CMYK,
    /// lossless, or anything else the scaled path does not support).
    fn decode_jpeg_scaled<R: Read>(
        &self,
        reader: R,
        factor: u32,
        origin: &str,
    ) -> PipelineResult<Option<PixelBuffer>> {
        let mut decoder = jpeg_decoder::Decoder::new(reader);
        match decoder.read_info() {
            Ok(()) => {}
            Err(jpeg_decoder::Error::Unsupported(feature)) => {
                tracing::trace!("{}: no scaled decode ({:?})", origin, feature);
                return Ok(None);
            }
            Err(e) => return Err(PipelineError::decode(origin, e.to_string())),
        }
        let Some(info) = decoder.info() else {
            return Ok(None);
        };
        let channels: u64 = match info.pixel_format {
            PixelFormat::L8 => 1,
            PixelFormat::L16 => 2,
            PixelFormat::RGB24 => 3,
            PixelFormat::CMYK32 => return Ok(None),
        };
        if matches!(info.coding_process, CodingProcess::Lossless) {
            return Ok(None);
        }

        let (width, height) = (info.width as u32, info.height as u32);
        let (need_w, need_h) = ((width / factor).max(1), (height / factor).max(1));
        let (scaled_w, scaled_h) = match decoder.scale(need_w as u16, need_h as u16) {
            Ok((w, h)) => (w as u32, h as u32),
            Err(jpeg_decoder::Error::Unsupported(_)) => return Ok(None),
            Err(e) => return Err(PipelineError::decode(origin, e.to_string())),
        };
        // The scale is chosen to cover one axis; both have to be covered
        if scaled_w < need_w || scaled_h < need_h {
            return Ok(None);
        }

        let scaled_px = scaled_w as u64 * scaled_h as u64;
        // Progressive streams hold every coefficient at natural size
        let coefficients = match info.coding_process {
            CodingProcess::DctProgressive => width as u64 * height as u64 * channels * 2,
            _ => 0,
        };
        let requested = scaled_px * channels + scaled_px * 4 + coefficients;
        let limit = self.limits.max_alloc_bytes();
        if requested > limit {
            return Err(PipelineError::OutOfMemory {
                origin: origin.to_string(),
                stage: "decode",
                requested_bytes: requested,
                limit_bytes: limit,
            });
        }

        let raw = match decoder.decode() {
            Ok(raw) => raw,
            Err(jpeg_decoder::Error::Unsupported(_)) => return Ok(None),
            Err(e) => return Err(PipelineError::decode(origin, e.to_string())),
        };
        let image = match info.pixel_format {
            PixelFormat::L8 => GrayImage::from_raw(scaled_w, scaled_h, raw).map(DynamicImage::ImageLuma8),
            PixelFormat::L16 => {
                let samples = raw
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(scaled_w, scaled_h, samples)
                    .map(DynamicImage::ImageLuma16)
            }
            PixelFormat::RGB24 => RgbImage::from_raw(scaled_w, scaled_h, raw).map(DynamicImage::ImageRgb8),
            PixelFormat::CMYK32 => None,
        };
        let Some(image) = image else {
            return Err(PipelineError::decode(origin, "decoded frame has the wrong length"));
        };
        let frame = image.into_rgba8();

        tracing::trace!(
            "Scaled JPEG decode of {}: {}x{} -> {}x{} -> {}x{}",
            origin,
            width,
            height,
            scaled_w,
            scaled_h,
            need_w,
            need_h
        );
        if (scaled_w, scaled_h) == (need_w, need_h) {
            return Ok(Some(frame));
        }
        Ok(Some(imageops::thumbnail(&frame, need_w, need_h)))
    }

    fn open_file(
        path: &Path,
        origin: &str,
    ) -> PipelineResult<ImageReader<std::io::BufReader<std::fs::File>>> {
        let reader = ImageReader::open(path).map_err(|e| {
            PipelineError::invalid_image(origin, format!("cannot open source: {}", e))
        })?;
        reader
            .with_guessed_format()
            .map_err(|e| PipelineError::decode(origin, format!("cannot detect format: {}", e)))
    }

    fn open_bytes<'b>(bytes: &'b [u8], origin: &str) -> PipelineResult<ImageReader<Cursor<&'b [u8]>>> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::decode(origin, format!("cannot detect format: {}", e)))
    }

    fn dimensions_of<R: BufRead + Seek>(
        reader: ImageReader<R>,
        origin: &str,
    ) -> PipelineResult<(u32, u32)> {
        if reader.format().is_none() {
            return Err(PipelineError::decode(origin, "unrecognized image format"));
        }
        reader
            .into_dimensions()
            .map_err(|e| PipelineError::decode(origin, e.to_string()))
    }

    fn decode_full<R: BufRead + Seek>(
        &self,
        mut reader: ImageReader<R>,
        origin: &str,
    ) -> PipelineResult<PixelBuffer> {
        if reader.format().is_none() {
            return Err(PipelineError::decode(origin, "unrecognized image format"));
        }
        reader.limits(self.image_limits());

        let decoder = reader
            .into_decoder()
            .map_err(|e| self.map_image_error(e, origin, 0))?;
        let (width, height) = decoder.dimensions();
        let rgba_bytes = width as u64 * height as u64 * 4;
        let requested = decoder.total_bytes().max(rgba_bytes);
        if requested > self.limits.max_alloc_bytes() {
            return Err(PipelineError::OutOfMemory {
                origin: origin.to_string(),
                stage: "decode",
                requested_bytes: requested,
                limit_bytes: self.limits.max_alloc_bytes(),
            });
        }

        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| self.map_image_error(e, origin, requested))?;
        Ok(image.into_rgba8())
    }

    fn image_limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.limits.max_image_dimension);
        limits.max_image_height = Some(self.limits.max_image_dimension);
        limits.max_alloc = Some(self.limits.max_alloc_bytes());
        limits
    }

    fn map_image_error(&self, err: ImageError, origin: &str, requested: u64) -> PipelineError {
        use image::error::LimitErrorKind;

        match err {
            ImageError::Limits(limit) => match limit.kind() {
                LimitErrorKind::DimensionError => {
                    PipelineError::invalid_image(origin, limit.to_string())
                }
                _ => PipelineError::OutOfMemory {
                    origin: origin.to_string(),
                    stage: "decode",
                    requested_bytes: requested,
                    limit_bytes: self.limits.max_alloc_bytes(),
                },
            },
            other => PipelineError::decode(origin, other.to_string()),
        }
    }
}

/// Area-average a full frame down to `⌊w/factor⌋ × ⌊h/factor⌋`.
fn reduce(full: &PixelBuffer, factor: u32) -> PixelBuffer {
    let (w, h) = full.dimensions();
    imageops::thumbnail(full, (w / factor).max(1), (h / factor).max(1))
}
