//! Centered, uniformly scaled placement of a decoded frame into the target
//! buffer.
//!
//! The placement is the same one a canvas would use: translate the source so
//! its center sits on the destination center, then scale about that center by
//! `target / source` on each axis. That maps the source rectangle exactly onto
//! the target rectangle, so drawing through it is a plain filtered resize.

use image::imageops::{self, FilterType};

use crate::canvas::transform::Affine;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{PixelBuffer, ScalePlan};

/// Draws decoded frames into freshly allocated target buffers.
pub struct Compositor {
    max_alloc_bytes: u64,
}

impl Compositor {
    /// Create a compositor that refuses allocations above `max_alloc_bytes`.
    pub fn new(max_alloc_bytes: u64) -> Self {
        Self { max_alloc_bytes }
    }

    /// Transform from source pixel space to target pixel space.
    pub fn placement(src_width: u32, src_height: u32, plan: &ScalePlan) -> Affine {
        let (tw, th) = (plan.target_width as f64, plan.target_height as f64);
        let (sw, sh) = (src_width as f64, src_height as f64);
        let (middle_x, middle_y) = (tw / 2.0, th / 2.0);

        Affine::translate(middle_x - sw / 2.0, middle_y - sh / 2.0)
            .then(Affine::scale_about(tw / sw, th / sh, middle_x, middle_y))
    }

    /// Draw `src` into a new `target_width × target_height` buffer.
    ///
    /// Same-size frames are copied verbatim; everything else goes through a
    /// triangle-filtered resize whose kernel widens with the scale ratio.
    pub fn composite(
        &self,
        src: &PixelBuffer,
        plan: &ScalePlan,
        origin: &str,
    ) -> PipelineResult<PixelBuffer> {
        let (src_w, src_h) = src.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(PipelineError::invalid_image(origin, "empty source frame"));
        }
        let (target_w, target_h) = (plan.target_width, plan.target_height);
        if target_w == 0 || target_h == 0 {
            return Err(PipelineError::InvalidArgument(format!(
                "target size must be non-zero, got {}x{}",
                target_w, target_h
            )));
        }

        if (src_w, src_h) == (target_w, target_h) {
            let mut dest = self.allocate(target_w, target_h, origin)?;
            dest.copy_from_slice(src.as_raw());
            return Ok(dest);
        }

        // The vertical pass keeps an f32 RGBA frame of src_w × target_h
        let scratch = src_w as u64 * target_h as u64 * 16;
        self.check_ceiling(rgba_bytes(target_w, target_h) + scratch, origin)?;
        Ok(imageops::resize(src, target_w, target_h, FilterType::Triangle))
    }

    fn check_ceiling(&self, requested: u64, origin: &str) -> PipelineResult<()> {
        if requested > self.max_alloc_bytes {
            return Err(self.out_of_memory(requested, origin));
        }
        Ok(())
    }

    fn out_of_memory(&self, requested: u64, origin: &str) -> PipelineError {
        PipelineError::OutOfMemory {
            origin: origin.to_string(),
            stage: "composite",
            requested_bytes: requested,
            limit_bytes: self.max_alloc_bytes,
        }
    }

    /// Allocate a transparent buffer, failing instead of aborting the process
    /// when the ceiling or the allocator says no.
    fn allocate(&self, width: u32, height: u32, origin: &str) -> PipelineResult<PixelBuffer> {
        let requested = rgba_bytes(width, height);
        self.check_ceiling(requested, origin)?;

        let len = usize::try_from(requested).map_err(|_| self.out_of_memory(requested, origin))?;
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| self.out_of_memory(requested, origin))?;
        data.resize(len, 0);

        PixelBuffer::from_raw(width, height, data).ok_or_else(|| self.out_of_memory(requested, origin))
    }
}

fn rgba_bytes(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * 4
}
