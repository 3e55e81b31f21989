//! Target-size and downsample planning.
//!
//! Given an image's natural size, pick a target that fits the canvas bounding
//! box while keeping the aspect ratio, and an integer divisor for the decode
//! step so the decoded frame stays small but never drops below the target.
//!
//! All ratio comparisons are done with integer cross-multiplication, so the
//! branch taken (and the truncated side length) is exact for every input.

use std::cmp::Ordering;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ProbeResult, ScalePlan};

/// Default maximum background width (portrait page).
pub const DEFAULT_MAX_WIDTH: u32 = 612;

/// Default maximum background height (portrait page).
pub const DEFAULT_MAX_HEIGHT: u32 = 816;

/// Default decoded-pixels-per-target-pixel budget.
pub const DEFAULT_PIXEL_BUDGET_MULTIPLIER: u32 = 2;

/// Maximum width/height an output image may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl BoundingBox {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// True if an image of this size fits without shrinking.
    pub fn contains(&self, width: u32, height: u32) -> bool {
        width <= self.max_width && height <= self.max_height
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WIDTH, DEFAULT_MAX_HEIGHT)
    }
}

/// Computes [`ScalePlan`]s for a fixed bounding box.
#[derive(Debug, Clone)]
pub struct Planner {
    bounds: BoundingBox,
    pixel_budget_multiplier: u32,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(BoundingBox::default(), DEFAULT_PIXEL_BUDGET_MULTIPLIER)
    }
}

impl Planner {
    /// Create a planner. A zero multiplier is treated as 1.
    pub fn new(bounds: BoundingBox, pixel_budget_multiplier: u32) -> Self {
        Self {
            bounds,
            pixel_budget_multiplier: pixel_budget_multiplier.max(1),
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Plan the target size and downsample factor for an image.
    ///
    /// Fails with `InvalidImage` when either natural dimension is zero, or
    /// when the bounding box itself is degenerate.
    pub fn plan(&self, probe: ProbeResult) -> PipelineResult<ScalePlan> {
        let (width, height) = (probe.natural_width, probe.natural_height);
        if width == 0 || height == 0 {
            return Err(PipelineError::invalid_image(
                format!("{}x{}", width, height),
                "natural dimensions must be non-zero",
            ));
        }
        if self.bounds.max_width == 0 || self.bounds.max_height == 0 {
            return Err(PipelineError::InvalidArgument(format!(
                "bounding box must be non-zero, got {}x{}",
                self.bounds.max_width, self.bounds.max_height
            )));
        }

        let (target_width, target_height) = self.target_size(width, height);
        let downsample_factor = downsample_factor(
            width,
            height,
            target_width,
            target_height,
            self.pixel_budget_multiplier,
        );

        Ok(ScalePlan {
            target_width,
            target_height,
            downsample_factor,
        })
    }

    fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let BoundingBox {
            max_width,
            max_height,
        } = self.bounds;
        if self.bounds.contains(width, height) {
            return (width, height);
        }

        let (w, h) = (width as u64, height as u64);
        let (mw, mh) = (max_width as u64, max_height as u64);

        // w/h vs mw/mh
        match (w * mh).cmp(&(mw * h)) {
            Ordering::Less => {
                let scaled_width = (w * mh / h) as u32;
                (scaled_width.max(1), max_height)
            }
            Ordering::Greater => {
                let scaled_height = (h * mw / w) as u32;
                (max_width, scaled_height.max(1))
            }
            Ordering::Equal => (max_width, max_height),
        }
    }
}

/// Largest integer divisor that keeps a decoded frame at or above the budget.
///
/// Linear search from 1: the factor grows while decoding at `1/(factor+1)`
/// would still yield at least `multiplier × target` pixels. The result is then
/// capped so that neither decoded side falls below the matching target side.
pub fn downsample_factor(
    natural_width: u32,
    natural_height: u32,
    target_width: u32,
    target_height: u32,
    multiplier: u32,
) -> u32 {
    if target_width == 0 || target_height == 0 {
        return 1;
    }
    let natural = natural_width as u128 * natural_height as u128;
    let budget = multiplier.max(1) as u128 * target_width as u128 * target_height as u128;

    let mut factor: u32 = 1;
    loop {
        let next = factor as u128 + 1;
        if natural < budget * next * next {
            break;
        }
        factor += 1;
    }

    let axis_cap = (natural_width / target_width)
        .min(natural_height / target_height)
        .max(1);
    factor.min(axis_cap)
}
