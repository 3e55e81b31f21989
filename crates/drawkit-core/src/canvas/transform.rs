//! Axis-aligned affine transforms (scale + translate).
//!
//! Canvas placement never needs rotation or shear, so the transform is kept
//! to four terms: `x' = sx·x + tx`, `y' = sy·y + ty`.

use serde::{Deserialize, Serialize};

/// Axis-aligned scale-and-translate transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        sx: 1.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            sx,
            sy,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            tx,
            ty,
        }
    }

    /// Scale by `(sx, sy)` keeping the pivot `(px, py)` fixed.
    pub fn scale_about(sx: f64, sy: f64, px: f64, py: f64) -> Self {
        Self {
            sx,
            sy,
            tx: px - sx * px,
            ty: py - sy * py,
        }
    }

    /// Apply `self` first, then `next`.
    pub fn then(self, next: Affine) -> Self {
        Self {
            sx: next.sx * self.sx,
            sy: next.sy * self.sy,
            tx: next.sx * self.tx + next.tx,
            ty: next.sy * self.ty + next.ty,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.sx * x + self.tx, self.sy * y + self.ty)
    }

    /// The transform mapping results back to inputs, if one exists.
    pub fn inverse(&self) -> Option<Affine> {
        if self.sx == 0.0 || self.sy == 0.0 || !self.sx.is_finite() || !self.sy.is_finite() {
            return None;
        }
        Some(Self {
            sx: 1.0 / self.sx,
            sy: 1.0 / self.sy,
            tx: -self.tx / self.sx,
            ty: -self.ty / self.sy,
        })
    }

    /// Row-major 3×3 matrix.
    pub fn to_matrix(&self) -> [f64; 9] {
        [self.sx, 0.0, self.tx, 0.0, self.sy, self.ty, 0.0, 0.0, 1.0]
    }

    /// Uniform scale that covers `dest` with `src`, centered; overflow is
    /// cropped equally on both sides.
    pub fn center_crop(src: (u32, u32), dest: (u32, u32)) -> Option<Affine> {
        let (sw, sh) = (src.0 as f64, src.1 as f64);
        let (dw, dh) = (dest.0 as f64, dest.1 as f64);
        if sw == 0.0 || sh == 0.0 {
            return None;
        }
        let scale = (dw / sw).max(dh / sh);
        Some(Self {
            sx: scale,
            sy: scale,
            tx: (dw - sw * scale) / 2.0,
            ty: (dh - sh * scale) / 2.0,
        })
    }
}
