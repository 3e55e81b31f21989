//! Fitting a compressed background to a view once its size is known.

use image::imageops::{self, FilterType};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::BackgroundCompressor;
use crate::types::{ImageSource, PixelBuffer};

/// Callback that receives the view-sized background.
pub type ReadyCallback = Box<dyn FnOnce(PixelBuffer) + Send>;

/// Scale `image` to `view_width`, keeping its aspect ratio.
///
/// Height is `⌊h · view_width / w⌋`, at least 1. Returns `None` for empty
/// inputs, a zero view width, or a height that does not fit in `u32`.
pub fn fit_to_width(image: &PixelBuffer, view_width: u32) -> Option<PixelBuffer> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || view_width == 0 {
        return None;
    }
    let height = u32::try_from(h as u64 * view_width as u64 / w as u64).ok()?.max(1);
    Some(imageops::resize(image, view_width, height, FilterType::Triangle))
}

/// Holds a decoded background until the view reports its layout, then
/// delivers the fitted image exactly once.
pub struct ViewSizer {
    pending: Option<(PixelBuffer, ReadyCallback)>,
}

impl ViewSizer {
    pub fn new(bitmap: PixelBuffer, on_ready: impl FnOnce(PixelBuffer) + Send + 'static) -> Self {
        Self {
            pending: Some((bitmap, Box::new(on_ready))),
        }
    }

    /// Compress `source`, decode the result, and wait for layout.
    pub fn from_compressed(
        compressor: &BackgroundCompressor,
        source: &ImageSource,
        quality: u32,
        on_ready: impl FnOnce(PixelBuffer) + Send + 'static,
    ) -> PipelineResult<Self> {
        let bytes = compressor.compress(source, quality)?;
        let bitmap = image::load_from_memory(&bytes)
            .map_err(|e| PipelineError::decode(source.describe(), e.to_string()))?
            .into_rgba8();
        Ok(Self::new(bitmap, on_ready))
    }

    /// Whether the callback is still waiting.
    pub fn is_registered(&self) -> bool {
        self.pending.is_some()
    }

    /// Layout notification. Fires the callback and deregisters on the first
    /// call with a usable width; returns whether the callback ran.
    ///
    /// A zero width means layout is not done yet and leaves the registration
    /// in place.
    pub fn on_layout(&mut self, view_width: u32, view_height: u32) -> bool {
        if view_width == 0 {
            return false;
        }
        let Some((bitmap, on_ready)) = self.pending.take() else {
            return false;
        };
        // Empty bitmaps are delivered unscaled
        let fitted = fit_to_width(&bitmap, view_width).unwrap_or(bitmap);
        tracing::debug!(
            "View laid out at {}x{}, background fitted to {}x{}",
            view_width,
            view_height,
            fitted.width(),
            fitted.height()
        );
        on_ready(fitted);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_fit_to_width_floors_height() {
        let img = PixelBuffer::new(300, 200);
        let fitted = fit_to_width(&img, 500).unwrap();
        assert_eq!(fitted.dimensions(), (500, 333));
        assert!(fit_to_width(&img, 0).is_none());
    }

    #[test]
    fn test_fit_to_width_rejects_unrepresentable_height() {
        // 2 * u32::MAX / 1 overflows u32
        assert!(fit_to_width(&PixelBuffer::new(1, 2), u32::MAX).is_none());
    }

    #[test]
    fn test_callback_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let size = Arc::new(Mutex::new((0, 0)));
        let (c, s) = (calls.clone(), size.clone());
        let mut sizer = ViewSizer::new(PixelBuffer::new(100, 50), move |img| {
            c.fetch_add(1, Ordering::SeqCst);
            *s.lock().unwrap() = img.dimensions();
        });

        assert!(sizer.is_registered());
        assert!(sizer.on_layout(200, 400));
        assert!(!sizer.on_layout(300, 400));
        assert!(!sizer.is_registered());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*size.lock().unwrap(), (200, 100));
    }

    #[test]
    fn test_zero_width_layout_keeps_registration() {
        let mut sizer = ViewSizer::new(PixelBuffer::new(10, 10), |_| {});
        assert!(!sizer.on_layout(0, 0));
        assert!(sizer.is_registered());
        assert!(sizer.on_layout(20, 20));
    }

    #[test]
    fn test_from_compressed() {
        let compressor = BackgroundCompressor::default();
        let source = ImageSource::Pixels(PixelBuffer::new(1224, 1632));
        let got = Arc::new(Mutex::new(None));
        let g = got.clone();
        let mut sizer = ViewSizer::from_compressed(&compressor, &source, 90, move |img| {
            *g.lock().unwrap() = Some(img.dimensions());
        })
        .unwrap();
        sizer.on_layout(306, 1000);
        assert_eq!(*got.lock().unwrap(), Some((306, 408)));
    }
}
