//! Canvas-side helpers that consume pipeline output.
//!
//! - **transform**: scale/translate transforms shared with the compositor
//! - **draw_move**: the in-flight stroke record, which also holds the background
//! - **view**: fitting a background to a laid-out view, with a one-shot callback
//! - **overlay**: flattening background and foreground into one image

pub mod draw_move;
pub mod overlay;
pub mod transform;
pub mod view;

pub use draw_move::{Background, DrawMove, DrawingMode, DrawingTool, PaintStyle, Point};
pub use overlay::combine;
pub use transform::Affine;
pub use view::{fit_to_width, ViewSizer};

use crate::types::EncodedOutput;

/// Anything that can hold an encoded background and its placement.
pub trait BackgroundSink {
    fn set_background_image(&mut self, bytes: EncodedOutput, transform: Affine);
}
