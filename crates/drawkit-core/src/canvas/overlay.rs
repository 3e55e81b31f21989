//! Flattening the background and the stroke layer into one image.

use image::imageops;

use crate::types::PixelBuffer;

/// Draw `background` then `foreground` (alpha-over) into a new
/// `dest_width × dest_height` buffer, both anchored at the origin.
///
/// Parts of either layer outside the destination are clipped.
pub fn combine(
    background: &PixelBuffer,
    foreground: &PixelBuffer,
    dest_width: u32,
    dest_height: u32,
) -> PixelBuffer {
    let mut out = PixelBuffer::new(dest_width, dest_height);
    imageops::overlay(&mut out, background, 0, 0);
    imageops::overlay(&mut out, foreground, 0, 0);
    out
}
