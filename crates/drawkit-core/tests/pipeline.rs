//! End-to-end tests for background compression across every source kind.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use drawkit_core::canvas::{DrawMove, DrawingMode, DrawingTool, PaintStyle};
use drawkit_core::{
    BackgroundCompressor, Config, ErrorKind, ImageSource, OrientationHint, PixelBuffer,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbImage};

/// Left half red, right half blue.
fn split_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgb([255, 0, 0])
        } else {
            image::Rgb([0, 0, 255])
        }
    })
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// APP1 segment holding a little-endian TIFF block with a single
/// Orientation (0x0112) SHORT entry.
fn exif_app1(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

/// A JPEG whose EXIF block carries the given orientation.
fn jpeg_with_orientation(img: RgbImage, orientation: u16) -> Vec<u8> {
    let jpeg = encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg);
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&exif_app1(orientation));
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn decode_output(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes).unwrap().into_rgba8()
}

fn is_reddish(p: &Rgba<u8>) -> bool {
    p[0] > 200 && p[2] < 60
}

fn is_bluish(p: &Rgba<u8>) -> bool {
    p[2] > 200 && p[0] < 60
}

#[test]
fn test_bytes_source_is_clamped_to_canvas_width() {
    let png = encode(
        DynamicImage::ImageRgb8(split_rgb(1600, 1200)),
        ImageFormat::Png,
    );
    let bg = BackgroundCompressor::default()
        .process(&ImageSource::Bytes(png), 80)
        .unwrap();
    assert_eq!((bg.width, bg.height), (612, 459));
    assert_eq!(bg.plan.downsample_factor, 1);

    let out = decode_output(&bg.bytes);
    assert_eq!(out.dimensions(), (612, 459));
    assert!(is_reddish(out.get_pixel(10, 200)));
    assert!(is_bluish(out.get_pixel(600, 200)));
}

#[test]
fn test_large_pixel_source_uses_downsample_factor() {
    let source = ImageSource::Pixels(PixelBuffer::from_pixel(4000, 3000, Rgba([9, 9, 9, 255])));
    let bg = BackgroundCompressor::default().process(&source, 50).unwrap();
    assert_eq!((bg.width, bg.height), (612, 459));
    assert_eq!(bg.plan.downsample_factor, 4);
    // The caller's pixels are untouched
    let ImageSource::Pixels(buf) = &source else {
        unreachable!()
    };
    assert_eq!(buf.dimensions(), (4000, 3000));
}

#[test]
fn test_large_encoded_source_decodes_reduced() {
    let png = encode(
        DynamicImage::ImageRgb8(split_rgb(2000, 1500)),
        ImageFormat::Png,
    );
    let bg = BackgroundCompressor::default()
        .process(&ImageSource::Bytes(png), 80)
        .unwrap();
    assert_eq!((bg.width, bg.height), (612, 459));
    assert_eq!(bg.plan.downsample_factor, 2);
    let out = decode_output(&bg.bytes);
    assert!(is_reddish(out.get_pixel(100, 100)));
    assert!(is_bluish(out.get_pixel(500, 100)));
}

#[test]
fn test_one_pixel_stripes_shrink_to_flat_gray() {
    let stripes = PixelBuffer::from_fn(4000, 3000, |x, _| {
        let v = if x % 2 == 0 { 0 } else { 255 };
        Rgba([v, v, v, 255])
    });
    let bg = BackgroundCompressor::default()
        .process(&ImageSource::Pixels(stripes), 100)
        .unwrap();
    let out = decode_output(&bg.bytes);
    assert_eq!(out.dimensions(), (612, 459));
    let (lo, hi) = out
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    assert!(lo >= 110 && hi <= 145, "gray range {}..{}", lo, hi);
}

#[test]
fn test_large_jpeg_decodes_under_a_tight_ceiling() {
    let mut config = Config::default();
    config.limits.max_alloc_mb = 1;
    config.canvas.max_width = 100;
    config.canvas.max_height = 100;
    let compressor = BackgroundCompressor::new(&config);

    let jpeg = encode(
        DynamicImage::ImageRgb8(split_rgb(1200, 1200)),
        ImageFormat::Jpeg,
    );
    let bg = compressor.process(&ImageSource::Bytes(jpeg), 80).unwrap();
    assert_eq!(bg.plan.downsample_factor, 8);
    assert_eq!((bg.width, bg.height), (100, 100));
    let out = decode_output(&bg.bytes);
    assert!(is_reddish(out.get_pixel(10, 50)));
    assert!(is_bluish(out.get_pixel(90, 50)));

    // The same frame as PNG has no reduced decode and needs the full buffer
    let png = encode(
        DynamicImage::ImageRgb8(split_rgb(1200, 1200)),
        ImageFormat::Png,
    );
    let err = compressor.process(&ImageSource::Bytes(png), 80).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfMemory);
}

#[test]
fn test_file_with_rotate90_orientation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "rotated.jpg",
        &jpeg_with_orientation(split_rgb(300, 200), 6),
    );

    let bg = BackgroundCompressor::default()
        .process(&ImageSource::File(path), 80)
        .unwrap();
    assert_eq!(bg.orientation, OrientationHint::Rotate90);
    assert_eq!((bg.width, bg.height), (200, 300));

    // Clockwise quarter turn: the red left half ends up on top
    let out = decode_output(&bg.bytes);
    assert_eq!(out.dimensions(), (200, 300));
    assert!(is_reddish(out.get_pixel(100, 20)));
    assert!(is_bluish(out.get_pixel(100, 280)));
}

#[test]
fn test_file_with_rotate180_orientation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "upside_down.jpg",
        &jpeg_with_orientation(split_rgb(300, 200), 3),
    );

    let bg = BackgroundCompressor::default()
        .process(&ImageSource::File(path), 80)
        .unwrap();
    assert_eq!(bg.orientation, OrientationHint::Rotate180);
    assert_eq!((bg.width, bg.height), (300, 200));

    let out = decode_output(&bg.bytes);
    assert!(is_bluish(out.get_pixel(20, 100)));
    assert!(is_reddish(out.get_pixel(280, 100)));
}

#[test]
fn test_file_without_orientation_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let img = split_rgb(300, 200);
    let path = write_fixture(
        dir.path(),
        "plain.png",
        &encode(DynamicImage::ImageRgb8(img.clone()), ImageFormat::Png),
    );

    let bg = BackgroundCompressor::default()
        .process(&ImageSource::File(path), 100)
        .unwrap();
    assert_eq!(bg.orientation, OrientationHint::Normal);
    assert_eq!((bg.width, bg.height), (300, 200));

    // Fits the box, so PNG output is pixel-identical
    let out = decode_output(&bg.bytes);
    assert_eq!(out, DynamicImage::ImageRgb8(img).into_rgba8());
}

#[test]
fn test_bytes_orientation_is_opt_in() {
    let jpeg = jpeg_with_orientation(split_rgb(300, 200), 6);
    let source = ImageSource::Bytes(jpeg);

    let bg = BackgroundCompressor::default().process(&source, 80).unwrap();
    assert_eq!(bg.orientation, OrientationHint::Normal);
    assert_eq!((bg.width, bg.height), (300, 200));

    let mut config = Config::default();
    config.orientation.read_encoded_bytes = true;
    let bg = BackgroundCompressor::new(&config).process(&source, 80).unwrap();
    assert_eq!(bg.orientation, OrientationHint::Rotate90);
    assert_eq!((bg.width, bg.height), (200, 300));
}

#[test]
fn test_quality_out_of_range() {
    let source = ImageSource::Pixels(PixelBuffer::new(10, 10));
    let err = BackgroundCompressor::default()
        .compress(&source, 150)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    assert!(BackgroundCompressor::default().compress(&source, 0).is_ok());
    assert!(BackgroundCompressor::default().compress(&source, 100).is_ok());
}

#[test]
fn test_zero_sized_source_is_invalid_image() {
    let source = ImageSource::Pixels(PixelBuffer::new(0, 0));
    let err = drawkit_core::compress(&source, 80).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidImage);
}

#[test]
fn test_missing_file_is_invalid_image() {
    let err = drawkit_core::compress(&ImageSource::file("/nonexistent/bg.png"), 80).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidImage);
}

#[test]
fn test_malformed_bytes_are_decode_error() {
    let err = drawkit_core::compress(&ImageSource::Bytes(b"not an image at all".to_vec()), 80)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);

    // Valid signature, truncated body
    let mut png = encode(
        DynamicImage::ImageRgb8(split_rgb(64, 64)),
        ImageFormat::Png,
    );
    png.truncate(40);
    let err = drawkit_core::compress(&ImageSource::Bytes(png), 80).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn test_memory_ceiling_is_out_of_memory() {
    let mut config = Config::default();
    config.limits.max_alloc_mb = 1;
    let png = encode(
        DynamicImage::ImageRgb8(split_rgb(1000, 1000)),
        ImageFormat::Png,
    );
    let err = BackgroundCompressor::new(&config)
        .compress(&ImageSource::Bytes(png), 80)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfMemory);
}

#[test]
fn test_output_is_deterministic() {
    let png = encode(
        DynamicImage::ImageRgb8(split_rgb(900, 700)),
        ImageFormat::Png,
    );
    let source = ImageSource::Bytes(png);
    let compressor = BackgroundCompressor::default();
    let a = compressor.compress(&source, 75).unwrap();
    let b = compressor.compress(&source, 75).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_apply_to_draw_move() {
    let mut mv = DrawMove::new(PaintStyle::default(), DrawingMode::Draw, DrawingTool::Pen);
    let source = ImageSource::Pixels(PixelBuffer::new(1224, 918));
    BackgroundCompressor::default()
        .apply_to(&mut mv, &source, 80)
        .unwrap();

    let bg = mv.background().unwrap();
    assert_eq!(bg.transform.sx, 0.5);
    assert_eq!(bg.transform.sy, 0.5);
    assert_eq!(decode_output(&bg.bytes).dimensions(), (612, 459));
}

#[test]
fn test_concurrent_calls_share_one_compressor() {
    let compressor = BackgroundCompressor::default();
    let source = ImageSource::Pixels(PixelBuffer::from_pixel(1000, 800, Rgba([1, 2, 3, 255])));
    let expected = compressor.compress(&source, 60).unwrap();

    let (compressor, source) = (&compressor, &source);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || compressor.compress(source, 60).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
