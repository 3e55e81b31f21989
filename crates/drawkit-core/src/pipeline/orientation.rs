//! EXIF orientation lookup and exact rotation.

use exif::{In, Reader, Tag, Value};
use image::imageops;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::types::{OrientationHint, PixelBuffer};

/// Reads orientation metadata and rotates buffers upright.
pub struct OrientationCorrector;

impl OrientationCorrector {
    /// Read the orientation tag from an image file.
    ///
    /// Missing files, missing EXIF blocks, and malformed tags all yield
    /// `Normal`; orientation is never a reason to fail the pipeline.
    pub fn read_file(path: &Path) -> OrientationHint {
        let Ok(file) = File::open(path) else {
            return OrientationHint::Normal;
        };
        let mut reader = BufReader::new(file);
        match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Self::hint_from(&exif),
            Err(e) => {
                tracing::trace!("No usable EXIF in {:?}: {}", path, e);
                OrientationHint::Normal
            }
        }
    }

    /// Read the orientation tag from an encoded image held in memory.
    pub fn read_bytes(bytes: &[u8]) -> OrientationHint {
        let mut cursor = Cursor::new(bytes);
        Reader::new()
            .read_from_container(&mut cursor)
            .map(|exif| Self::hint_from(&exif))
            .unwrap_or_default()
    }

    fn hint_from(exif: &exif::Exif) -> OrientationHint {
        let raw = exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().map(|&x| x as u32),
                Value::Long(v) => v.first().copied(),
                _ => None,
            });
        match raw {
            Some(value) => {
                tracing::debug!("EXIF orientation: {}", value);
                OrientationHint::from_exif(value)
            }
            None => OrientationHint::Normal,
        }
    }

    /// Rotate a buffer clockwise by the hint. Pure pixel permutation; `Normal`
    /// hands the buffer back untouched.
    pub fn correct(buf: PixelBuffer, hint: OrientationHint) -> PixelBuffer {
        match hint {
            OrientationHint::Normal => buf,
            OrientationHint::Rotate90 => imageops::rotate90(&buf),
            OrientationHint::Rotate180 => imageops::rotate180(&buf),
            OrientationHint::Rotate270 => imageops::rotate270(&buf),
        }
    }
}
