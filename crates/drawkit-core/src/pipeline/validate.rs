//! Cheap source checks that run before any decoder is constructed.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Validates sources before probing.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check that a file exists, is within the size limit, and starts with a
    /// known image signature.
    pub fn validate_file(&self, path: &Path) -> PipelineResult<()> {
        let origin = path.display().to_string();

        let metadata = std::fs::metadata(path).map_err(|e| {
            PipelineError::invalid_image(&origin, format!("cannot read source: {}", e))
        })?;
        if !metadata.is_file() {
            return Err(PipelineError::invalid_image(&origin, "not a regular file"));
        }
        self.check_size(&origin, metadata.len())?;

        let file = std::fs::File::open(path).map_err(|e| {
            PipelineError::invalid_image(&origin, format!("cannot open source: {}", e))
        })?;
        let header = Self::read_header(file, &origin)?;
        Self::check_signature(&origin, &header)
    }

    /// Same checks for an in-memory encoded image.
    pub fn validate_bytes(&self, origin: &str, bytes: &[u8]) -> PipelineResult<()> {
        if bytes.is_empty() {
            return Err(PipelineError::invalid_image(origin, "empty byte stream"));
        }
        self.check_size(origin, bytes.len() as u64)?;
        Self::check_signature(origin, &bytes[..bytes.len().min(12)])
    }

    fn read_header<R: Read>(reader: R, origin: &str) -> PipelineResult<Vec<u8>> {
        let mut header = Vec::with_capacity(12);
        reader.take(12).read_to_end(&mut header).map_err(|e| {
            PipelineError::invalid_image(origin, format!("cannot read source: {}", e))
        })?;
        Ok(header)
    }

    fn check_size(&self, origin: &str, len: u64) -> PipelineResult<()> {
        if len > self.limits.max_file_size_bytes() {
            return Err(PipelineError::invalid_image(
                origin,
                format!(
                    "source is {}MB, limit is {}MB",
                    len / (1024 * 1024),
                    self.limits.max_file_size_mb
                ),
            ));
        }
        Ok(())
    }

    fn check_signature(origin: &str, header: &[u8]) -> PipelineResult<()> {
        if header.len() < 4 {
            return Err(PipelineError::decode(
                origin,
                "too small to be a valid image",
            ));
        }
        if !Self::is_known_signature(header) {
            return Err(PipelineError::decode(
                origin,
                "unrecognized image format (invalid magic bytes)",
            ));
        }
        Ok(())
    }

    /// Match the leading bytes against the formats the decoder understands.
    fn is_known_signature(header: &[u8]) -> bool {
        match header {
            [0xFF, 0xD8, 0xFF, ..] => true,
            [0x89, b'P', b'N', b'G', ..] => true,
            [b'G', b'I', b'F', b'8', ..] => true,
            [b'B', b'M', ..] => true,
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,
            // Short RIFF headers are let through; the decoder has the final say
            [b'R', b'I', b'F', b'F', _, _, _, _, rest @ ..] if rest.len() >= 4 => {
                &rest[..4] == b"WEBP"
            }
            [b'R', b'I', b'F', b'F', ..] => true,
            _ => false,
        }
    }
}
