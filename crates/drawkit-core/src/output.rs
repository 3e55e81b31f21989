//! Machine-readable reports for batch runs, written as JSON or JSON Lines.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::canvas::Affine;
use crate::types::{CompressedBackground, OrientationHint, OutputFormat};

/// Report serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line
    JsonLines,
}

impl ReportFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// What happened to one source image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionReport {
    /// Source file
    pub source: PathBuf,

    /// Where the encoded background was written, if anywhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Natural width of the source
    pub natural_width: u32,

    /// Natural height of the source
    pub natural_height: u32,

    /// Width after compositing and orientation correction
    pub width: u32,

    /// Height after compositing and orientation correction
    pub height: u32,

    pub downsample_factor: u32,
    pub orientation: OrientationHint,
    pub format: OutputFormat,
    pub quality: u32,

    /// Encoded size in bytes
    pub encoded_bytes: usize,

    /// Source-to-target placement
    pub transform: Affine,
}

impl CompressionReport {
    /// Build a report from a finished pipeline run.
    pub fn new(
        source: PathBuf,
        background: &CompressedBackground,
        format: OutputFormat,
        quality: u32,
    ) -> Self {
        Self {
            source,
            output: None,
            natural_width: background.probe.natural_width,
            natural_height: background.probe.natural_height,
            width: background.width,
            height: background.height,
            downsample_factor: background.plan.downsample_factor,
            orientation: background.orientation,
            format,
            quality,
            encoded_bytes: background.bytes.len(),
            transform: background.transform,
        }
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> ReportWriter<W> {
    /// Create a new report writer.
    ///
    /// `pretty` only affects JSON format; JSONL is always one object per line.
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single item.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == ReportFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write multiple items: a JSON array, or one line per item.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.items_written += items.len();
            }
            ReportFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    pub fn items_written(&self) -> usize {
        self.items_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
