//! The stroke currently being drawn.
//!
//! A `DrawMove` is an ordinary owned value: whoever renders strokes constructs
//! one and passes it by reference to whatever needs to read or update it.

use serde::{Deserialize, Serialize};

use super::transform::Affine;
use super::BackgroundSink;
use crate::types::EncodedOutput;

/// What the pointer does on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawingMode {
    #[default]
    Draw,
    Text,
    Eraser,
}

/// Shape produced by a stroke in `Draw` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawingTool {
    #[default]
    Pen,
    Line,
    Arrow,
    Rectangle,
    Circle,
    Ellipse,
}

/// Stroke appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintStyle {
    /// RGBA color
    pub color: [u8; 4],
    pub stroke_width: f32,
    pub anti_alias: bool,
    /// Text size for `Text` mode
    pub font_size: f32,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            stroke_width: 3.0,
            anti_alias: true,
            font_size: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An installed background image.
#[derive(Debug, Clone)]
pub struct Background {
    pub bytes: EncodedOutput,
    pub transform: Affine,
}

/// A single in-flight stroke.
#[derive(Debug, Clone)]
pub struct DrawMove {
    paint: PaintStyle,
    mode: DrawingMode,
    tool: DrawingTool,
    path: Vec<Point>,
    start: Point,
    end: Point,
    text: Option<String>,
    background: Option<Background>,
}

impl DrawMove {
    pub fn new(paint: PaintStyle, mode: DrawingMode, tool: DrawingTool) -> Self {
        Self {
            paint,
            mode,
            tool,
            path: Vec::new(),
            start: Point::default(),
            end: Point::default(),
            text: None,
            background: None,
        }
    }

    pub fn paint(&self) -> &PaintStyle {
        &self.paint
    }

    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    pub fn tool(&self) -> DrawingTool {
        self.tool
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn set_paint(&mut self, paint: PaintStyle) -> &mut Self {
        self.paint = paint;
        self
    }

    pub fn set_mode(&mut self, mode: DrawingMode) -> &mut Self {
        self.mode = mode;
        self
    }

    pub fn set_tool(&mut self, tool: DrawingTool) -> &mut Self {
        self.tool = tool;
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    /// Begin a new stroke at `point`, discarding any previous path.
    pub fn begin(&mut self, point: Point) -> &mut Self {
        self.path.clear();
        self.path.push(point);
        self.start = point;
        self.end = point;
        self
    }

    /// Extend the stroke to `point`.
    pub fn extend(&mut self, point: Point) -> &mut Self {
        self.path.push(point);
        self.end = point;
        self
    }

    pub fn clear_background(&mut self) -> Option<Background> {
        self.background.take()
    }
}

impl BackgroundSink for DrawMove {
    fn set_background_image(&mut self, bytes: EncodedOutput, transform: Affine) {
        self.background = Some(Background { bytes, transform });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_empty() {
        let mv = DrawMove::new(PaintStyle::default(), DrawingMode::Draw, DrawingTool::Line);
        assert_eq!(mv.tool(), DrawingTool::Line);
        assert!(mv.path().is_empty());
        assert!(mv.text().is_none());
        assert!(mv.background().is_none());
    }

    #[test]
    fn test_stroke_tracks_start_and_end() {
        let mut mv = DrawMove::new(PaintStyle::default(), DrawingMode::Draw, DrawingTool::Pen);
        mv.begin(Point::new(1.0, 2.0))
            .extend(Point::new(3.0, 4.0))
            .extend(Point::new(5.0, 6.0));
        assert_eq!(mv.start(), Point::new(1.0, 2.0));
        assert_eq!(mv.end(), Point::new(5.0, 6.0));
        assert_eq!(mv.path().len(), 3);

        mv.begin(Point::new(0.0, 0.0));
        assert_eq!(mv.path().len(), 1);
    }

    #[test]
    fn test_background_sink() {
        let mut mv = DrawMove::new(PaintStyle::default(), DrawingMode::Draw, DrawingTool::Pen);
        let bytes = EncodedOutput::new(vec![1, 2, 3]).unwrap();
        mv.set_background_image(bytes.clone(), Affine::scale(0.5, 0.5));
        let bg = mv.background().unwrap();
        assert_eq!(bg.bytes, bytes);
        assert_eq!(bg.transform.sx, 0.5);

        assert!(mv.clear_background().is_some());
        assert!(mv.background().is_none());
    }
}
