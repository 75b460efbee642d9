//! Brush settings, freehand strokes and the serialized canvas state.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BRUSH_SIZE, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::error::{CanvasError, CanvasResult};

/// What a stroke does to the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushMode {
    /// Adds to the mask (white)
    #[default]
    Paint,
    /// Removes from the mask (black)
    Erase,
}

impl BrushMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            BrushMode::Paint => "Brush",
            BrushMode::Erase => "Eraser",
        }
    }
}

impl std::str::FromStr for BrushMode {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brush" | "paint" => Ok(BrushMode::Paint),
            "eraser" | "erase" => Ok(BrushMode::Erase),
            other => Err(CanvasError::UnknownMode(other.to_string())),
        }
    }
}

/// Clamp a brush diameter to the supported range.
pub fn clamp_brush_size(size: f32) -> f32 {
    if size.is_finite() {
        size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
    } else {
        DEFAULT_BRUSH_SIZE
    }
}

/// Current brush settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    /// Paint or erase
    pub mode: BrushMode,
    /// Diameter in display pixels
    pub size: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            mode: BrushMode::Paint,
            size: DEFAULT_BRUSH_SIZE,
        }
    }
}

/// A point in display (surface) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// A completed freehand stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Paint or erase
    pub mode: BrushMode,
    /// Line width in display pixels
    pub width: f32,
    /// Polyline in display coordinates; a single point is a dot
    pub points: Vec<Point>,
}

impl Stroke {
    /// Whether the stroke is a single dot rather than a line.
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }
}

/// Accumulates pointer positions into a stroke while the pointer is down.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    brush: Brush,
    points: Vec<Point>,
}

impl StrokeBuilder {
    /// Start a stroke at `point` using `brush`.
    pub fn begin(brush: Brush, point: Point) -> Self {
        Self {
            brush,
            points: vec![point],
        }
    }

    /// Add a point. Repeats of the previous point are skipped.
    pub fn extend(&mut self, point: Point) {
        if self.points.last() != Some(&point) {
            self.points.push(point);
        }
    }

    /// Finish the stroke.
    pub fn finish(self) -> Stroke {
        Stroke {
            mode: self.brush.mode,
            width: self.brush.size,
            points: self.points,
        }
    }
}

/// Everything drawn on the canvas; one history entry serializes this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    pub strokes: Vec<Stroke>,
}

impl CanvasState {
    /// Serialize to the JSON string stored in history.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a history entry.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether any paint stroke exists (erase-only canvases export empty).
    pub fn has_paint(&self) -> bool {
        self.strokes.iter().any(|s| s.mode == BrushMode::Paint)
    }
}
