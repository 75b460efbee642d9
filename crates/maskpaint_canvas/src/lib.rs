//! maskpaint_canvas - mask painting core for inpainting
//!
//! Loads a source image onto a display-sized paint surface, records freehand
//! paint/erase strokes with a bounded undo/redo history and rasterizes them
//! into a binary black/white mask at the original image size.

pub mod constants;
mod editor;
mod error;
mod history;
mod mask;
mod preview;
mod stroke;
mod surface;

pub use editor::MaskEditor;
pub use error::{CanvasError, CanvasResult};
pub use history::History;
pub use mask::Mask;
pub use preview::render_preview;
pub use stroke::{clamp_brush_size, Brush, BrushMode, CanvasState, Point, Stroke, StrokeBuilder};
pub use surface::{Size, Surface};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::editor::MaskEditor;
    pub use crate::error::{CanvasError, CanvasResult};
    pub use crate::stroke::{BrushMode, CanvasState, Point, Stroke};
    pub use crate::surface::Size;
}
