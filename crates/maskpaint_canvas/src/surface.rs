//! Paint surface: the source image scaled onto a display-sized canvas.
//!
//! The session tells the editor how large the canvas is; the image keeps its
//! own (original) size. Strokes are recorded in display coordinates and the
//! mask is exported at the original size, so the surface owns the mapping
//! between the two.

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::constants::MAX_CANVAS_SIDE;
use crate::error::{CanvasError, CanvasResult};
use crate::stroke::Point;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether either side exceeds [`MAX_CANVAS_SIDE`].
    pub fn is_oversized(&self) -> bool {
        self.width > MAX_CANVAS_SIDE || self.height > MAX_CANVAS_SIDE
    }
}

/// A loaded source image together with the display canvas it is drawn on.
#[derive(Debug, Clone)]
pub struct Surface {
    /// Source image at its original size
    original: RgbaImage,
    /// Source image resized to the display size
    background: RgbaImage,
    /// Display canvas size
    display: Size,
}

impl Surface {
    /// Decode `bytes` and scale the image onto a canvas of `display` size.
    ///
    /// A missing or zero display size falls back to the image's own size.
    pub fn load(bytes: &[u8], display: Option<Size>) -> CanvasResult<Self> {
        let decoded = image::load_from_memory(bytes).map_err(CanvasError::Decode)?;
        Self::from_image(decoded, display)
    }

    /// Build a surface from an already decoded image.
    ///
    /// Images or display sizes with a side above [`MAX_CANVAS_SIDE`] are
    /// rejected before anything is allocated for them.
    pub fn from_image(image: DynamicImage, display: Option<Size>) -> CanvasResult<Self> {
        let original_size = Size::new(image.width(), image.height());
        if original_size.is_empty() || original_size.is_oversized() {
            return Err(CanvasError::invalid_dimensions(
                original_size.width,
                original_size.height,
            ));
        }

        let display = match display {
            Some(size) if !size.is_empty() => size,
            _ => original_size,
        };
        if display.is_oversized() {
            return Err(CanvasError::invalid_dimensions(display.width, display.height));
        }

        let original = image.to_rgba8();

        let background = if display == original_size {
            original.clone()
        } else {
            image::imageops::resize(&original, display.width, display.height, FilterType::Triangle)
        };

        log::debug!(
            "Surface: image {}x{} on canvas {}x{}",
            original_size.width,
            original_size.height,
            display.width,
            display.height
        );

        Ok(Self {
            original,
            background,
            display,
        })
    }

    /// Original image size
    pub fn original_size(&self) -> Size {
        Size::new(self.original.width(), self.original.height())
    }

    /// Display canvas size
    pub fn display_size(&self) -> Size {
        self.display
    }

    /// Horizontal display/original ratio (`canvas.width / image.width`)
    pub fn scale_x(&self) -> f32 {
        self.display.width as f32 / self.original.width() as f32
    }

    /// Vertical display/original ratio
    pub fn scale_y(&self) -> f32 {
        self.display.height as f32 / self.original.height() as f32
    }

    /// Mean of both axis ratios, used to scale line widths
    pub fn mean_scale(&self) -> f32 {
        (self.scale_x() + self.scale_y()) / 2.0
    }

    /// Map a display coordinate onto the original image.
    pub fn to_original(&self, point: Point) -> Point {
        Point::new(point.x / self.scale_x(), point.y / self.scale_y())
    }

    /// Source image at display size
    pub fn background(&self) -> &RgbaImage {
        &self.background
    }

}
