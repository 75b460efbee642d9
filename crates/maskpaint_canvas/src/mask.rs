//! Rasterization of drawn strokes into a binary mask.
//!
//! Strokes are replayed in order onto a black pixmap at the original image
//! size: paint strokes in white, erase strokes in black. Anti-aliased edges
//! are then thresholded so every pixel is exactly 0 or 255.

use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use tiny_skia::{Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Transform};

use crate::constants::{MASK_OFF, MASK_ON, MASK_THRESHOLD, PNG_DATA_URL_PREFIX};
use crate::error::{CanvasError, CanvasResult};
use crate::stroke::{BrushMode, CanvasState, Stroke};
use crate::surface::{Size, Surface};

/// A binary mask at the original image size.
#[derive(Debug, Clone)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// Rasterize `state` for `surface`, scaling from display to original size.
    pub fn rasterize(state: &CanvasState, surface: &Surface) -> CanvasResult<Self> {
        let size = surface.original_size();
        let mut pixmap = Pixmap::new(size.width, size.height)
            .ok_or_else(|| CanvasError::invalid_dimensions(size.width, size.height))?;
        pixmap.fill(Color::BLACK);

        let width_scale = surface.mean_scale();
        for stroke in &state.strokes {
            draw_stroke(&mut pixmap, stroke, surface, width_scale);
        }

        let image = threshold(&pixmap, size);
        log::debug!(
            "Mask: rasterized {} strokes at {}x{}",
            state.strokes.len(),
            size.width,
            size.height
        );
        Ok(Self { image })
    }

    /// An all-black mask.
    pub fn empty(size: Size) -> Self {
        Self {
            image: GrayImage::from_pixel(size.width, size.height, Luma([MASK_OFF])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the pixel at (x, y) is masked. Out of range is unmasked.
    pub fn is_masked(&self, x: u32, y: u32) -> bool {
        self.image
            .get_pixel_checked(x, y)
            .is_some_and(|p| p[0] == MASK_ON)
    }

    /// Fraction of masked pixels in [0, 1].
    pub fn coverage(&self) -> f32 {
        let total = self.image.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        let on = self.image.as_raw().iter().filter(|&&v| v == MASK_ON).count();
        on as f32 / total as f32
    }

    /// The underlying grayscale image.
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// Encode as an 8-bit grayscale PNG.
    pub fn to_png(&self) -> CanvasResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(self.image.clone())
            .write_to(&mut out, ImageFormat::Png)
            .map_err(CanvasError::Encode)?;
        Ok(out.into_inner())
    }

    /// Encode as a `data:image/png;base64,...` URL.
    pub fn to_data_url(&self) -> CanvasResult<String> {
        let png = self.to_png()?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        Ok(format!("{PNG_DATA_URL_PREFIX}{encoded}"))
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke, surface: &Surface, width_scale: f32) {
    let Some(first) = stroke.points.first() else {
        return;
    };

    let mut paint = Paint::default();
    match stroke.mode {
        BrushMode::Paint => paint.set_color_rgba8(255, 255, 255, 255),
        BrushMode::Erase => paint.set_color_rgba8(0, 0, 0, 255),
    }
    paint.anti_alias = true;

    let width = (stroke.width / width_scale).max(1.0);
    let start = surface.to_original(*first);

    if stroke.is_dot() {
        if let Some(dot) = PathBuilder::from_circle(start.x, start.y, width / 2.0) {
            pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }

    let mut builder = PathBuilder::new();
    builder.move_to(start.x, start.y);
    for point in &stroke.points[1..] {
        let p = surface.to_original(*point);
        builder.line_to(p.x, p.y);
    }
    let Some(path) = builder.finish() else {
        log::trace!("Mask: skipped degenerate stroke");
        return;
    };

    let line = tiny_skia::Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &line, Transform::identity(), None);
}

/// Collapse the (opaque, gray) pixmap to strict black/white.
fn threshold(pixmap: &Pixmap, size: Size) -> GrayImage {
    let values = pixmap
        .data()
        .chunks_exact(4)
        .map(|px| if px[0] >= MASK_THRESHOLD { MASK_ON } else { MASK_OFF })
        .collect();
    // Length always matches: the pixmap was created with `size`.
    GrayImage::from_raw(size.width, size.height, values)
        .unwrap_or_else(|| GrayImage::new(size.width, size.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::Point;
    use image::RgbaImage;

    fn surface(original: (u32, u32), display: (u32, u32)) -> Surface {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(original.0, original.1));
        Surface::from_image(image, Some(Size::new(display.0, display.1))).unwrap()
    }

    fn line(mode: BrushMode, width: f32, from: (f32, f32), to: (f32, f32)) -> Stroke {
        Stroke {
            mode,
            width,
            points: vec![from.into(), to.into()],
        }
    }

    #[test]
    fn test_empty_state_is_black() {
        let surface = surface((32, 32), (32, 32));
        let mask = Mask::rasterize(&CanvasState::default(), &surface).unwrap();
        assert_eq!(mask.coverage(), 0.0);
        assert_eq!((mask.width(), mask.height()), (32, 32));
    }

    #[test]
    fn test_paint_stroke_is_white_and_binary() {
        let surface = surface((64, 64), (64, 64));
        let state = CanvasState {
            strokes: vec![line(BrushMode::Paint, 10.0, (5.0, 32.0), (59.0, 32.0))],
        };
        let mask = Mask::rasterize(&state, &surface).unwrap();

        assert!(mask.is_masked(32, 32));
        assert!(!mask.is_masked(32, 5));
        assert!(mask
            .as_image()
            .as_raw()
            .iter()
            .all(|&v| v == MASK_ON || v == MASK_OFF));
    }

    #[test]
    fn test_erase_clears_earlier_paint() {
        let surface = surface((64, 64), (64, 64));
        let state = CanvasState {
            strokes: vec![
                line(BrushMode::Paint, 20.0, (0.0, 32.0), (64.0, 32.0)),
                line(BrushMode::Erase, 20.0, (32.0, 0.0), (32.0, 64.0)),
            ],
        };
        let mask = Mask::rasterize(&state, &surface).unwrap();

        assert!(!mask.is_masked(32, 32));
        assert!(mask.is_masked(8, 32));
    }

    #[test]
    fn test_mask_is_exported_at_original_size() {
        // Canvas shows the 200x100 image at half size.
        let surface = surface((200, 100), (100, 50));
        let state = CanvasState {
            strokes: vec![Stroke {
                mode: BrushMode::Paint,
                width: 10.0,
                points: vec![Point::new(50.0, 25.0)],
            }],
        };
        let mask = Mask::rasterize(&state, &surface).unwrap();

        assert_eq!((mask.width(), mask.height()), (200, 100));
        // Dot centre maps from (50, 25) to (100, 50) with radius 10.
        assert!(mask.is_masked(100, 50));
        assert!(mask.is_masked(107, 50));
        assert!(!mask.is_masked(115, 50));
    }

    #[test]
    fn test_png_and_data_url() {
        let mask = Mask::empty(Size::new(8, 4));
        let png = mask.to_png().unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));

        let url = mask.to_data_url().unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
    }
}
