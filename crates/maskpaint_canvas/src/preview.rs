//! Display composite: the source image with painted areas highlighted.

use image::{Rgba, RgbaImage};

use crate::constants::{PAINT_OVERLAY, SURFACE_BACKGROUND};
use crate::mask::Mask;
use crate::surface::Surface;

/// Render the display-sized background with `mask` blended on top in
/// translucent white.
///
/// Transparent parts of the image show the surface background colour.
pub fn render_preview(surface: &Surface, mask: &Mask) -> RgbaImage {
    let mut out = surface.background().clone();
    let (sx, sy) = (surface.scale_x(), surface.scale_y());
    let max_x = mask.width().saturating_sub(1);
    let max_y = mask.height().saturating_sub(1);

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        *pixel = blend(Rgba(SURFACE_BACKGROUND), pixel.0);
        let ox = (((x as f32 + 0.5) / sx) as u32).min(max_x);
        let oy = (((y as f32 + 0.5) / sy) as u32).min(max_y);
        if mask.is_masked(ox, oy) {
            *pixel = blend(*pixel, PAINT_OVERLAY);
        }
    }
    out
}

/// Source-over blend of a straight-alpha colour onto an opaque pixel.
fn blend(base: Rgba<u8>, over: [u8; 4]) -> Rgba<u8> {
    let a = f32::from(over[3]) / 255.0;
    let mix = |b: u8, o: u8| (f32::from(o) * a + f32::from(b) * (1.0 - a)).round() as u8;
    Rgba([
        mix(base[0], over[0]),
        mix(base[1], over[1]),
        mix(base[2], over[2]),
        base[3].max(over[3]),
    ])
}
