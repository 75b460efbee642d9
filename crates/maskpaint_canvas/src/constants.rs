//! Centralized constants for maskpaint_canvas
//!
//! All magic numbers shared by the surface, brush, history and mask code
//! live here.

// =============================================================================
// History
// =============================================================================

/// Maximum number of canvas snapshots kept for undo/redo
pub const HISTORY_LIMIT: usize = 50;

// =============================================================================
// Brush
// =============================================================================

/// Brush diameter used when the editor opens (display pixels)
pub const DEFAULT_BRUSH_SIZE: f32 = 20.0;

/// Smallest allowed brush diameter
pub const MIN_BRUSH_SIZE: f32 = 1.0;

/// Largest allowed brush diameter
pub const MAX_BRUSH_SIZE: f32 = 200.0;

// =============================================================================
// Surface & Colors
// =============================================================================

/// Largest accepted width or height for source images and display canvases
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Display size used when neither the session nor the image provides one
pub const FALLBACK_DISPLAY_SIZE: u32 = 512;

/// Background colour of the paint surface (`#2d3748`)
pub const SURFACE_BACKGROUND: [u8; 4] = [0x2d, 0x37, 0x48, 0xff];

/// Preview overlay colour for painted areas (`rgba(255,255,255,0.5)`)
pub const PAINT_OVERLAY: [u8; 4] = [255, 255, 255, 128];

// =============================================================================
// Mask
// =============================================================================

/// Luminance at or above which a rasterized mask pixel becomes white
pub const MASK_THRESHOLD: u8 = 128;

/// Value of a masked (to be regenerated) pixel
pub const MASK_ON: u8 = 255;

/// Value of an unmasked pixel
pub const MASK_OFF: u8 = 0;

/// Prefix of the data URL produced by mask export
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";
