//! Global constants for the maskpaint service

/// Seconds a session (and its cached blobs) stay valid
pub const SESSION_TTL_SECS: u64 = 3600;

/// Seconds between sweeps that drop expired sessions
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Cache-Control header sent with every stored blob
pub const BLOB_CACHE_CONTROL: &str = "public, max-age=3600";

/// Content type of source images and masks
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Uploaded images shorter than this are rejected as invalid
pub const MIN_IMAGE_BYTES: usize = 100;

/// Canvas size used when neither the request nor the PNG header has one
pub const DEFAULT_CANVAS_SIZE: u32 = maskpaint_canvas::constants::FALLBACK_DISPLAY_SIZE;

/// Largest accepted canvas width or height
pub const MAX_CANVAS_SIDE: u32 = maskpaint_canvas::constants::MAX_CANVAS_SIDE;

/// Largest accepted request body (base64 images are big)
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Prefix under which session source images are stored
pub const SESSIONS_PREFIX: &str = "sessions";

/// Prefix under which masks are stored
pub const MASKS_PREFIX: &str = "masks";

/// Route prefix serving stored blobs
pub const STORAGE_ROUTE: &str = "/storage";
