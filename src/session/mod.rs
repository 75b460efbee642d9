//! Session records linking an uploaded image to a Discord interaction.
//!
//! A session is created once when the bot uploads a source image and is
//! read-only afterwards. Stores drop it automatically after its TTL.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{MASKS_PREFIX, SESSIONS_PREFIX};

pub mod store;

#[cfg(not(target_arch = "wasm32"))]
pub use store::FileSessionStore;
pub use store::{MemorySessionStore, SessionStore};

/// Server-side record of one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Generated identifier (UUID v4)
    pub id: String,
    /// Blob path of the source image, always `sessions/{id}.png`
    pub image_path: String,
    /// Canvas width the editor should use
    pub width: u32,
    /// Canvas height the editor should use
    pub height: u32,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: u64,
    /// Discord user who started the session
    #[serde(default, deserialize_with = "string_or_number")]
    pub discord_user_id: Option<String>,
    /// Channel of the originating interaction
    #[serde(default, deserialize_with = "string_or_number")]
    pub channel_id: Option<String>,
    /// Message of the originating interaction
    #[serde(default, deserialize_with = "string_or_number")]
    pub message_id: Option<String>,
    /// Free-form bot metadata (e.g. `original_url`)
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,
}

impl Session {
    /// Create a session for `id`, deriving the image path and stamping the
    /// creation time.
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        let id = id.into();
        Self {
            image_path: session_image_path(&id),
            id,
            width,
            height,
            created_at: now_millis(),
            discord_user_id: None,
            channel_id: None,
            message_id: None,
            metadata: empty_object(),
        }
    }
}

/// Blob path of the source image for a session.
pub fn session_image_path(id: &str) -> String {
    format!("{SESSIONS_PREFIX}/{id}.png")
}

/// Blob path of the mask for a session.
pub fn mask_path(id: &str) -> String {
    format!("{MASKS_PREFIX}/{id}.png")
}

/// Whether `id` is safe to use as a key and file name.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Discord snowflakes arrive as strings or as JSON numbers depending on the
/// sender; keep them as strings either way. Empty strings count as absent.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
