//! JSON bodies exchanged between the bot, the editor and the service.
//!
//! The bot sends snake_case keys when starting a session; everything the
//! editor sends or receives is camelCase.

use serde::{Deserialize, Serialize};

use crate::params::RawParameters;
use crate::session::string_or_number;

/// `POST /api/start-session` body, sent by the bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSessionRequest {
    /// Source image as base64 or a data URL
    #[serde(default)]
    pub image_data: Option<String>,
    /// Canvas width; read from the PNG header when absent
    #[serde(default)]
    pub width: Option<u32>,
    /// Canvas height; read from the PNG header when absent
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub discord_user_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// `POST /api/start-session` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
}

/// `GET /api/session/{id}` response: what the editor needs to open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
}

/// `POST /api/save-mask` body, sent by the editor.
///
/// Discord context fields are optional; the service fills them from the
/// stored session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMaskRequest {
    #[serde(default)]
    pub session_id: String,
    /// Mask PNG as a data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<RawParameters>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub discord_user_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub channel_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// `POST /api/save-mask` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMaskResponse {
    pub status: String,
    pub mask_url: String,
}

/// Body of every JSON error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
