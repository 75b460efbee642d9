//! Request handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::api::{
    SaveMaskRequest, SaveMaskResponse, SessionView, StartSessionRequest, StartSessionResponse,
};
use crate::codec::{decode_data_url, png_dimensions};
use crate::constants::{
    BLOB_CACHE_CONTROL, DEFAULT_CANVAS_SIZE, MAX_CANVAS_SIDE, MIN_IMAGE_BYTES, PNG_CONTENT_TYPE,
    STORAGE_ROUTE,
};
use crate::error::{ServiceError, ServiceResult};
use crate::params::InpaintParameters;
use crate::server::{ApiError, AppState};
use crate::session::{Session, empty_object, is_valid_session_id, mask_path};
use crate::storage::{BlobMetadata, validate_blob_path};
use crate::webhook::WebhookPayload;

const SAVE_MASK_DETAILS: &str = "Error saving mask image";
const GET_IMAGE_DETAILS: &str = "Error retrieving image from storage";

type ApiResult<T> = Result<T, ApiError>;

fn storage_url(origin: &str, path: &str) -> String {
    format!("{origin}{STORAGE_ROUTE}/{path}")
}

/// `GET /api/test`
pub async fn test_route() -> &'static str {
    "Test route is working"
}

/// Anything unrouted.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

// ============================================================================
// Sessions
// ============================================================================

/// Run store calls on the blocking pool. File-backed stores do disk I/O.
async fn blocking<T, F>(task: F) -> ServiceResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| ServiceError::storage(format!("Storage task failed: {err}")))?
}

fn check_canvas_side(width: u32, height: u32) -> ServiceResult<()> {
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(ServiceError::invalid_request(format!(
            "Image dimensions {width}x{height} exceed the maximum of {MAX_CANVAS_SIDE}"
        )));
    }
    Ok(())
}

/// Canvas size: request values, else the PNG header, else the default.
///
/// Both the source image and the canvas must fit within
/// [`MAX_CANVAS_SIDE`] on each side.
fn resolve_dimensions(request: &StartSessionRequest, image: &[u8]) -> ServiceResult<(u32, u32)> {
    let header = png_dimensions(image);
    if let Some((w, h)) = header {
        check_canvas_side(w, h)?;
    }
    let width = request
        .width
        .filter(|w| *w > 0)
        .or(header.map(|(w, _)| w))
        .unwrap_or(DEFAULT_CANVAS_SIZE);
    let height = request
        .height
        .filter(|h| *h > 0)
        .or(header.map(|(_, h)| h))
        .unwrap_or(DEFAULT_CANVAS_SIZE);
    check_canvas_side(width, height)?;
    Ok((width, height))
}

/// `POST /api/start-session`
pub async fn start_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<StartSessionResponse>> {
    let request: StartSessionRequest = serde_json::from_slice(&body).map_err(ServiceError::from)?;

    let image_data = request
        .image_data
        .as_deref()
        .filter(|data| !data.is_empty())
        .ok_or_else(|| ServiceError::invalid_request("No image_data provided"))?;
    let image = decode_data_url(image_data)?;
    if image.len() < MIN_IMAGE_BYTES {
        return Err(ServiceError::invalid_request("Invalid image data received").into());
    }

    let (width, height) = resolve_dimensions(&request, &image)?;
    log::info!("Starting session with canvas {}x{}", width, height);

    let mut session = Session::new(Uuid::new_v4().to_string(), width, height);
    session.discord_user_id = request.discord_user_id;
    session.channel_id = request.channel_id;
    session.message_id = request.message_id;
    session.metadata = request
        .metadata
        .filter(|m| !m.is_null())
        .unwrap_or_else(empty_object);

    let metadata = BlobMetadata::with_content_type(PNG_CONTENT_TYPE)
        .cache_control(BLOB_CACHE_CONTROL)
        .custom("width", width)
        .custom("height", height);
    let (blobs, sessions, ttl) = (state.blobs.clone(), state.sessions.clone(), state.session_ttl);
    let session = blocking(move || {
        blobs.put(&session.image_path, &image, metadata)?;
        sessions.put(&session, ttl)?;
        Ok(session)
    })
    .await?;

    let origin = state.origin(&headers);
    Ok(Json(StartSessionResponse {
        image_url: storage_url(&origin, &session.image_path),
        session_id: session.id,
        width,
        height,
    }))
}

/// `GET /api/session/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    log::debug!("Getting session: {}", id);
    let sessions = state.sessions.clone();
    let lookup = id.clone();
    let session = blocking(move || sessions.get(&lookup))
        .await?
        .ok_or_else(|| ServiceError::session_not_found(&id))?;

    let origin = state.origin(&headers);
    Ok(Json(SessionView {
        image_url: storage_url(&origin, &session.image_path),
        id: session.id,
        width: session.width,
        height: session.height,
    }))
}

// ============================================================================
// Masks
// ============================================================================

/// `POST /api/save-mask`
pub async fn save_mask(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<SaveMaskResponse>> {
    store_mask_and_relay(&state, &headers, &body)
        .await
        .map(Json)
        .map_err(|err| ApiError::from(err).details(SAVE_MASK_DETAILS))
}

async fn store_mask_and_relay(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> ServiceResult<SaveMaskResponse> {
    let mut request: SaveMaskRequest = serde_json::from_slice(body)?;
    log::info!("Received save mask request for session: {}", request.session_id);

    if !is_valid_session_id(&request.session_id) {
        return Err(ServiceError::invalid_request("Invalid or missing sessionId"));
    }
    let mask_data = request
        .mask_data
        .as_deref()
        .filter(|data| !data.is_empty())
        .ok_or_else(|| ServiceError::invalid_request("No mask data provided"))?;
    let mask = decode_data_url(mask_data)?;
    if mask.is_empty() {
        return Err(ServiceError::invalid_request("Empty mask data received"));
    }

    let path = mask_path(&request.session_id);
    log::debug!("Saving mask to: {} ({} bytes)", path, mask.len());
    let metadata =
        BlobMetadata::with_content_type(PNG_CONTENT_TYPE).cache_control(BLOB_CACHE_CONTROL);
    let blobs = state.blobs.clone();
    let target = path.clone();
    let verified = blocking(move || {
        blobs.put(&target, &mask, metadata)?;
        Ok(blobs.get(&target)?.is_some_and(|saved| saved.size() > 0))
    })
    .await?;
    if !verified {
        return Err(ServiceError::storage("Failed to verify saved mask"));
    }

    let mask_url = storage_url(&state.origin(headers), &path);
    log::info!("Generated mask URL: {}", mask_url);

    fill_from_session(state, &mut request).await?;
    let context = RelayContext::validate(&request)?;

    if state.webhook.is_enabled() {
        let payload = WebhookPayload {
            session_id: request.session_id.clone(),
            mask_url: mask_url.clone(),
            prompt: request.prompt.clone().unwrap_or_default(),
            parameters: InpaintParameters::normalize(request.parameters.as_ref()),
            metadata: context.metadata,
            discord_user_id: context.discord_user_id,
            channel_id: context.channel_id,
            message_id: context.message_id,
        };
        let outcome = state.webhook.send(&payload).await;
        log::debug!("Webhook outcome for {}: {:?}", request.session_id, outcome);
    }

    Ok(SaveMaskResponse {
        status: "success".to_string(),
        mask_url,
    })
}

fn metadata_missing(metadata: &Option<serde_json::Value>) -> bool {
    match metadata {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Take Discord context the editor did not send from the stored session.
async fn fill_from_session(state: &AppState, request: &mut SaveMaskRequest) -> ServiceResult<()> {
    let incomplete = request.discord_user_id.is_none()
        || request.channel_id.is_none()
        || request.message_id.is_none()
        || metadata_missing(&request.metadata);
    if !incomplete {
        return Ok(());
    }

    let sessions = state.sessions.clone();
    let id = request.session_id.clone();
    let Some(session) = blocking(move || sessions.get(&id)).await? else {
        log::warn!("No stored session {} to fill fields from", request.session_id);
        return Ok(());
    };

    request.discord_user_id = request.discord_user_id.take().or(session.discord_user_id);
    request.channel_id = request.channel_id.take().or(session.channel_id);
    request.message_id = request.message_id.take().or(session.message_id);
    if metadata_missing(&request.metadata) {
        request.metadata = Some(session.metadata);
    }
    Ok(())
}

/// Discord context required to notify the bot.
struct RelayContext {
    discord_user_id: String,
    channel_id: String,
    message_id: String,
    metadata: serde_json::Value,
}

impl RelayContext {
    fn validate(request: &SaveMaskRequest) -> ServiceResult<Self> {
        let mut missing = Vec::new();
        if request.discord_user_id.is_none() {
            missing.push("discordUserId");
        }
        if request.channel_id.is_none() {
            missing.push("channelId");
        }
        if request.message_id.is_none() {
            missing.push("messageId");
        }
        let has_original_url = request
            .metadata
            .as_ref()
            .and_then(|m| m.get("original_url"))
            .and_then(|url| url.as_str())
            .is_some_and(|url| !url.is_empty());
        if !has_original_url {
            missing.push("metadata.original_url");
        }

        match (
            &request.discord_user_id,
            &request.channel_id,
            &request.message_id,
            &request.metadata,
        ) {
            (Some(user), Some(channel), Some(message), Some(metadata)) if missing.is_empty() => {
                Ok(Self {
                    discord_user_id: user.clone(),
                    channel_id: channel.clone(),
                    message_id: message.clone(),
                    metadata: metadata.clone(),
                })
            }
            _ => Err(ServiceError::MissingFields {
                fields: missing.into_iter().map(String::from).collect(),
            }),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// `GET /storage/{*path}`
pub async fn get_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    log::debug!("Fetching blob from path: {}", path);
    let with_context =
        |err: ServiceError| ApiError::from(err).details(GET_IMAGE_DETAILS).path(path.clone());

    validate_blob_path(&path).map_err(with_context)?;
    let blobs = state.blobs.clone();
    let lookup = path.clone();
    let blob = blocking(move || blobs.get(&lookup))
        .await
        .map_err(with_context)?
        .ok_or_else(|| ApiError::from(ServiceError::blob_not_found(&path)))?;

    let content_type = blob
        .metadata
        .content_type
        .clone()
        .unwrap_or_else(|| PNG_CONTENT_TYPE.to_string());
    let cache_control = blob
        .metadata
        .cache_control
        .clone()
        .unwrap_or_else(|| BLOB_CACHE_CONTROL.to_string());

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CACHE_CONTROL, cache_control),
            (CONTENT_LENGTH, blob.size().to_string()),
        ],
        blob.bytes,
    )
        .into_response())
}
