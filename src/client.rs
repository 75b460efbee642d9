//! Editor-side HTTP client.
//!
//! Fetches a session, loads its source image into a [`MaskEditor`] and
//! uploads the finished mask. Used by the headless `submit` command and the
//! browser build.

use maskpaint_canvas::{MaskEditor, Size};

use crate::api::{ErrorBody, SaveMaskRequest, SaveMaskResponse, SessionView};
use crate::error::{ClientError, ClientResult};
use crate::params::{InpaintParameters, RawParameters};

const FETCH_SESSION_FAILED: &str = "Failed to fetch session data";
const FETCH_IMAGE_FAILED: &str = "Failed to load image";
const SAVE_MASK_FAILED: &str = "Failed to save mask";

/// Client for one maskpaint service.
#[derive(Debug, Clone)]
pub struct EditorClient {
    http: reqwest::Client,
    api_base: String,
}

impl EditorClient {
    /// Client for the service at `api_base` (e.g. `http://127.0.0.1:8787`).
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            api_base,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// `GET /api/session/{id}`
    pub async fn fetch_session(&self, session_id: &str) -> ClientResult<SessionView> {
        let url = format!("{}/api/session/{}", self.api_base, session_id);
        log::debug!("Fetching session data from {}", url);
        let response = self.http.get(&url).send().await?;
        let response = check_status(response, FETCH_SESSION_FAILED).await?;
        Ok(response.json().await?)
    }

    /// Download the bytes behind an image URL.
    pub async fn fetch_image(&self, url: &str) -> ClientResult<Vec<u8>> {
        log::debug!("Loading image from {}", url);
        let response = self.http.get(url).send().await?;
        let response = check_status(response, FETCH_IMAGE_FAILED).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// `POST /api/save-mask`
    pub async fn save_mask(&self, request: &SaveMaskRequest) -> ClientResult<SaveMaskResponse> {
        let url = format!("{}/api/save-mask", self.api_base);
        log::info!("Saving mask for session {}", request.session_id);
        let response = self.http.post(&url).json(request).send().await?;
        let response = check_status(response, SAVE_MASK_FAILED).await?;
        let saved: SaveMaskResponse = response.json().await?;
        log::info!("Mask saved: {}", saved.mask_url);
        Ok(saved)
    }

    /// Fetch a session and open its image on a canvas of the session size.
    pub async fn open_editor(&self, session_id: &str) -> ClientResult<(SessionView, MaskEditor)> {
        let session = self.fetch_session(session_id).await?;
        let image = self.fetch_image(&session.image_url).await?;
        let editor = MaskEditor::open(&image, Some(Size::new(session.width, session.height)))?;
        Ok((session, editor))
    }
}

/// Body for saving the editor's current mask.
///
/// Discord context is left out; the service fills it from the session.
pub fn mask_request(
    session_id: &str,
    editor: &MaskEditor,
    prompt: impl Into<String>,
    parameters: &InpaintParameters,
) -> ClientResult<SaveMaskRequest> {
    Ok(SaveMaskRequest {
        session_id: session_id.to_string(),
        mask_data: Some(editor.export_mask_data_url()?),
        prompt: Some(prompt.into()),
        parameters: Some(RawParameters::from(parameters)),
        ..Default::default()
    })
}

/// Pass through success responses, turn anything else into
/// [`ClientError::Status`] carrying the service's error message.
async fn check_status(
    response: reqwest::Response,
    context: &'static str,
) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|err| err.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string()
        });
    log::warn!("{context}: {} {message}", status.as_u16());
    Err(ClientError::Status {
        context,
        status: status.as_u16(),
        message,
    })
}
