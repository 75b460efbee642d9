//! Relay of completed masks to the Discord bot webhook.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::params::InpaintParameters;

/// Body POSTed to the bot when a mask is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub session_id: String,
    pub mask_url: String,
    pub prompt: String,
    pub parameters: InpaintParameters,
    pub metadata: serde_json::Value,
    pub discord_user_id: String,
    pub channel_id: String,
    pub message_id: String,
}

/// What happened to a relay attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// No webhook URL configured
    Skipped,
    /// The bot answered with a success status
    Delivered { status: u16 },
    /// Transport error or non-success status
    Failed { reason: String },
}

impl WebhookOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, WebhookOutcome::Delivered { .. })
    }
}

/// Sends [`WebhookPayload`]s to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookRelay {
    /// Default time allowed for the bot to answer.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a relay; `None` or an empty URL disables relaying.
    pub fn new(url: Option<String>) -> Self {
        let url = url.filter(|u| !u.trim().is_empty());
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                log::warn!("Falling back to default HTTP client: {err}");
                reqwest::Client::new()
            });
        Self { client, url }
    }

    /// A relay that never sends anything.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Whether a webhook URL is configured.
    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// POST `payload` as JSON.
    ///
    /// Failures are logged and returned as [`WebhookOutcome::Failed`]; they
    /// never abort the save that triggered them.
    pub async fn send(&self, payload: &WebhookPayload) -> WebhookOutcome {
        let Some(url) = &self.url else {
            log::debug!("Webhook not configured, skipping relay for {}", payload.session_id);
            return WebhookOutcome::Skipped;
        };

        log::info!(
            "Sending webhook for session {} with parameters {:?}",
            payload.session_id,
            payload.parameters
        );

        let response = match self.client.post(url).json(payload).send().await {
            Ok(response) => response,
            Err(err) => {
                log::error!("Webhook request failed: {err}");
                return WebhookOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        let status = response.status();
        if status.is_success() {
            return WebhookOutcome::Delivered {
                status: status.as_u16(),
            };
        }

        let body = response.text().await.unwrap_or_default();
        log::error!("Webhook failed: {status} {body}");
        WebhookOutcome::Failed {
            reason: format!("status {status}: {body}"),
        }
    }
}
