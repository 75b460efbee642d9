//! HTTP service: session creation, session lookup, mask upload and blob
//! serving.
//!
//! ## Routes
//!
//! - `GET  /api/test` - liveness text
//! - `POST /api/start-session` - bot uploads a source image
//! - `GET  /api/session/{id}` - editor fetches canvas info
//! - `POST /api/save-mask` - editor uploads the mask, bot gets notified
//! - `GET  /storage/{*path}` - stored images and masks
//!
//! Every response carries permissive CORS headers and any `OPTIONS`
//! request is answered with `204 No Content`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, HOST,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::ErrorBody;
use crate::config::{ServerConfig, StorageConfig};
use crate::error::{ServiceError, ServiceResult};
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};
use crate::storage::{BlobStore, FsBlobStore, MemoryBlobStore};
use crate::webhook::WebhookRelay;

mod handlers;

#[cfg(test)]
mod tests;

// ============================================================================
// Shared state
// ============================================================================

/// Handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub webhook: WebhookRelay,
    /// Origin for returned URLs; None derives it from the Host header
    pub public_origin: Option<String>,
    pub session_ttl: Duration,
}

impl AppState {
    /// Build stores and relay from configuration.
    pub fn from_config(config: &ServerConfig) -> ServiceResult<Self> {
        let (sessions, blobs): (Arc<dyn SessionStore>, Arc<dyn BlobStore>) = match &config.storage
        {
            StorageConfig::Memory => {
                log::warn!("Using in-memory storage; sessions and masks are lost on restart");
                (
                    Arc::new(MemorySessionStore::new()),
                    Arc::new(MemoryBlobStore::new()),
                )
            }
            StorageConfig::Filesystem { data_dir } => (
                Arc::new(FileSessionStore::open(data_dir.join("sessions"))?),
                Arc::new(FsBlobStore::open(data_dir.join("blobs"))?),
            ),
        };

        Ok(Self {
            sessions,
            blobs,
            webhook: WebhookRelay::new(config.webhook_url.clone()),
            public_origin: config.public_origin(),
            session_ttl: Duration::from_secs(config.session_ttl_secs),
        })
    }

    /// Origin to prefix storage URLs with.
    pub(crate) fn origin(&self, headers: &HeaderMap) -> String {
        if let Some(origin) = &self.public_origin {
            return origin.clone();
        }
        let host = headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        format!("http://{host}")
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the service router.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/test", get(handlers::test_route))
        .route("/api/start-session", post(handlers::start_session))
        .route("/api/session/{id}", get(handlers::get_session))
        .route("/api/save-mask", post(handlers::save_mask))
        .route("/storage/{*path}", get(handlers::get_blob))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Answer preflights and stamp CORS headers on every response.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Origin"),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

/// Run the service until Ctrl+C.
pub async fn serve(config: ServerConfig) -> ServiceResult<()> {
    let state = AppState::from_config(&config)?;
    spawn_session_sweeper(
        Arc::clone(&state.sessions),
        Duration::from_secs(config.sweep_interval_secs),
    );

    if !state.webhook.is_enabled() {
        log::warn!("No webhook URL configured; saved masks will not be relayed");
    }

    let app = router(state, config.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    log::info!("🚀 maskpaint listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

/// Periodically drop expired sessions. A zero interval disables sweeping.
pub fn spawn_session_sweeper(
    sessions: Arc<dyn SessionStore>,
    every: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    if every.is_zero() {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sessions.purge_expired() {
                Ok(0) => log::trace!("Session sweep: nothing expired"),
                Ok(n) => log::info!("Session sweep: removed {n} expired sessions"),
                Err(err) => log::warn!("Session sweep failed: {err}"),
            }
        }
    }))
}

// ============================================================================
// Error responses
// ============================================================================

/// A [`ServiceError`] with optional context, rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError {
    error: ServiceError,
    details: Option<&'static str>,
    path: Option<String>,
}

impl ApiError {
    /// Attach a `details` line to the body.
    pub fn details(mut self, details: &'static str) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach the request path to the body.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    fn status(&self) -> StatusCode {
        if self.error.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.error.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self {
            error,
            details: None,
            path: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self.error);
        } else {
            log::debug!("Request rejected ({status}): {}", self.error);
        }

        let body = ErrorBody {
            error: self.error.to_string(),
            details: self.details.map(str::to_string),
            path: self.path,
        };
        (status, Json(body)).into_response()
    }
}
