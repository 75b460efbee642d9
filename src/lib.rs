//! maskpaint - mask painting service for Discord-driven inpainting
//!
//! The bot uploads a source image and gets back a session id; the editor
//! fetches the session, paints a mask with [`maskpaint_canvas`] and uploads
//! it; the service stores the mask and relays it to the bot's webhook
//! together with the prompt and sampling parameters.
//!
//! Native builds carry the HTTP service and the `maskpaint` CLI. The wasm
//! build exposes the editor to the browser.

pub mod api;
pub mod client;
pub mod codec;
pub mod constants;
pub mod error;
pub mod params;
pub mod session;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
#[cfg(not(target_arch = "wasm32"))]
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;
#[cfg(not(target_arch = "wasm32"))]
pub mod storage;
#[cfg(not(target_arch = "wasm32"))]
pub mod webhook;

pub use client::EditorClient;
pub use error::{ClientError, ClientResult, ServiceError, ServiceResult};
pub use params::{InpaintParameters, Scheduler};
pub use session::Session;

#[cfg(not(target_arch = "wasm32"))]
pub use config::ServerConfig;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
