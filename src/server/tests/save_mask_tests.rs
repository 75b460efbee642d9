//! Tests for mask upload, session fallback and webhook relay.

use axum::http::StatusCode;
use serde_json::json;

use super::*;
use crate::codec::encode_png_data_url;
use crate::session::mask_path;

fn bot_session_body() -> serde_json::Value {
    json!({
        "image_data": encode_png_data_url(&png_bytes(64, 64)),
        "discord_user_id": "user-1",
        "channel_id": "chan-2",
        "message_id": "msg-3",
        "metadata": { "original_url": "https://cdn.example/source.png", "seed": 7 }
    })
}

fn mask_data_url() -> String {
    let mask = maskpaint_canvas::Mask::empty(maskpaint_canvas::Size::new(64, 64));
    mask.to_data_url().unwrap()
}

#[tokio::test]
async fn test_save_mask_fills_context_and_relays() {
    let (hook_url, received) = spawn_webhook_receiver(StatusCode::OK).await;
    let mut state = test_state();
    state.webhook = WebhookRelay::new(Some(hook_url));
    let app = app(state.clone());

    let id = start_session(&app, bot_session_body()).await;
    let body = json!({
        "sessionId": id,
        "maskData": mask_data_url(),
        "prompt": "a red balloon",
        "parameters": { "denoise": 5.0, "steps": 4, "scheduler": "euler_a" }
    });
    let response = send(&app, post_json("/api/save-mask", &body)).await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    let expected_url = format!("{ORIGIN}/storage/masks/{id}.png");
    assert_eq!(
        response.json(),
        json!({ "status": "success", "maskUrl": expected_url })
    );
    assert!(state.blobs.get(&mask_path(&id)).unwrap().is_some());

    let payloads = received.lock().unwrap().clone();
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];
    assert_eq!(payload["sessionId"], id);
    assert_eq!(payload["maskUrl"], expected_url);
    assert_eq!(payload["prompt"], "a red balloon");
    assert_eq!(payload["discordUserId"], "user-1");
    assert_eq!(payload["channelId"], "chan-2");
    assert_eq!(payload["messageId"], "msg-3");
    assert_eq!(payload["metadata"]["seed"], 7);
    assert_eq!(
        payload["parameters"],
        json!({ "denoise": 1.0, "steps": 10, "guidance": 7.5, "scheduler": "euler_a" })
    );
}

#[tokio::test]
async fn test_request_fields_override_session() {
    let (hook_url, received) = spawn_webhook_receiver(StatusCode::OK).await;
    let mut state = test_state();
    state.webhook = WebhookRelay::new(Some(hook_url));
    let app = app(state);

    let id = start_session(&app, bot_session_body()).await;
    let body = json!({
        "sessionId": id,
        "maskData": mask_data_url(),
        "channelId": "other-channel"
    });
    let response = send(&app, post_json("/api/save-mask", &body)).await;
    assert_eq!(response.status, StatusCode::OK);

    let payload = received.lock().unwrap()[0].clone();
    assert_eq!(payload["channelId"], "other-channel");
    assert_eq!(payload["discordUserId"], "user-1");
    assert_eq!(payload["prompt"], "");
    assert_eq!(payload["parameters"]["scheduler"], "karras");
}

#[tokio::test]
async fn test_webhook_failure_does_not_fail_save() {
    let (hook_url, received) = spawn_webhook_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    let mut state = test_state();
    state.webhook = WebhookRelay::new(Some(hook_url));
    let app = app(state);

    let id = start_session(&app, bot_session_body()).await;
    let body = json!({ "sessionId": id, "maskData": mask_data_url() });
    let response = send(&app, post_json("/api/save-mask", &body)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_save_without_webhook_still_succeeds() {
    let app = app(test_state());
    let id = start_session(&app, bot_session_body()).await;
    let body = json!({ "sessionId": id, "maskData": mask_data_url() });
    let response = send(&app, post_json("/api/save-mask", &body)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_resave_overwrites_mask() {
    let state = test_state();
    let app = app(state.clone());
    let id = start_session(&app, bot_session_body()).await;

    for data in [encode_png_data_url(b"first"), encode_png_data_url(b"second!")] {
        let body = json!({ "sessionId": id, "maskData": data });
        let response = send(&app, post_json("/api/save-mask", &body)).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    let blob = state.blobs.get(&mask_path(&id)).unwrap().unwrap();
    assert_eq!(blob.bytes, b"second!");
}

#[tokio::test]
async fn test_missing_mask_data() {
    let app = app(test_state());
    let response = send(
        &app,
        post_json("/api/save-mask", &json!({ "sessionId": "abc" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json(),
        json!({ "error": "No mask data provided", "details": "Error saving mask image" })
    );
}

#[tokio::test]
async fn test_empty_mask_data() {
    let app = app(test_state());
    let body = json!({ "sessionId": "abc", "maskData": "data:image/png;base64," });
    let response = send(&app, post_json("/api/save-mask", &body)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Empty mask data received");
}

#[tokio::test]
async fn test_invalid_session_id_rejected() {
    let app = app(test_state());
    let body = json!({ "sessionId": "../../etc", "maskData": mask_data_url() });
    let response = send(&app, post_json("/api/save-mask", &body)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_context_is_reported_after_mask_is_stored() {
    let state = test_state();
    let app = app(state.clone());
    let id = start_session(
        &app,
        json!({ "image_data": encode_png_data_url(&png_bytes(64, 64)), "discord_user_id": "u" }),
    )
    .await;

    let body = json!({ "sessionId": id, "maskData": mask_data_url() });
    let response = send(&app, post_json("/api/save-mask", &body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["error"],
        "Missing required fields: channelId, messageId, metadata.original_url"
    );
    assert!(state.blobs.get(&mask_path(&id)).unwrap().is_some());
}

#[tokio::test]
async fn test_explicit_context_without_session() {
    let app = app(test_state());
    let body = json!({
        "sessionId": "no-such-session",
        "maskData": mask_data_url(),
        "discordUserId": 1,
        "channelId": 2,
        "messageId": 3,
        "metadata": { "original_url": "https://cdn.example/x.png" }
    });
    let response = send(&app, post_json("/api/save-mask", &body)).await;
    assert_eq!(response.status, StatusCode::OK);
}
