use crate::AppState;
use crate::api::error::AppError;
use crate::models::WebhookBody;
use crate::utils::signature::{SIGNATURE_HEADER, verify_signature};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};

#[utoipa::path(
    post,
    path = "/callback",
    request_body(
        content = String,
        description = "LINE webhook event batch (raw JSON, signed)",
        content_type = "application/json"
    ),
    params(
        ("x-line-signature" = String, Header, description = "base64 HMAC-SHA256 of the body with the channel secret")
    ),
    responses(
        (status = 200, description = "Events handled"),
        (status = 400, description = "Missing or invalid signature"),
        (status = 500, description = "Body could not be parsed")
    ),
    tag = "webhook"
)]
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    if !verify_signature(&state.config.channel_secret, &body, signature) {
        return Err(AppError::InvalidSignature);
    }

    let payload: WebhookBody = serde_json::from_slice(&body)?;
    tracing::info!(
        "📨 {} event(s) for {}",
        payload.events.len(),
        payload.destination.as_deref().unwrap_or("unknown")
    );

    for event in &payload.events {
        state.dispatcher.handle_event(event).await;
    }

    Ok(StatusCode::OK)
}
