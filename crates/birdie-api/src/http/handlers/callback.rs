//! LINE webhook receiver.
//!
//! Verifies the `x-line-signature` header against the raw body, translates
//! the payload, and hands the events to a background task. LINE only needs
//! a prompt 200; replies go out through the reply API as events finish.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use secrecy::ExposeSecret;

use birdie_infra::line::webhook::{SIGNATURE_HEADER, parse_events, verify_signature};
use birdie_types::event::InboundEvent;

use crate::http::error::AppError;
use crate::state::AppState;

/// Check the signature and parse the body into events.
pub(crate) fn verify_and_parse(
    secret: &[u8],
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Vec<InboundEvent>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing signature header".to_string()))?;
    verify_signature(secret, body, signature)?;
    Ok(parse_events(body)?)
}

/// POST /callback
pub async fn receive_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let events = verify_and_parse(
        state.channel_secret.expose_secret().as_bytes(),
        &headers,
        &body,
    )
    .inspect_err(|e| tracing::warn!(error = ?e, "rejected webhook request"))?;

    if events.is_empty() {
        return Ok(StatusCode::OK);
    }

    tracing::debug!(count = events.len(), "webhook events accepted");
    let router = state.router.clone();
    // Events in one delivery are handled in order; deliveries run concurrently.
    // Tracked so shutdown can wait for them.
    state.tasks.spawn(async move {
        for event in events {
            let dispatch = router.handle(event).await;
            tracing::debug!(?dispatch, "event handled");
        }
    });

    Ok(StatusCode::OK)
}
