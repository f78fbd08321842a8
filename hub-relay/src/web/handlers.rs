//! Webhook endpoint handlers.
//!
//! A single entry point serves both the subscription handshake and event
//! deliveries. Event deliveries go through, in order:
//! 1. Signature verification over the raw body
//! 2. JSON parsing
//! 3. The processing pipeline (archive, extract, fetch and publish)
//!
//! The first failure ends the request with a plaintext error.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{AuthError, WebhookError};
use crate::process::{Pipeline, PipelineOutcome};
use crate::web::signature::{verify_hub_signature, SIGNATURE_HEADER};
use crate::web::verification::{verify_subscription, Handshake, HubChallenge};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook endpoint for both GET (handshake) and POST (events).
pub async fn webhook(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let received_at = Utc::now();

    info!(
        body_length = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
        "webhook_received"
    );

    let hub = HubChallenge::from_pairs(&params);

    match verify_subscription(&hub, &state.config.verify_token) {
        Handshake::Accepted(challenge) => return (StatusCode::OK, challenge).into_response(),
        Handshake::Rejected => {
            return (StatusCode::FORBIDDEN, "Verification token mismatch").into_response()
        }
        Handshake::NotRequested => {}
    }

    match handle_event(&state, &headers, &body, received_at).await {
        Ok(outcome) => {
            info!(
                archive_key = %outcome.archive_key,
                published = outcome.published,
                "webhook_processed"
            );
            (StatusCode::OK, "Event received").into_response()
        }
        Err(e) => {
            error!(
                status_code = e.status_code().as_u16(),
                error = %e,
                "webhook_failed"
            );
            e.into_response()
        }
    }
}

/// Authenticate, parse and process one event delivery.
async fn handle_event(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    received_at: DateTime<Utc>,
) -> Result<PipelineOutcome, WebhookError> {
    // A header that is present but not visible ASCII can never match.
    let signature = match headers.get(SIGNATURE_HEADER) {
        Some(value) => Some(value.to_str().map_err(|_| {
            warn!(body_length = body.len(), "signature_header_not_ascii");
            AuthError::SignatureMismatch
        })?),
        None => None,
    };

    verify_hub_signature(&state.config.app_secret, body, signature)?;

    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, body_length = body.len(), "webhook_body_invalid_json");
        WebhookError::Parse(e)
    })?;

    let object = payload
        .get("object")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    info!(object = %object, "signature_validated");

    state.pipeline.run(&payload, received_at).await
}
