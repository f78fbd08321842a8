//! Web server module for handling inbound webhooks.
//!
//! This module provides:
//! - The subscription handshake and event endpoint
//! - Body signature verification
//! - A health check

pub mod handlers;
pub mod signature;
pub mod verification;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use handlers::{health, webhook, AppState, HealthResponse};
pub use signature::{expected_signature, verify_hub_signature, SIGNATURE_HEADER};
pub use verification::{verify_subscription, Handshake, HubChallenge};

/// Path of the webhook endpoint.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(WEBHOOK_PATH, get(webhook).post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
