//! Request-level error type.
//!
//! Every stage of the webhook pipeline fails fast with one of these variants.
//! The handler turns them into a status code and a short plaintext body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::detail::FetchError;
use crate::process::ExtractionError;
use crate::queue::BrokerError;
use crate::storage::StorageError;

/// Signature authentication failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The `X-Hub-Signature-256` header is absent or unreadable.
    #[error("missing signature header")]
    MissingSignature,

    /// The provided signature does not match the body.
    #[error("signature mismatch")]
    SignatureMismatch,
}

/// Failure of a single webhook request.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("invalid JSON body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("archival failed: {0}")]
    Storage(#[from] StorageError),

    #[error("identifier extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("detail fetch failed for id {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: FetchError,
    },

    #[error("publish failed for id {id}: {source}")]
    Publish {
        id: String,
        #[source]
        source: BrokerError,
    },

    #[error("broker client initialization failed: {0}")]
    ClientInit(#[source] BrokerError),
}

impl WebhookError {
    /// HTTP status reported to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Authentication(AuthError::MissingSignature) => StatusCode::BAD_REQUEST,
            WebhookError::Authentication(AuthError::SignatureMismatch) => StatusCode::FORBIDDEN,
            WebhookError::Parse(_) => StatusCode::BAD_REQUEST,
            WebhookError::Storage(_)
            | WebhookError::Extraction(_)
            | WebhookError::Fetch { .. }
            | WebhookError::Publish { .. }
            | WebhookError::ClientInit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plaintext diagnostic returned in the response body.
    pub fn public_message(&self) -> String {
        match self {
            WebhookError::Authentication(AuthError::MissingSignature) => {
                "Missing signature".to_string()
            }
            WebhookError::Authentication(AuthError::SignatureMismatch) => {
                "Invalid signature".to_string()
            }
            WebhookError::Parse(_) => "Invalid JSON".to_string(),
            WebhookError::Storage(_) => {
                "Failed to upload full webhook payload to blob storage".to_string()
            }
            WebhookError::Extraction(_) => "Error processing IDs".to_string(),
            WebhookError::Fetch {
                id,
                source: FetchError::Status { .. },
            } => format!("Error fetching data for id {id}"),
            WebhookError::Fetch { id, .. } | WebhookError::Publish { id, .. } => {
                format!("Error processing id {id}")
            }
            WebhookError::ClientInit(_) => "Failed to initialize message broker client".to_string(),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}
