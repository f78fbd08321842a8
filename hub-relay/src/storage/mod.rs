//! Payload archival.
//!
//! Every authenticated request is written once, pretty-printed, to object
//! storage under a key derived from its arrival second. A second request in
//! the same second overwrites the first.

pub mod azure;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use thiserror::Error;
use tracing::{error, info};

pub use azure::{AzureBlobStore, StorageAccount};

/// Content type of archived payloads.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/json";

/// Errors raised by blob storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("invalid blob url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("storage returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Write-by-key object storage with overwrite semantics.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

/// Archive key for a request received at `received_at`.
pub fn archive_key(received_at: DateTime<Utc>) -> String {
    format!("full_webhook_payload_{}.json", received_at.timestamp())
}

/// Render a payload with four-space indentation.
pub fn pretty_json(payload: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    payload.serialize(&mut ser)?;
    Ok(out)
}

/// Write the full payload to `store` and return the key it was written under.
pub async fn archive_payload(
    store: &dyn BlobStore,
    payload: &Value,
    received_at: DateTime<Utc>,
) -> Result<String, StorageError> {
    let key = archive_key(received_at);
    let body = pretty_json(payload)?;
    let body_length = body.len();

    if let Err(e) = store.put_object(&key, body, ARCHIVE_CONTENT_TYPE).await {
        error!(key = %key, error = %e, "archive_upload_failed");
        return Err(e);
    }

    info!(key = %key, body_length = body_length, "archive_uploaded");

    Ok(key)
}
