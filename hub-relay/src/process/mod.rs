//! Event processing pipeline.
//!
//! Runs after a request has been authenticated and parsed:
//!
//! ```text
//! payload → archive_payload() → extract_ids() → relay_details()
//! ```
//!
//! Each stage runs only if the previous one succeeded.

pub mod extract;
pub mod relay;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::detail::DetailSource;
use crate::error::WebhookError;
use crate::queue::TopicBroker;
use crate::storage::{archive_payload, BlobStore};

pub use extract::{extract_ids, ExtractionError};
pub use relay::relay_details;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Key the payload was archived under
    pub archive_key: String,
    /// Number of identifiers extracted
    pub ids_extracted: usize,
    /// Number of detail records published
    pub published: usize,
}

/// Archival, extraction and relay wired to their collaborators.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn BlobStore>,
    details: Arc<dyn DetailSource>,
    broker: Arc<dyn TopicBroker>,
    extract_field: String,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn BlobStore>,
        details: Arc<dyn DetailSource>,
        broker: Arc<dyn TopicBroker>,
        extract_field: String,
    ) -> Self {
        Self {
            store,
            details,
            broker,
            extract_field,
        }
    }

    /// Process one authenticated payload received at `received_at`.
    pub async fn run(
        &self,
        payload: &Value,
        received_at: DateTime<Utc>,
    ) -> Result<PipelineOutcome, WebhookError> {
        let archive_key = archive_payload(self.store.as_ref(), payload, received_at).await?;

        let ids = extract_ids(payload, &self.extract_field).map_err(|e| {
            tracing::error!(error = %e, "ids_extraction_failed");
            WebhookError::Extraction(e)
        })?;

        let published = relay_details(&ids, self.details.as_ref(), self.broker.as_ref()).await?;

        let outcome = PipelineOutcome {
            archive_key,
            ids_extracted: ids.len(),
            published,
        };

        info!(
            archive_key = %outcome.archive_key,
            ids_extracted = outcome.ids_extracted,
            published = outcome.published,
            "pipeline_complete"
        );

        Ok(outcome)
    }
}
