//! HubRelay - webhook receiver for platform event notifications.
//!
//! The library holds everything the `hub-relay` binary serves:
//! - `web`: handshake, signature verification and the HTTP endpoint
//! - `process`: archival, identifier extraction and detail relay
//! - `storage`, `detail`, `queue`: the blob store, detail API and topic
//!   broker the pipeline talks to
//!
//! ## Architecture
//!
//! ```text
//! Platform → /webhook → verify → archive (blob) → extract ids
//!                                         → fetch detail (API) → publish (topic)
//! ```

pub mod config;
pub mod detail;
pub mod error;
pub mod process;
pub mod queue;
pub mod storage;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use detail::{DetailClient, DetailSource, FetchError};
pub use error::{AuthError, WebhookError};
pub use process::{extract_ids, relay_details, Pipeline, PipelineOutcome};
pub use queue::{AmqpTopicBroker, BrokerError, TopicBroker, TopicMessage, TopicSender};
pub use storage::{archive_key, archive_payload, AzureBlobStore, BlobStore, StorageError};
pub use web::{router, AppState};
