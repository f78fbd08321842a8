//! Topic publishing.
//!
//! A [`TopicBroker`] hands out a fresh [`TopicSender`] per request. The
//! sender publishes fetched detail records one at a time and is closed once
//! the request is done with it, whatever the outcome.

pub mod publisher;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use publisher::AmqpTopicBroker;
pub use types::{TopicMessage, MESSAGE_CONTENT_TYPE};

/// Errors raised by the message broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("broker operation timed out after {0}ms")]
    Timeout(u64),

    #[error("broker rejected message {message_id}")]
    Nacked { message_id: String },

    #[error("sender already closed")]
    Closed,

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Source of per-request topic senders.
#[async_trait]
pub trait TopicBroker: Send + Sync {
    async fn open_sender(&self) -> Result<Box<dyn TopicSender>, BrokerError>;
}

/// Publishes messages to one topic until closed.
#[async_trait]
pub trait TopicSender: Send {
    async fn send(&mut self, message: &TopicMessage) -> Result<(), BrokerError>;

    /// Release the underlying connection. Errors are logged, not returned.
    async fn close(&mut self);
}
