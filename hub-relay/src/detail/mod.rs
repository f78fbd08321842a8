//! External detail API.
//!
//! Each extracted identifier is resolved to a JSON record through a
//! [`DetailSource`]. The production implementation is [`DetailClient`].

pub mod client;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use client::DetailClient;

/// Errors raised while fetching a detail record.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered with something other than 200 OK.
    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// No request URL could be built for the id.
    #[error("cannot build detail url: {0}")]
    InvalidUrl(String),

    /// The body was not valid JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Resolves an identifier to its detail record.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, id: &str) -> Result<Value, FetchError>;
}
