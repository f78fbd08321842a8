//! reqwest-backed client for the detail API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{error, info};
use url::Url;

use super::{DetailSource, FetchError};
use crate::util::build_http_client;

/// Authenticated GET-by-id client.
///
/// Requests `<base>/<id>/?access_token=<token>` and expects a JSON body.
#[derive(Clone)]
pub struct DetailClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl DetailClient {
    /// Create a client with its own connection pool.
    pub fn new(base_url: &str, access_token: String, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self::with_client(build_http_client(timeout)?, base_url, access_token))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str, access_token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// URL of the detail resource for `id`.
    ///
    /// The id is appended as one percent-encoded path segment followed by
    /// an empty segment for the trailing slash.
    pub fn detail_url(&self, id: &str) -> Result<Url, FetchError> {
        if id == "." || id == ".." {
            return Err(FetchError::InvalidUrl(format!("id {id:?} is not a path segment")));
        }

        let mut url =
            Url::parse(&self.base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(id)
            .push("");
        Ok(url)
    }
}

#[async_trait]
impl DetailSource for DetailClient {
    async fn fetch_detail(&self, id: &str) -> Result<Value, FetchError> {
        let url = self.detail_url(id).map_err(|e| {
            error!(id = %id, error = %e, "detail_fetch_invalid_url");
            e
        })?;

        info!(id = %id, url = %url, "detail_fetch_starting");

        let response = self
            .client
            .get(url)
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!(id = %id, error = %e, "detail_fetch_timeout");
                } else {
                    error!(id = %id, error = %e, "detail_fetch_request_error");
                }
                FetchError::Request(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(id = %id, status_code = status.as_u16(), "detail_fetch_bad_status");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let record: Value = serde_json::from_slice(&body).map_err(|e| {
            error!(id = %id, error = %e, body_length = body.len(), "detail_fetch_decode_error");
            FetchError::Decode(e.to_string())
        })?;

        info!(id = %id, body_length = body.len(), "detail_fetch_complete");

        Ok(record)
    }
}
