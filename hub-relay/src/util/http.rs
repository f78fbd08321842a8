//! Outbound HTTP client construction.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = concat!("hub-relay/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client whose requests are bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("hub-relay/"));
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_millis(500)).is_ok());
    }
}
