//! Shared helpers.

pub mod http;

pub use http::{build_http_client, USER_AGENT};
