//! Subscription handshake.
//!
//! When a subscription is created the platform sends
//! `?hub.mode=subscribe&hub.challenge=<value>&hub.verify_token=<token>`
//! and expects the challenge echoed back if the token is ours.

use tracing::{info, warn};

/// Mode value identifying a handshake request.
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Handshake query parameters. All are optional; event deliveries carry none.
#[derive(Debug, Default)]
pub struct HubChallenge {
    pub mode: Option<String>,
    pub challenge: Option<String>,
    pub verify_token: Option<String>,
}

impl HubChallenge {
    /// Collect the `hub.*` parameters from decoded query pairs.
    ///
    /// When a key repeats, its first value wins. Unrelated keys are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        };

        Self {
            mode: first("hub.mode"),
            challenge: first("hub.challenge"),
            verify_token: first("hub.verify_token"),
        }
    }
}

/// Result of checking a request for a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// Not a handshake; continue with event processing.
    NotRequested,
    /// Token matched; respond with the challenge.
    Accepted(String),
    /// Token did not match.
    Rejected,
}

/// Check a request's query for a subscription handshake.
pub fn verify_subscription(query: &HubChallenge, expected_token: &str) -> Handshake {
    let challenge = match (query.mode.as_deref(), query.challenge.as_deref()) {
        (Some(SUBSCRIBE_MODE), Some(challenge)) if !challenge.is_empty() => challenge,
        _ => return Handshake::NotRequested,
    };

    info!("verification_request_received");

    if query.verify_token.as_deref() == Some(expected_token) {
        info!("verification_token_matched");
        Handshake::Accepted(challenge.to_string())
    } else {
        warn!(has_token = query.verify_token.is_some(), "verification_token_mismatch");
        Handshake::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(mode: Option<&str>, challenge: Option<&str>, token: Option<&str>) -> HubChallenge {
        HubChallenge {
            mode: mode.map(String::from),
            challenge: challenge.map(String::from),
            verify_token: token.map(String::from),
        }
    }

    #[test]
    fn test_matching_token_echoes_challenge() {
        let q = query(Some("subscribe"), Some("1158201444"), Some("verify-me"));
        assert_eq!(
            verify_subscription(&q, "verify-me"),
            Handshake::Accepted("1158201444".to_string())
        );
    }

    #[test]
    fn test_mismatched_token_rejected() {
        let q = query(Some("subscribe"), Some("1158201444"), Some("Verify-Me"));
        assert_eq!(verify_subscription(&q, "verify-me"), Handshake::Rejected);

        let q = query(Some("subscribe"), Some("1158201444"), None);
        assert_eq!(verify_subscription(&q, "verify-me"), Handshake::Rejected);
    }

    #[test]
    fn test_non_handshake_falls_through() {
        assert_eq!(
            verify_subscription(&HubChallenge::default(), "verify-me"),
            Handshake::NotRequested
        );
        let q = query(Some("unsubscribe"), Some("1"), Some("verify-me"));
        assert_eq!(verify_subscription(&q, "verify-me"), Handshake::NotRequested);
        let q = query(Some("subscribe"), Some(""), Some("verify-me"));
        assert_eq!(verify_subscription(&q, "verify-me"), Handshake::NotRequested);
        let q = query(Some("subscribe"), None, Some("verify-me"));
        assert_eq!(verify_subscription(&q, "verify-me"), Handshake::NotRequested);
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_pairs_reads_dotted_names() {
        let q = HubChallenge::from_pairs(&pairs(&[
            ("hub.mode", "subscribe"),
            ("hub.challenge", "abc"),
            ("hub.verify_token", "t"),
            ("other", "x"),
        ]));
        assert_eq!(q.mode.as_deref(), Some("subscribe"));
        assert_eq!(q.challenge.as_deref(), Some("abc"));
        assert_eq!(q.verify_token.as_deref(), Some("t"));
    }

    #[test]
    fn test_from_pairs_first_value_wins() {
        let q = HubChallenge::from_pairs(&pairs(&[
            ("hub.mode", "subscribe"),
            ("hub.challenge", "42"),
            ("hub.verify_token", "verify-me"),
            ("hub.verify_token", "other"),
            ("hub.challenge", "43"),
        ]));
        assert_eq!(
            verify_subscription(&q, "verify-me"),
            Handshake::Accepted("42".to_string())
        );
    }
}
