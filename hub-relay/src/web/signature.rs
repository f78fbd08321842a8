//! Webhook body signature verification.
//!
//! The platform signs every event body with HMAC-SHA256 keyed by the app
//! secret and sends it as `X-Hub-Signature-256: sha256=<hex digest>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Compute the signature header value the platform would send for `body`.
///
/// The digest is always taken over the exact raw bytes of the body.
pub fn expected_signature(app_secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verify the signature header against the raw request body.
///
/// # Returns
///
/// `Ok(())` if `provided` equals `sha256=<hex(HMAC_SHA256(app_secret, body))>`,
/// `MissingSignature` if there is no header, `SignatureMismatch` otherwise.
pub fn verify_hub_signature(
    app_secret: &str,
    body: &[u8],
    provided: Option<&str>,
) -> Result<(), AuthError> {
    let provided = match provided {
        Some(p) if !p.is_empty() => p,
        _ => {
            warn!(body_length = body.len(), "signature_header_missing");
            return Err(AuthError::MissingSignature);
        }
    };

    let expected = match expected_signature(app_secret, body) {
        Some(sig) => sig,
        None => {
            warn!("signature_invalid_key");
            return Err(AuthError::SignatureMismatch);
        }
    };

    if !constant_time_compare(&expected, provided) {
        warn!(
            expected_length = expected.len(),
            actual_length = provided.len(),
            "signature_mismatch"
        );
        return Err(AuthError::SignatureMismatch);
    }

    Ok(())
}

/// Compare two header values without short-circuiting on content.
///
/// Lengths are not secret; a length mismatch returns early.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
