//! # API Key Authentication
//!
//! Optional shared-secret protection for the lesson API. Widget hosts
//! that expose the server beyond localhost set `LESSONLAB_API_KEY`; every
//! request except `/health` must then carry the key in the
//! `Authorization` header, either as `Bearer <key>` or bare. With the
//! variable unset the API is open.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// The configured API key, if any.
///
/// `None` when `LESSONLAB_API_KEY` is unset or empty, which disables
/// authentication entirely.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var("LESSONLAB_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

/// Constant-time key comparison.
///
/// Both sides are padded to a common length so `ct_eq` always runs over
/// the same number of bytes; the length check happens after, so neither
/// content nor length leaks through timing.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

/// Authentication middleware layered over every route when a key is
/// configured. `/health` stays open for load-balancer checks.
pub async fn api_key_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(expected) = get_api_key_from_env() else {
        return Ok(next.run(request).await);
    };

    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            let provided = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
            if keys_match(provided, &expected) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_api_key",
                    "Rejecting request: wrong API key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Rejecting request: no Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_env_key_disables_auth() {
        // SAFETY: This is a unit test running in isolation.
        unsafe { std::env::remove_var("LESSONLAB_API_KEY") };
        assert!(get_api_key_from_env().is_none());
    }

    #[test]
    fn key_comparison_requires_exact_match() {
        assert!(keys_match("secret-key", "secret-key"));
        assert!(!keys_match("secret-key", "secret-keY"));
        // A shared prefix is not enough
        assert!(!keys_match("secret", "secret-key"));
        assert!(!keys_match("secret-key-extended", "secret-key"));
        assert!(!keys_match("", "secret-key"));
    }
}
