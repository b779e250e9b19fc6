//! Cookie helpers for the fingerprint correlation token.

use axum::http::{HeaderMap, header::COOKIE};

/// Name of the cookie carrying the fingerprint token.
pub const FINGERPRINT_COOKIE: &str = "fp_id";

/// Builds the `Set-Cookie` value handing a fingerprint token to the client.
pub fn fingerprint_cookie(fingerprint_id: &str) -> String {
    format!("{FINGERPRINT_COOKIE}={fingerprint_id}; Path=/; HttpOnly")
}

/// Reads a cookie value from the request headers.
///
/// Handles multiple `Cookie` headers and multiple pairs per header.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if key == name => Some(value.to_string()),
                _ => None,
            }
        })
}
