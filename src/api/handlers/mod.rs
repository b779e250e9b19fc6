//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

use axum::http::{HeaderMap, header};

pub mod download;
pub mod health;
pub mod referrals;
pub mod validate;

pub use download::download_handler;
pub use health::health_handler;
pub use referrals::{complete_referral_handler, create_referral_handler, list_referrals_handler};
pub use validate::{validate_cookie_handler, validate_handler};

/// Observed user agent; empty when the header is absent or not valid UTF-8.
pub(crate) fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
