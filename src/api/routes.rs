//! API route configuration.
//!
//! Referral management endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`]. Link-open and claim validation are
//! public: the referee has no account yet when opening the link.

use crate::api::handlers::{
    complete_referral_handler, create_referral_handler, download_handler, list_referrals_handler,
    validate_cookie_handler, validate_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, put},
};

/// Referral routes, mounted under `/api` and protected by Bearer authentication.
///
/// # Endpoints
///
/// - `POST /referrals`                      - Create a referral for the caller
/// - `GET  /referrals`                      - List the caller's referrals (paginated)
/// - `PUT  /referrals/{public_id}/complete` - Complete a referral as the calling referee
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/referrals",
            get(list_referrals_handler).post(create_referral_handler),
        )
        .route(
            "/referrals/{public_id}/complete",
            put(complete_referral_handler),
        )
}

/// Public link-open and claim routes.
///
/// # Endpoints
///
/// - `GET /download/{public_id}`      - Record the device, redirect to its store
/// - `GET /validate/{fingerprint_id}` - Validate a claim by token
/// - `GET /validate`                  - Validate a claim using the `fp_id` cookie
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/download/{public_id}", get(download_handler))
        .route("/validate/{fingerprint_id}", get(validate_handler))
        .route("/validate", get(validate_cookie_handler))
}
