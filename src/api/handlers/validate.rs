//! Handlers for claim validation.

use axum::{
    Json,
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
};
use serde_json::json;
use std::net::SocketAddr;

use crate::api::dto::fingerprint::FingerprintResponse;
use crate::api::handlers::user_agent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookie::{FINGERPRINT_COOKIE, read_cookie};

/// Validates a fingerprint token passed in the path.
///
/// # Endpoint
///
/// `GET /validate/{fingerprint_id}`
///
/// # Errors
///
/// - 404 if the token is unknown
/// - 400 `mismatch` if the caller's IP or user agent differ from the recorded ones
/// - 409 `already_completed` if the referral was already completed
pub async fn validate_handler(
    State(state): State<AppState>,
    Path(fingerprint_id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<FingerprintResponse>, AppError> {
    validate(&state, &fingerprint_id, addr, &headers).await
}

/// Validates the fingerprint token carried by the `fp_id` cookie.
///
/// # Endpoint
///
/// `GET /validate`
///
/// # Errors
///
/// Returns 400 Bad Request if the cookie is absent; otherwise the same
/// errors as [`validate_handler`].
pub async fn validate_cookie_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<FingerprintResponse>, AppError> {
    let fingerprint_id = read_cookie(&headers, FINGERPRINT_COOKIE).ok_or_else(|| {
        AppError::bad_request(
            "Device fingerprint is empty",
            json!({ "cookie": FINGERPRINT_COOKIE }),
        )
    })?;

    validate(&state, &fingerprint_id, addr, &headers).await
}

async fn validate(
    state: &AppState,
    fingerprint_id: &str,
    addr: SocketAddr,
    headers: &HeaderMap,
) -> Result<Json<FingerprintResponse>, AppError> {
    let fingerprint = state
        .fingerprint_service
        .validate_claim(fingerprint_id, &addr.ip().to_string(), user_agent(headers))
        .await?;

    Ok(Json(fingerprint.into()))
}
