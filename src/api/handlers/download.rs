//! Handler for opening a referral link.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;

use crate::api::handlers::user_agent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookie::fingerprint_cookie;

/// Records the opening device and redirects it to its app store.
///
/// # Endpoint
///
/// `GET /download/{public_id}`
///
/// # Response
///
/// `302 Found` with:
///
/// ```text
/// Location: https://play.google.com/store/apps/details?id=...
/// Set-Cookie: fp_id=<token>; Path=/; HttpOnly
/// ```
///
/// # Errors
///
/// Returns 404 Not Found if the referral does not exist.
/// Returns 400 Bad Request if the link has expired.
/// Returns 500 if the device is neither iOS nor Android.
pub async fn download_handler(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let opened = state
        .fingerprint_service
        .open_link(&public_id, &addr.ip().to_string(), user_agent(&headers))
        .await?;

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, opened.redirect_target),
            (
                header::SET_COOKIE,
                fingerprint_cookie(&opened.fingerprint.fingerprint_id),
            ),
        ],
    ))
}
