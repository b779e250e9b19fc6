//! Handlers for the authenticated referral endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::pagination::PaginationMeta;
use crate::api::dto::referral::{
    CreateReferralRequest, ReferralListResponse, ReferralQueryParams, ReferralResponse,
};
use crate::domain::identity::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a referral owned by the caller.
///
/// # Endpoint
///
/// `POST /api/referrals`
///
/// # Request Body
///
/// ```json
/// { "code": "TESTCODE" }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "public_id": "r1",
///   "code": "TESTCODE",
///   "referrer_id": "u1",
///   "referee_id": null,
///   "status": "pending",
///   "created_at": "2025-07-16T00:58:49Z"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the code is missing, empty, or too long.
/// Returns 500 if the bearer token carried no identity.
pub async fn create_referral_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<CreateReferralRequest>,
) -> Result<(StatusCode, Json<ReferralResponse>), AppError> {
    payload.validate()?;

    let referral = state
        .referral_service
        .create_referral(&payload.code, caller.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(referral.into())))
}

/// Lists the caller's referrals, newest first.
///
/// # Endpoint
///
/// `GET /api/referrals`
///
/// # Query Parameters
///
/// - `status` (optional): `pending` or `completed`
/// - `code` (optional): exact referral code
/// - `page` (optional): Page number (default: 1)
/// - `page_size` (optional): Items per page (default: 25, 10..=1000)
///
/// # Errors
///
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn list_referrals_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(params): Query<ReferralQueryParams>,
) -> Result<Json<ReferralListResponse>, AppError> {
    let (offset, limit) = params
        .pagination
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let page = state
        .referral_service
        .list_referrals(caller.as_str(), params.to_filter(offset, limit))
        .await?;

    Ok(Json(ReferralListResponse {
        pagination: PaginationMeta::new(&params.pagination, page.total),
        items: page.items.into_iter().map(ReferralResponse::from).collect(),
    }))
}

/// Completes a referral on behalf of the calling referee.
///
/// # Endpoint
///
/// `PUT /api/referrals/{public_id}/complete`
///
/// The client is expected to have passed `GET /validate` first; this
/// endpoint does not re-check the fingerprint.
///
/// # Errors
///
/// Returns 404 Not Found if the referral does not exist.
/// Returns 500 if the bearer token carried no identity.
pub async fn complete_referral_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(public_id): Path<String>,
) -> Result<Json<ReferralResponse>, AppError> {
    let referral = state
        .referral_service
        .complete_referral(&public_id, caller.as_str())
        .await?;

    Ok(Json(referral.into()))
}
