//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::{error::AppError, state::AppState};

/// Resolves the caller identity from the `Authorization` header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <jwt>
/// ```
///
/// On success the resolved [`CallerIdentity`](crate::domain::identity::CallerIdentity)
/// is inserted into the request extensions for the handlers. A verified token
/// without an identity claim still passes; the services reject the empty
/// identity as a server fault.
///
/// # Errors
///
/// Returns `401 Unauthorized` (with `WWW-Authenticate: Bearer`) if the header
/// is missing or the token fails verification.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    let identity = st.identity_resolver.resolve(&token)?;
    parts.extensions.insert(identity);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
