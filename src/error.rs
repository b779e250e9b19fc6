//! Application error type and its HTTP representation.
//!
//! Every failure in the service is classified into one [`AppError`] variant at
//! the point where it is detected. The variant decides the HTTP status and the
//! machine-readable `code` in the JSON error body:
//!
//! ```json
//! { "error": { "code": "mismatch", "message": "IP address mismatch", "details": {} } }
//! ```
//!
//! `Internal` details are only rendered when developer mode is enabled via
//! [`expose_internal_details`]; otherwise they are replaced by an empty object.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};

static EXPOSE_INTERNAL_DETAILS: AtomicBool = AtomicBool::new(false);

/// Enables or disables rendering of `Internal` error details in responses.
pub fn expose_internal_details(enabled: bool) {
    EXPOSE_INTERNAL_DETAILS.store(enabled, Ordering::Relaxed);
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed client input.
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    /// Store-level uniqueness conflict.
    #[error("{message}")]
    Conflict { message: String, details: Value },
    /// The referral already left the `pending` state.
    #[error("{message}")]
    AlreadyCompleted { message: String, details: Value },
    /// Network or device identity differs from the recorded fingerprint.
    #[error("{message}")]
    Mismatch { message: String, details: Value },
    /// Link age exceeds the expiration window.
    #[error("{message}")]
    Expired { message: String, details: Value },
    #[error("{message}")]
    Unauthorized { message: String, details: Value },
    /// Server fault: storage failure, unresolved identity, unsupported device,
    /// data-integrity anomaly.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn already_completed(message: impl Into<String>, details: Value) -> Self {
        Self::AlreadyCompleted {
            message: message.into(),
            details,
        }
    }
    pub fn mismatch(message: impl Into<String>, details: Value) -> Self {
        Self::Mismatch {
            message: message.into(),
            details,
        }
    }
    pub fn expired(message: impl Into<String>, details: Value) -> Self {
        Self::Expired {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Converts a failure reported by a repository into a server fault.
    ///
    /// The underlying message is kept in `details.reason` for operators and
    /// logged at `error` level.
    pub fn into_storage_fault(self, operation: &str) -> Self {
        tracing::error!(operation, error = %self, "Storage operation failed");

        Self::internal(operation.to_string(), json!({ "reason": self.to_string() }))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Mismatch { .. } | Self::Expired { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::AlreadyCompleted { .. } => StatusCode::CONFLICT,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::AlreadyCompleted { .. } => "already_completed",
            Self::Mismatch { .. } => "mismatch",
            Self::Expired { .. } => "expired",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let (message, details) = self.parts();
        ErrorInfo {
            code: self.code(),
            message: message.clone(),
            details: details.clone(),
        }
    }

    fn parts(&self) -> (&String, &Value) {
        match self {
            Self::Validation { message, details }
            | Self::NotFound { message, details }
            | Self::Conflict { message, details }
            | Self::AlreadyCompleted { message, details }
            | Self::Mismatch { message, details }
            | Self::Expired { message, details }
            | Self::Unauthorized { message, details }
            | Self::Internal { message, details } => (message, details),
        }
    }

    fn render(self, expose_internal: bool) -> Response {
        let status = self.status_code();
        let is_unauthorized = matches!(self, Self::Unauthorized { .. });

        let mut info = self.to_error_info();
        if matches!(self, Self::Internal { .. }) && !expose_internal {
            info.details = json!({});
        }

        let mut response = (status, Json(ErrorBody { error: info })).into_response();

        if is_unauthorized {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.render(EXPOSE_INTERNAL_DETAILS.load(Ordering::Relaxed))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": db.constraint() }),
                );
            }
        }

        AppError::internal("Database error", json!({ "reason": e.to_string() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}
