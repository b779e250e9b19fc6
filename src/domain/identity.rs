//! Caller identity resolution.

use crate::error::AppError;

/// Stable identity of an authenticated caller.
///
/// May be empty when the credential verified but carried no identity claim;
/// the services treat an empty identity as a server-side fault.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallerIdentity(pub String);

impl CallerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_resolved(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

/// Resolves an opaque bearer credential into a [`CallerIdentity`].
///
/// # Errors
///
/// Implementations return [`AppError::Unauthorized`] when the credential
/// itself cannot be trusted (malformed, wrong signature).
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: &str) -> Result<CallerIdentity, AppError>;
}
