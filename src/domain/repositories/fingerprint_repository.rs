//! Repository trait for device fingerprints.

use crate::domain::entities::{Fingerprint, NewFingerprint};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for fingerprints recorded at link-open time.
///
/// Fingerprints are append-only; there is no update or delete operation.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgFingerprintRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryFingerprintRepository`] - process-local store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FingerprintRepository: Send + Sync {
    /// Records a new fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the fingerprint id already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_fingerprint: NewFingerprint) -> Result<Fingerprint, AppError>;

    /// Finds a fingerprint by the token handed to the client.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_fingerprint_id(
        &self,
        fingerprint_id: &str,
    ) -> Result<Option<Fingerprint>, AppError>;

    /// Lists every fingerprint recorded for a referral, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_referral(&self, public_id: &str) -> Result<Vec<Fingerprint>, AppError>;
}
