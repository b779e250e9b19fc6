//! Repository trait for referral records.

use crate::domain::entities::{NewReferral, Referral, ReferralFilter};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for referrals.
///
/// The store is the only arbiter of concurrent writes: it enforces the unique
/// `public_id` key and performs completion as a single atomic update.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgReferralRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryReferralRepository`] - process-local store
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_referral.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferralRepository: Send + Sync {
    /// Reserves the next sequence value for a new referral.
    ///
    /// Reserved values are never reused, even if the subsequent insert fails.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn next_sequence_id(&self) -> Result<i64, AppError>;

    /// Inserts a referral in `pending` state with its public id already set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the sequence id or public id is taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_referral: NewReferral) -> Result<Referral, AppError>;

    /// Finds a referral by its public id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Referral>, AppError>;

    /// Sets the referee and marks the referral completed in one write.
    ///
    /// Returns `Ok(None)` if no referral has this public id. Completing an
    /// already completed referral overwrites its referee.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn complete(
        &self,
        public_id: &str,
        referee_id: &str,
    ) -> Result<Option<Referral>, AppError>;

    /// Lists one owner's referrals, newest first, narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_owner(
        &self,
        referrer_id: &str,
        filter: ReferralFilter,
    ) -> Result<Vec<Referral>, AppError>;

    /// Counts one owner's referrals matching `filter` (pagination ignored).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_by_owner(
        &self,
        referrer_id: &str,
        filter: ReferralFilter,
    ) -> Result<i64, AppError>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store cannot be queried.
    async fn ping(&self) -> Result<(), AppError>;
}
