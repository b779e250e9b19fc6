//! Referral lifecycle: creation, completion, owner listings.

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::clock::Clock;
use crate::domain::entities::{NewReferral, Referral, ReferralFilter};
use crate::domain::repositories::ReferralRepository;
use crate::error::AppError;
use crate::utils::public_id;

/// One page of an owner's referrals.
#[derive(Debug, Clone)]
pub struct ReferralPage {
    pub items: Vec<Referral>,
    pub total: i64,
}

/// Service owning the `Pending -> Completed` state machine.
///
/// The public id is computed from a sequence value reserved before insert,
/// so a referral is never stored without one.
pub struct ReferralService<R: ReferralRepository + ?Sized> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R: ReferralRepository + ?Sized> ReferralService<R> {
    /// Creates a new referral service.
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Creates a pending referral owned by `referrer_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `code` is empty or whitespace.
    /// Returns [`AppError::Internal`] if `referrer_id` is empty (identity
    /// resolution is misconfigured) or on any storage failure. Storage
    /// failures are not retried.
    pub async fn create_referral(&self, code: &str, referrer_id: &str) -> Result<Referral, AppError> {
        if code.trim().is_empty() {
            warn!("Referral code is empty");
            return Err(AppError::bad_request(
                "Referral code is empty",
                json!({ "field": "code" }),
            ));
        }

        if referrer_id.trim().is_empty() {
            error!("Empty referrer user id");
            return Err(AppError::internal("Empty user id", json!({})));
        }

        let sequence_id = self
            .repository
            .next_sequence_id()
            .await
            .map_err(|e| e.into_storage_fault("Reserving referral id failed"))?;

        let public_id = public_id::encode(sequence_id).map_err(|e| {
            error!(sequence_id, error = %e, "Store returned an unusable sequence id");
            AppError::internal(
                "Invalid referral sequence id",
                json!({ "reason": e.to_string() }),
            )
        })?;

        let new_referral = NewReferral {
            sequence_id,
            public_id,
            code: code.to_string(),
            referrer_id: referrer_id.to_string(),
            created_at: self.clock.now(),
        };

        let referral = self
            .repository
            .create(new_referral)
            .await
            .map_err(|e| e.into_storage_fault("Adding new referral failed"))?;

        info!(public_id = %referral.public_id, referrer_id, "Referral created");

        Ok(referral)
    }

    /// Marks a referral completed by `referee_id`.
    ///
    /// Not idempotent: completing an already completed referral overwrites
    /// the referee. Double completion through the normal flow is prevented by
    /// the claim check in
    /// [`FingerprintService::validate_claim`](super::FingerprintService::validate_claim).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `public_id` is empty.
    /// Returns [`AppError::NotFound`] if no referral has this public id.
    /// Returns [`AppError::Internal`] if `referee_id` is empty or on storage failure.
    pub async fn complete_referral(
        &self,
        public_id: &str,
        referee_id: &str,
    ) -> Result<Referral, AppError> {
        if public_id.trim().is_empty() {
            warn!("Referral id is empty");
            return Err(AppError::bad_request(
                "Referral id is empty",
                json!({ "field": "public_id" }),
            ));
        }

        let existing = self
            .repository
            .find_by_public_id(public_id)
            .await
            .map_err(|e| e.into_storage_fault("Loading referral failed"))?
            .ok_or_else(|| referral_not_found(public_id))?;

        if referee_id.trim().is_empty() {
            error!("Empty referee user id");
            return Err(AppError::internal("Empty user id", json!({})));
        }

        if existing.is_completed() {
            warn!(
                public_id,
                previous_referee = existing.referee_id.as_deref().unwrap_or_default(),
                referee_id,
                "Completing an already completed referral"
            );
        }

        let referral = self
            .repository
            .complete(public_id, referee_id)
            .await
            .map_err(|e| e.into_storage_fault("Completing referral failed"))?
            .ok_or_else(|| referral_not_found(public_id))?;

        info!(public_id, referee_id, "Referral completed");

        Ok(referral)
    }

    /// Lists the caller's own referrals, narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if `referrer_id` is empty or on storage failure.
    pub async fn list_referrals(
        &self,
        referrer_id: &str,
        filter: ReferralFilter,
    ) -> Result<ReferralPage, AppError> {
        if referrer_id.trim().is_empty() {
            error!("Empty user id");
            return Err(AppError::internal("Empty user id", json!({})));
        }

        let items = self
            .repository
            .list_by_owner(referrer_id, filter.clone())
            .await
            .map_err(|e| e.into_storage_fault("Listing referrals failed"))?;

        let total = self
            .repository
            .count_by_owner(referrer_id, filter)
            .await
            .map_err(|e| e.into_storage_fault("Counting referrals failed"))?;

        Ok(ReferralPage { items, total })
    }

    /// Retrieves a referral by public id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if it does not exist.
    /// Returns [`AppError::Internal`] on storage failure.
    pub async fn get_referral(&self, public_id: &str) -> Result<Referral, AppError> {
        self.repository
            .find_by_public_id(public_id)
            .await
            .map_err(|e| e.into_storage_fault("Loading referral failed"))?
            .ok_or_else(|| referral_not_found(public_id))
    }

    /// Checks that the referral store is reachable.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }
}

pub(crate) fn referral_not_found(public_id: &str) -> AppError {
    AppError::not_found(
        format!("Referral Id ({public_id}) is not found"),
        json!({ "public_id": public_id }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::entities::ReferralStatus;
    use crate::domain::repositories::MockReferralRepository;
    use chrono::{TimeZone, Utc};

    fn test_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 7, 16, 0, 58, 49).unwrap(),
        ))
    }

    fn referral_from(new_referral: &NewReferral) -> Referral {
        Referral {
            sequence_id: new_referral.sequence_id,
            public_id: new_referral.public_id.clone(),
            code: new_referral.code.clone(),
            referrer_id: new_referral.referrer_id.clone(),
            referee_id: None,
            status: ReferralStatus::Pending,
            created_at: new_referral.created_at,
        }
    }

    fn create_test_referral(public_id: &str, status: ReferralStatus) -> Referral {
        Referral {
            sequence_id: 1,
            public_id: public_id.to_string(),
            code: "TESTCODE".to_string(),
            referrer_id: "u1".to_string(),
            referee_id: (status == ReferralStatus::Completed).then(|| "u2".to_string()),
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_referral_success() {
        let mut mock_repo = MockReferralRepository::new();
        let clock = test_clock();
        let created_at = clock.now();

        mock_repo
            .expect_next_sequence_id()
            .times(1)
            .returning(|| Ok(125));

        mock_repo
            .expect_create()
            .withf(move |r| {
                r.sequence_id == 125
                    && r.public_id == "r21"
                    && r.code == "TESTCODE"
                    && r.referrer_id == "u1"
                    && r.created_at == created_at
            })
            .times(1)
            .returning(|r| Ok(referral_from(&r)));

        let service = ReferralService::new(Arc::new(mock_repo), clock);

        let referral = service.create_referral("TESTCODE", "u1").await.unwrap();

        assert_eq!(referral.status, ReferralStatus::Pending);
        assert!(referral.referee_id.is_none());
        assert_eq!(referral.public_id, "r21");
        assert_eq!(public_id::decode(&referral.public_id).unwrap(), 125);
    }

    #[tokio::test]
    async fn test_create_referral_empty_code() {
        let mut mock_repo = MockReferralRepository::new();
        mock_repo.expect_next_sequence_id().times(0);
        mock_repo.expect_create().times(0);

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let result = service.create_referral("   ", "u1").await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_referral_empty_identity_is_server_fault() {
        let mut mock_repo = MockReferralRepository::new();
        mock_repo.expect_create().times(0);

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let err = service.create_referral("TESTCODE", "").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.to_string(), "Empty user id");
    }

    #[tokio::test]
    async fn test_create_referral_sequence_failure() {
        let mut mock_repo = MockReferralRepository::new();
        mock_repo
            .expect_next_sequence_id()
            .times(1)
            .returning(|| Err(AppError::internal("Database error", json!({}))));
        mock_repo.expect_create().times(0);

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let err = service.create_referral("TESTCODE", "u1").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_create_referral_insert_failure_is_server_fault() {
        let mut mock_repo = MockReferralRepository::new();
        mock_repo
            .expect_next_sequence_id()
            .times(1)
            .returning(|| Ok(1));
        mock_repo.expect_create().times(1).returning(|_| {
            Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "referrals_public_id_key" }),
            ))
        });

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let err = service.create_referral("TESTCODE", "u1").await.unwrap_err();

        match err {
            AppError::Internal { message, details } => {
                assert_eq!(message, "Adding new referral failed");
                assert_eq!(details["reason"], "Unique constraint violation");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_referral_rejects_non_positive_sequence() {
        let mut mock_repo = MockReferralRepository::new();
        mock_repo
            .expect_next_sequence_id()
            .times(1)
            .returning(|| Ok(0));
        mock_repo.expect_create().times(0);

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let err = service.create_referral("TESTCODE", "u1").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_complete_referral_success() {
        let mut mock_repo = MockReferralRepository::new();

        let pending = create_test_referral("r1", ReferralStatus::Pending);
        mock_repo
            .expect_find_by_public_id()
            .withf(|id| id == "r1")
            .times(1)
            .returning(move |_| Ok(Some(pending.clone())));

        mock_repo
            .expect_complete()
            .withf(|id, referee| id == "r1" && referee == "u2")
            .times(1)
            .returning(|_, _| Ok(Some(create_test_referral("r1", ReferralStatus::Completed))));

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let referral = service.complete_referral("r1", "u2").await.unwrap();

        assert_eq!(referral.status, ReferralStatus::Completed);
        assert_eq!(referral.referee_id.as_deref(), Some("u2"));
    }

    #[tokio::test]
    async fn test_complete_referral_empty_id() {
        let mut mock_repo = MockReferralRepository::new();
        mock_repo.expect_find_by_public_id().times(0);

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let result = service.complete_referral("", "u2").await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_complete_referral_not_found() {
        let mut mock_repo = MockReferralRepository::new();
        mock_repo
            .expect_find_by_public_id()
            .times(1)
            .returning(|_| Ok(None));
        mock_repo.expect_complete().times(0);

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let err = service.complete_referral("rMissing", "u2").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(err.to_string().contains("rMissing"));
    }

    #[tokio::test]
    async fn test_complete_referral_empty_referee_is_server_fault() {
        let mut mock_repo = MockReferralRepository::new();
        let pending = create_test_referral("r1", ReferralStatus::Pending);
        mock_repo
            .expect_find_by_public_id()
            .times(1)
            .returning(move |_| Ok(Some(pending.clone())));
        mock_repo.expect_complete().times(0);

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let err = service.complete_referral("r1", " ").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_complete_referral_twice_overwrites_referee() {
        let mut mock_repo = MockReferralRepository::new();
        let completed = create_test_referral("r1", ReferralStatus::Completed);
        mock_repo
            .expect_find_by_public_id()
            .times(1)
            .returning(move |_| Ok(Some(completed.clone())));

        mock_repo
            .expect_complete()
            .withf(|_, referee| referee == "u3")
            .times(1)
            .returning(|_, referee| {
                let mut referral = create_test_referral("r1", ReferralStatus::Completed);
                referral.referee_id = Some(referee.to_string());
                Ok(Some(referral))
            });

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let referral = service.complete_referral("r1", "u3").await.unwrap();

        assert_eq!(referral.status, ReferralStatus::Completed);
        assert_eq!(referral.referee_id.as_deref(), Some("u3"));
    }

    #[tokio::test]
    async fn test_complete_referral_storage_failure() {
        let mut mock_repo = MockReferralRepository::new();
        let pending = create_test_referral("r1", ReferralStatus::Pending);
        mock_repo
            .expect_find_by_public_id()
            .times(1)
            .returning(move |_| Ok(Some(pending.clone())));
        mock_repo
            .expect_complete()
            .times(1)
            .returning(|_, _| Err(AppError::internal("Database error", json!({}))));

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let err = service.complete_referral("r1", "u2").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_list_referrals_scoped_to_owner() {
        let mut mock_repo = MockReferralRepository::new();

        mock_repo
            .expect_list_by_owner()
            .withf(|owner, filter| owner == "u1" && filter.status == Some(ReferralStatus::Pending))
            .times(1)
            .returning(|_, _| Ok(vec![create_test_referral("r1", ReferralStatus::Pending)]));

        mock_repo
            .expect_count_by_owner()
            .withf(|owner, _| owner == "u1")
            .times(1)
            .returning(|_, _| Ok(1));

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let page = service
            .list_referrals(
                "u1",
                ReferralFilter::new(0, 25).with_status(Some(ReferralStatus::Pending)),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].public_id, "r1");
    }

    #[tokio::test]
    async fn test_list_referrals_empty_identity() {
        let mut mock_repo = MockReferralRepository::new();
        mock_repo.expect_list_by_owner().times(0);

        let service = ReferralService::new(Arc::new(mock_repo), test_clock());

        let err = service
            .list_referrals("", ReferralFilter::new(0, 25))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }
}
