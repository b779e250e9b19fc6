//! Link opening and claim validation.
//!
//! Opening a link records the client's network and device signature as a
//! [`Fingerprint`] and hands back an opaque token. At claim time the same
//! client presents the token, and the recorded signature is re-checked
//! before the referral may be completed.

use std::sync::Arc;

use chrono::TimeDelta;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::services::referral_service::referral_not_found;
use crate::domain::clock::Clock;
use crate::domain::device::{DeviceClassifier, Platform};
use crate::domain::entities::{Fingerprint, NewFingerprint};
use crate::domain::repositories::{FingerprintRepository, ReferralRepository};
use crate::error::AppError;

/// Link expiration window and per-platform store links.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub expiration: TimeDelta,
    pub android_app_link: String,
    pub ios_app_link: String,
}

impl LinkSettings {
    fn target_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Android => Some(&self.android_app_link),
            Platform::Ios => Some(&self.ios_app_link),
            Platform::Unsupported => None,
        }
    }
}

/// Result of a successful link open.
#[derive(Debug, Clone)]
pub struct OpenedLink {
    pub redirect_target: String,
    pub platform: Platform,
    pub fingerprint: Fingerprint,
}

pub struct FingerprintService<R, F>
where
    R: ReferralRepository + ?Sized,
    F: FingerprintRepository + ?Sized,
{
    referrals: Arc<R>,
    fingerprints: Arc<F>,
    classifier: Arc<dyn DeviceClassifier>,
    clock: Arc<dyn Clock>,
    settings: LinkSettings,
}

impl<R, F> FingerprintService<R, F>
where
    R: ReferralRepository + ?Sized,
    F: FingerprintRepository + ?Sized,
{
    pub fn new(
        referrals: Arc<R>,
        fingerprints: Arc<F>,
        classifier: Arc<dyn DeviceClassifier>,
        clock: Arc<dyn Clock>,
        settings: LinkSettings,
    ) -> Self {
        Self {
            referrals,
            fingerprints,
            classifier,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    /// Opens a referral link for the client observed at `ip_address`.
    ///
    /// Checks run in order: empty id, existence, expiration, device. Only
    /// after all of them pass is a fingerprint with a fresh v4 UUID token
    /// recorded.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for an empty `public_id`
    /// - [`AppError::NotFound`] for an unknown referral
    /// - [`AppError::Expired`] when the link is older than the expiration window
    /// - [`AppError::Internal`] for an unsupported device or a storage failure
    pub async fn open_link(
        &self,
        public_id: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<OpenedLink, AppError> {
        if public_id.trim().is_empty() {
            warn!("Referral id is empty");
            return Err(AppError::bad_request(
                "Referral id is empty",
                json!({ "field": "public_id" }),
            ));
        }

        let referral = self
            .referrals
            .find_by_public_id(public_id)
            .await
            .map_err(|e| e.into_storage_fault("Loading referral failed"))?
            .ok_or_else(|| referral_not_found(public_id))?;

        let now = self.clock.now();
        if now - referral.created_at > self.settings.expiration {
            info!(public_id, created_at = %referral.created_at, "Link expired");
            return Err(AppError::expired(
                "Link expired",
                json!({ "public_id": public_id }),
            ));
        }

        let platform = self.classifier.classify(user_agent);
        let Some(redirect_target) = self.settings.target_for(platform).map(str::to_string)
        else {
            error!(public_id, user_agent, "Unsupported device");
            return Err(AppError::internal(
                "Unsupported device",
                json!({ "user_agent": user_agent }),
            ));
        };

        let new_fingerprint = NewFingerprint {
            fingerprint_id: Uuid::new_v4().to_string(),
            ip_address: ip_address.to_string(),
            user_agent: user_agent.to_string(),
            referral_public_id: referral.public_id.clone(),
            referral_code: referral.code.clone(),
            created_at: now,
        };

        let fingerprint = self
            .fingerprints
            .create(new_fingerprint)
            .await
            .map_err(|e| e.into_storage_fault("Adding new fingerprint failed"))?;

        info!(
            public_id,
            fingerprint_id = %fingerprint.fingerprint_id,
            ?platform,
            "Referral link opened"
        );

        Ok(OpenedLink {
            redirect_target,
            platform,
            fingerprint,
        })
    }

    /// Re-checks a client presenting a fingerprint token.
    ///
    /// The checks short-circuit in a fixed order: token existence, IP, user
    /// agent, parent referral, referral status.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for an empty token
    /// - [`AppError::NotFound`] for an unknown token, or a fingerprint whose
    ///   referral is missing (logged as a data-integrity anomaly)
    /// - [`AppError::Mismatch`] when the IP or user agent differs
    /// - [`AppError::AlreadyCompleted`] when the referral is no longer pending
    /// - [`AppError::Internal`] on storage failure
    pub async fn validate_claim(
        &self,
        fingerprint_id: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<Fingerprint, AppError> {
        if fingerprint_id.trim().is_empty() {
            warn!("Device fingerprint is empty");
            return Err(AppError::bad_request(
                "Device fingerprint is empty",
                json!({ "field": "fingerprint_id" }),
            ));
        }

        let fingerprint = self
            .fingerprints
            .find_by_fingerprint_id(fingerprint_id)
            .await
            .map_err(|e| e.into_storage_fault("Loading fingerprint failed"))?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("Device fingerprint ({fingerprint_id}) is not found"),
                    json!({ "fingerprint_id": fingerprint_id }),
                )
            })?;

        if fingerprint.ip_address != ip_address {
            warn!(fingerprint_id, "IP address mismatch");
            return Err(AppError::mismatch(
                "IP address mismatch",
                json!({ "fingerprint_id": fingerprint_id }),
            ));
        }

        if fingerprint.user_agent != user_agent {
            warn!(fingerprint_id, "User agent mismatch");
            return Err(AppError::mismatch(
                "User agent mismatch",
                json!({ "fingerprint_id": fingerprint_id }),
            ));
        }

        let public_id = fingerprint.referral_public_id.as_str();
        let referral = self
            .referrals
            .find_by_public_id(public_id)
            .await
            .map_err(|e| e.into_storage_fault("Loading referral failed"))?
            .ok_or_else(|| {
                error!(
                    fingerprint_id,
                    public_id, "Fingerprint references a missing referral"
                );
                referral_not_found(public_id)
            })?;

        if !referral.is_pending() {
            return Err(AppError::already_completed(
                format!(
                    "Referral Id ('{}') for device fingerprint ('{}') is already completed",
                    referral.public_id, fingerprint_id
                ),
                json!({
                    "public_id": referral.public_id,
                    "fingerprint_id": fingerprint_id,
                }),
            ));
        }

        Ok(fingerprint)
    }

    /// Lists the fingerprints recorded for one referral, oldest first.
    pub async fn list_fingerprints(&self, public_id: &str) -> Result<Vec<Fingerprint>, AppError> {
        self.fingerprints
            .list_by_referral(public_id)
            .await
            .map_err(|e| e.into_storage_fault("Listing fingerprints failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::entities::{Referral, ReferralStatus};
    use crate::domain::repositories::{MockFingerprintRepository, MockReferralRepository};
    use crate::utils::device::SubstringClassifier;
    use chrono::{DateTime, TimeZone, Utc};

    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 16, 0, 58, 49).unwrap()
    }

    fn settings() -> LinkSettings {
        LinkSettings {
            expiration: TimeDelta::minutes(1),
            android_app_link: "https://play.google.com/store/apps/details?id=com.cartoncaps.package"
                .to_string(),
            ios_app_link: "https://apps.apple.com/app/id123456789".to_string(),
        }
    }

    fn referral(status: ReferralStatus) -> Referral {
        Referral {
            sequence_id: 1,
            public_id: "r1".to_string(),
            code: "TESTCODE".to_string(),
            referrer_id: "u1".to_string(),
            referee_id: (status == ReferralStatus::Completed).then(|| "u2".to_string()),
            status,
            created_at: created_at(),
        }
    }

    fn fingerprint() -> Fingerprint {
        Fingerprint {
            sequence_id: 1,
            fingerprint_id: "fp-1".to_string(),
            ip_address: "10.0.0.1".to_string(),
            user_agent: ANDROID_UA.to_string(),
            referral_public_id: "r1".to_string(),
            referral_code: "TESTCODE".to_string(),
            created_at: created_at(),
        }
    }

    fn service(
        referrals: MockReferralRepository,
        fingerprints: MockFingerprintRepository,
        clock: Arc<ManualClock>,
    ) -> FingerprintService<MockReferralRepository, MockFingerprintRepository> {
        FingerprintService::new(
            Arc::new(referrals),
            Arc::new(fingerprints),
            Arc::new(SubstringClassifier),
            clock,
            settings(),
        )
    }

    fn clock_after(elapsed: TimeDelta) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(created_at() + elapsed))
    }

    fn stored(new_fingerprint: NewFingerprint) -> Fingerprint {
        Fingerprint {
            sequence_id: 7,
            fingerprint_id: new_fingerprint.fingerprint_id,
            ip_address: new_fingerprint.ip_address,
            user_agent: new_fingerprint.user_agent,
            referral_public_id: new_fingerprint.referral_public_id,
            referral_code: new_fingerprint.referral_code,
            created_at: new_fingerprint.created_at,
        }
    }

    #[tokio::test]
    async fn test_open_link_android() {
        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .withf(|id| id == "r1")
            .times(1)
            .returning(|_| Ok(Some(referral(ReferralStatus::Pending))));

        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_create()
            .withf(|f| {
                f.ip_address == "10.0.0.1"
                    && f.user_agent == ANDROID_UA
                    && f.referral_public_id == "r1"
                    && f.referral_code == "TESTCODE"
                    && Uuid::parse_str(&f.fingerprint_id).is_ok()
            })
            .times(1)
            .returning(|f| Ok(stored(f)));

        let service = service(referrals, fingerprints, clock_after(TimeDelta::seconds(30)));

        let opened = service.open_link("r1", "10.0.0.1", ANDROID_UA).await.unwrap();

        assert_eq!(opened.platform, Platform::Android);
        assert_eq!(opened.redirect_target, settings().android_app_link);
        assert_eq!(opened.fingerprint.referral_public_id, "r1");
    }

    #[tokio::test]
    async fn test_open_link_ios() {
        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .returning(|_| Ok(Some(referral(ReferralStatus::Pending))));

        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_create()
            .times(1)
            .returning(|f| Ok(stored(f)));

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let opened = service.open_link("r1", "10.0.0.1", IPHONE_UA).await.unwrap();

        assert_eq!(opened.platform, Platform::Ios);
        assert_eq!(opened.redirect_target, settings().ios_app_link);
    }

    #[tokio::test]
    async fn test_open_link_empty_id() {
        let mut referrals = MockReferralRepository::new();
        referrals.expect_find_by_public_id().times(0);

        let service = service(
            referrals,
            MockFingerprintRepository::new(),
            clock_after(TimeDelta::zero()),
        );

        let err = service.open_link("", "10.0.0.1", ANDROID_UA).await.unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_open_link_not_found() {
        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .times(1)
            .returning(|_| Ok(None));

        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints.expect_create().times(0);

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let err = service.open_link("rX", "10.0.0.1", ANDROID_UA).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "Referral Id (rX) is not found");
    }

    #[tokio::test]
    async fn test_open_link_expired_records_nothing() {
        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .returning(|_| Ok(Some(referral(ReferralStatus::Pending))));

        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints.expect_create().times(0);

        let service = service(referrals, fingerprints, clock_after(TimeDelta::minutes(2)));

        let err = service.open_link("r1", "10.0.0.1", ANDROID_UA).await.unwrap_err();

        assert!(matches!(err, AppError::Expired { .. }));
        assert_eq!(err.to_string(), "Link expired");
    }

    #[tokio::test]
    async fn test_open_link_at_window_boundary_is_accepted() {
        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .returning(|_| Ok(Some(referral(ReferralStatus::Pending))));

        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_create()
            .times(1)
            .returning(|f| Ok(stored(f)));

        let service = service(referrals, fingerprints, clock_after(TimeDelta::minutes(1)));

        assert!(service.open_link("r1", "10.0.0.1", ANDROID_UA).await.is_ok());
    }

    #[tokio::test]
    async fn test_open_link_unsupported_device() {
        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .returning(|_| Ok(Some(referral(ReferralStatus::Pending))));

        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints.expect_create().times(0);

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let err = service.open_link("r1", "10.0.0.1", "Unknown").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.to_string(), "Unsupported device");
    }

    #[tokio::test]
    async fn test_open_link_storage_failure() {
        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .returning(|_| Ok(Some(referral(ReferralStatus::Pending))));

        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_create()
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let err = service.open_link("r1", "10.0.0.1", ANDROID_UA).await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.to_string(), "Adding new fingerprint failed");
    }

    #[tokio::test]
    async fn test_validate_claim_success() {
        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_find_by_fingerprint_id()
            .withf(|id| id == "fp-1")
            .returning(|_| Ok(Some(fingerprint())));

        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .withf(|id| id == "r1")
            .returning(|_| Ok(Some(referral(ReferralStatus::Pending))));

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let fp = service
            .validate_claim("fp-1", "10.0.0.1", ANDROID_UA)
            .await
            .unwrap();

        assert_eq!(fp.referral_public_id, "r1");
    }

    #[tokio::test]
    async fn test_validate_claim_unknown_token() {
        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_find_by_fingerprint_id()
            .returning(|_| Ok(None));

        let service = service(
            MockReferralRepository::new(),
            fingerprints,
            clock_after(TimeDelta::zero()),
        );

        let err = service
            .validate_claim("nope", "10.0.0.1", ANDROID_UA)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "Device fingerprint (nope) is not found");
    }

    #[tokio::test]
    async fn test_validate_claim_ip_mismatch_skips_referral_lookup() {
        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_find_by_fingerprint_id()
            .returning(|_| Ok(Some(fingerprint())));

        let mut referrals = MockReferralRepository::new();
        referrals.expect_find_by_public_id().times(0);

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let err = service
            .validate_claim("fp-1", "10.0.0.2", ANDROID_UA)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Mismatch { .. }));
        assert_eq!(err.to_string(), "IP address mismatch");
    }

    #[tokio::test]
    async fn test_validate_claim_user_agent_mismatch() {
        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_find_by_fingerprint_id()
            .returning(|_| Ok(Some(fingerprint())));

        let mut referrals = MockReferralRepository::new();
        referrals.expect_find_by_public_id().times(0);

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let err = service
            .validate_claim("fp-1", "10.0.0.1", IPHONE_UA)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "User agent mismatch");
    }

    #[tokio::test]
    async fn test_validate_claim_missing_referral() {
        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_find_by_fingerprint_id()
            .returning(|_| Ok(Some(fingerprint())));

        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let err = service
            .validate_claim("fp-1", "10.0.0.1", ANDROID_UA)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_validate_claim_already_completed() {
        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_find_by_fingerprint_id()
            .returning(|_| Ok(Some(fingerprint())));

        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .returning(|_| Ok(Some(referral(ReferralStatus::Completed))));

        let service = service(referrals, fingerprints, clock_after(TimeDelta::zero()));

        let err = service
            .validate_claim("fp-1", "10.0.0.1", ANDROID_UA)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyCompleted { .. }));
        assert_eq!(
            err.to_string(),
            "Referral Id ('r1') for device fingerprint ('fp-1') is already completed"
        );
    }

    #[tokio::test]
    async fn test_validate_claim_ignores_expiration() {
        let mut fingerprints = MockFingerprintRepository::new();
        fingerprints
            .expect_find_by_fingerprint_id()
            .returning(|_| Ok(Some(fingerprint())));

        let mut referrals = MockReferralRepository::new();
        referrals
            .expect_find_by_public_id()
            .returning(|_| Ok(Some(referral(ReferralStatus::Pending))));

        let service = service(referrals, fingerprints, clock_after(TimeDelta::days(30)));

        assert!(service
            .validate_claim("fp-1", "10.0.0.1", ANDROID_UA)
            .await
            .is_ok());
    }
}
