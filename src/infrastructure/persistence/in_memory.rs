//! Process-local repositories backed by `tokio::sync::RwLock`.
//!
//! Used by the HTTP integration tests. Uniqueness and atomic completion are
//! enforced under the write lock, mirroring the PostgreSQL schema constraints.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::domain::entities::{
    Fingerprint, NewFingerprint, NewReferral, Referral, ReferralFilter, ReferralStatus,
};
use crate::domain::repositories::{FingerprintRepository, ReferralRepository};
use crate::error::AppError;

#[derive(Debug, Default)]
pub struct InMemoryReferralRepository {
    sequence: AtomicI64,
    referrals: RwLock<Vec<Referral>>,
}

impl InMemoryReferralRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn owned_matching(&self, referrer_id: &str, filter: &ReferralFilter) -> Vec<Referral> {
        let referrals = self.referrals.read().await;

        let mut matching: Vec<Referral> = referrals
            .iter()
            .filter(|r| r.referrer_id == referrer_id && filter.matches(r))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.sequence_id.cmp(&a.sequence_id))
        });

        matching
    }
}

#[async_trait]
impl ReferralRepository for InMemoryReferralRepository {
    async fn next_sequence_id(&self) -> Result<i64, AppError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn create(&self, new_referral: NewReferral) -> Result<Referral, AppError> {
        let mut referrals = self.referrals.write().await;

        if let Some(existing) = referrals.iter().find(|r| {
            r.sequence_id == new_referral.sequence_id || r.public_id == new_referral.public_id
        }) {
            let constraint = if existing.public_id == new_referral.public_id {
                "referrals_public_id_key"
            } else {
                "referrals_pkey"
            };
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": constraint }),
            ));
        }

        let referral = Referral {
            sequence_id: new_referral.sequence_id,
            public_id: new_referral.public_id,
            code: new_referral.code,
            referrer_id: new_referral.referrer_id,
            referee_id: None,
            status: ReferralStatus::Pending,
            created_at: new_referral.created_at,
        };
        referrals.push(referral.clone());

        Ok(referral)
    }

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Referral>, AppError> {
        let referrals = self.referrals.read().await;
        Ok(referrals.iter().find(|r| r.public_id == public_id).cloned())
    }

    async fn complete(
        &self,
        public_id: &str,
        referee_id: &str,
    ) -> Result<Option<Referral>, AppError> {
        let mut referrals = self.referrals.write().await;

        Ok(referrals
            .iter_mut()
            .find(|r| r.public_id == public_id)
            .map(|r| {
                r.referee_id = Some(referee_id.to_string());
                r.status = ReferralStatus::Completed;
                r.clone()
            }))
    }

    async fn list_by_owner(
        &self,
        referrer_id: &str,
        filter: ReferralFilter,
    ) -> Result<Vec<Referral>, AppError> {
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);

        Ok(self
            .owned_matching(referrer_id, &filter)
            .await
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn count_by_owner(
        &self,
        referrer_id: &str,
        filter: ReferralFilter,
    ) -> Result<i64, AppError> {
        let count = self.owned_matching(referrer_id, &filter).await.len();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFingerprintRepository {
    sequence: AtomicI64,
    fingerprints: RwLock<HashMap<String, Fingerprint>>,
}

impl InMemoryFingerprintRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FingerprintRepository for InMemoryFingerprintRepository {
    async fn create(&self, new_fingerprint: NewFingerprint) -> Result<Fingerprint, AppError> {
        let mut fingerprints = self.fingerprints.write().await;

        if fingerprints.contains_key(&new_fingerprint.fingerprint_id) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "fingerprints_fingerprint_id_key" }),
            ));
        }

        let fingerprint = Fingerprint {
            sequence_id: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            fingerprint_id: new_fingerprint.fingerprint_id,
            ip_address: new_fingerprint.ip_address,
            user_agent: new_fingerprint.user_agent,
            referral_public_id: new_fingerprint.referral_public_id,
            referral_code: new_fingerprint.referral_code,
            created_at: new_fingerprint.created_at,
        };
        fingerprints.insert(fingerprint.fingerprint_id.clone(), fingerprint.clone());

        Ok(fingerprint)
    }

    async fn find_by_fingerprint_id(
        &self,
        fingerprint_id: &str,
    ) -> Result<Option<Fingerprint>, AppError> {
        Ok(self.fingerprints.read().await.get(fingerprint_id).cloned())
    }

    async fn list_by_referral(&self, public_id: &str) -> Result<Vec<Fingerprint>, AppError> {
        let fingerprints = self.fingerprints.read().await;

        let mut matching: Vec<Fingerprint> = fingerprints
            .values()
            .filter(|f| f.referral_public_id == public_id)
            .cloned()
            .collect();
        matching.sort_by_key(|f| f.sequence_id);

        Ok(matching)
    }
}
