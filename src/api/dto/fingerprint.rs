//! DTOs for link-open and claim validation endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::Fingerprint;

/// Fingerprint returned by a successful claim validation.
#[derive(Debug, Serialize)]
pub struct FingerprintResponse {
    pub fingerprint_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referral_public_id: String,
    pub referral_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<Fingerprint> for FingerprintResponse {
    fn from(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint_id: fingerprint.fingerprint_id,
            ip_address: fingerprint.ip_address,
            user_agent: fingerprint.user_agent,
            referral_public_id: fingerprint.referral_public_id,
            referral_code: fingerprint.referral_code,
            created_at: fingerprint.created_at,
        }
    }
}
