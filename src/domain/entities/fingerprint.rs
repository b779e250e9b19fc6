//! Device fingerprint captured when a referral link is opened.

use chrono::{DateTime, Utc};

/// Network and device signature of one link-open event.
///
/// Fingerprints are written once and never mutated. `fingerprint_id` is the
/// opaque token handed to the client and echoed back at claim time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub sequence_id: i64,
    pub fingerprint_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referral_public_id: String,
    /// Copy of the referral's code at creation time.
    pub referral_code: String,
    pub created_at: DateTime<Utc>,
}

/// Input data for recording a fingerprint.
#[derive(Debug, Clone)]
pub struct NewFingerprint {
    pub fingerprint_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referral_public_id: String,
    pub referral_code: String,
    pub created_at: DateTime<Utc>,
}
