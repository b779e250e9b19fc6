//! Referral entity and its lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a referral.
///
/// The only permitted transition is `Pending -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Completed,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored status string is not a known [`ReferralStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown referral status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ReferralStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One referrer's invitation.
///
/// `sequence_id` is the store-assigned key and is never exposed to callers;
/// `public_id` is its prefixed base-62 encoding. `referee_id` is set exactly
/// when `status` is [`ReferralStatus::Completed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referral {
    pub sequence_id: i64,
    pub public_id: String,
    pub code: String,
    pub referrer_id: String,
    pub referee_id: Option<String>,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
}

impl Referral {
    pub fn is_pending(&self) -> bool {
        self.status == ReferralStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.status == ReferralStatus::Completed
    }
}

/// Input for inserting a referral.
///
/// The sequence id is reserved from the store beforehand so the public id
/// can be written together with the record.
#[derive(Debug, Clone)]
pub struct NewReferral {
    pub sequence_id: i64,
    pub public_id: String,
    pub code: String,
    pub referrer_id: String,
    pub created_at: DateTime<Utc>,
}

/// Store-side narrowing for owner listings.
///
/// Always combined with the owner constraint by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralFilter {
    pub status: Option<ReferralStatus>,
    pub code: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl ReferralFilter {
    /// Creates a filter with pagination parameters and no narrowing.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            status: None,
            code: None,
            offset,
            limit,
        }
    }

    pub fn with_status(mut self, status: Option<ReferralStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    /// Evaluates the narrowing part of the filter (pagination excluded).
    pub fn matches(&self, referral: &Referral) -> bool {
        self.status.is_none_or(|s| referral.status == s)
            && self.code.as_deref().is_none_or(|c| referral.code == c)
    }
}
