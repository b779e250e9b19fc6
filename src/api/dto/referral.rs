//! DTOs for referral endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::pagination::{PaginationMeta, PaginationParams};
use crate::domain::entities::{Referral, ReferralFilter, ReferralStatus};

/// Request to create a referral.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReferralRequest {
    #[validate(length(min = 1, max = 128, message = "Referral code must be 1-128 characters"))]
    pub code: String,
}

/// Referral as exposed to clients. The store's sequence id is omitted.
#[derive(Debug, Serialize)]
pub struct ReferralResponse {
    pub public_id: String,
    pub code: String,
    pub referrer_id: String,
    pub referee_id: Option<String>,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Referral> for ReferralResponse {
    fn from(referral: Referral) -> Self {
        Self {
            public_id: referral.public_id,
            code: referral.code,
            referrer_id: referral.referrer_id,
            referee_id: referral.referee_id,
            status: referral.status,
            created_at: referral.created_at,
        }
    }
}

/// Query parameters for the caller's referral listing.
#[derive(Debug, Deserialize)]
pub struct ReferralQueryParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    pub status: Option<ReferralStatus>,

    pub code: Option<String>,
}

impl ReferralQueryParams {
    pub fn to_filter(&self, offset: i64, limit: i64) -> ReferralFilter {
        ReferralFilter::new(offset, limit)
            .with_status(self.status)
            .with_code(self.code.clone().filter(|c| !c.is_empty()))
    }
}

/// Paginated list of referrals.
#[derive(Debug, Serialize)]
pub struct ReferralListResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<ReferralResponse>,
}
