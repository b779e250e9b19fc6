//! Business logic services for the application layer.

pub mod fingerprint_service;
pub mod referral_service;

pub use fingerprint_service::{FingerprintService, LinkSettings, OpenedLink};
pub use referral_service::{ReferralPage, ReferralService};
