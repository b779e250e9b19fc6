//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`Referral`] - A referrer's invitation, addressed publicly by its `public_id`
//! - [`Fingerprint`] - The device signature recorded when a referral link is opened
//!
//! Creation inputs live next to their entity (`NewReferral`, `NewFingerprint`).

pub mod fingerprint;
pub mod referral;

pub use fingerprint::{Fingerprint, NewFingerprint};
pub use referral::{NewReferral, Referral, ReferralFilter, ReferralStatus, UnknownStatus};
