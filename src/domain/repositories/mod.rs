//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`ReferralRepository`] - Referral records and their status transition
//! - [`FingerprintRepository`] - Append-only device fingerprints

pub mod fingerprint_repository;
pub mod referral_repository;

pub use fingerprint_repository::FingerprintRepository;
pub use referral_repository::ReferralRepository;

#[cfg(test)]
pub use fingerprint_repository::MockFingerprintRepository;
#[cfg(test)]
pub use referral_repository::MockReferralRepository;
