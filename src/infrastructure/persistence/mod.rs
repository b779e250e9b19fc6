//! Repository implementations.
//!
//! PostgreSQL repositories use SQLx with runtime-checked queries; the
//! in-memory variants back the HTTP tests.
//!
//! # Repositories
//!
//! - [`PgReferralRepository`] - Referral storage and status transition
//! - [`PgFingerprintRepository`] - Append-only fingerprint storage
//! - [`InMemoryReferralRepository`], [`InMemoryFingerprintRepository`] - Process-local stores

pub mod in_memory;
pub mod pg_fingerprint_repository;
pub mod pg_referral_repository;

pub use in_memory::{InMemoryFingerprintRepository, InMemoryReferralRepository};
pub use pg_fingerprint_repository::PgFingerprintRepository;
pub use pg_referral_repository::PgReferralRepository;
