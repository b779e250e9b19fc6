//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls, validation, and the referral state
//! machine. They consume repository traits and injected capabilities (clock,
//! device classifier) and expose a transport-agnostic API to HTTP handlers
//! and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::referral_service::ReferralService`] - Referral creation, completion, owner listings
//! - [`services::fingerprint_service::FingerprintService`] - Link opening and claim validation

pub mod services;
