//! Domain layer containing business entities and contracts.
//!
//! The domain layer has no dependencies on infrastructure or presentation.
//! Repository traits and injected capabilities are implemented elsewhere.
//!
//! # Architecture
//!
//! - [`entities`] - Referral and fingerprint records
//! - [`repositories`] - Data access trait definitions
//! - [`clock`] - Time source used for expiration checks
//! - [`device`] - Platform enum and the pluggable device classifier
//! - [`identity`] - Caller identity and its resolver
//!
//! # Referral Flow
//!
//! 1. A referrer creates a referral and shares `/download/{public_id}`
//! 2. The referee's device opens the link; a fingerprint is recorded and its
//!    token handed back in a cookie
//! 3. The referee's app presents the token; device identity is re-checked
//! 4. The referral is completed exactly once through the normal flow

pub mod clock;
pub mod device;
pub mod entities;
pub mod identity;
pub mod repositories;
