//! Helpers shared by the services and the HTTP layer.
//!
//! - [`public_id`] - Prefixed base-62 encoding of referral sequence ids
//! - [`device`] - Substring-based user-agent classification
//! - [`cookie`] - Fingerprint cookie formatting and parsing

pub mod cookie;
pub mod device;
pub mod public_id;
