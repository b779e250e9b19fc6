//! Caller identity resolution from bearer credentials.

pub mod jwt;

pub use jwt::JwtIdentityResolver;
