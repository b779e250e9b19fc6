//! Target platform of a link-open request.

use serde::Serialize;

/// Platform inferred from a client signature; decides the redirect target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Unsupported,
}

/// Maps a free-form user-agent string to a [`Platform`].
///
/// The result is a best-effort hint, not an authorization signal.
/// Implementations must be pure and total over all strings.
pub trait DeviceClassifier: Send + Sync {
    fn classify(&self, user_agent: &str) -> Platform;
}
