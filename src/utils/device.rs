//! Substring-based device classification.

use crate::domain::device::{DeviceClassifier, Platform};

const IOS_MARKERS: &[&str] = &["iphone", "ipad", "ios"];
const ANDROID_MARKERS: &[&str] = &["android"];

/// Classifies a user agent by case-insensitive substring match.
///
/// iOS markers are checked before Android markers; the first match wins.
/// Anything else, including the empty string, is [`Platform::Unsupported`].
///
/// # Examples
///
/// ```ignore
/// assert_eq!(classify("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)"), Platform::Ios);
/// assert_eq!(classify("Mozilla/5.0 (Linux; Android 14)"), Platform::Android);
/// assert_eq!(classify("curl/8.4.0"), Platform::Unsupported);
/// ```
pub fn classify(user_agent: &str) -> Platform {
    let ua = user_agent.to_lowercase();

    if IOS_MARKERS.iter().any(|m| ua.contains(m)) {
        Platform::Ios
    } else if ANDROID_MARKERS.iter().any(|m| ua.contains(m)) {
        Platform::Android
    } else {
        Platform::Unsupported
    }
}

/// [`DeviceClassifier`] backed by [`classify`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringClassifier;

impl DeviceClassifier for SubstringClassifier {
    fn classify(&self, user_agent: &str) -> Platform {
        classify(user_agent)
    }
}
