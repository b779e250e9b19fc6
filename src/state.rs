//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{FingerprintService, LinkSettings, ReferralService};
use crate::domain::clock::Clock;
use crate::domain::device::DeviceClassifier;
use crate::domain::identity::IdentityResolver;
use crate::domain::repositories::{FingerprintRepository, ReferralRepository};

pub type SharedReferralService = Arc<ReferralService<dyn ReferralRepository>>;
pub type SharedFingerprintService =
    Arc<FingerprintService<dyn ReferralRepository, dyn FingerprintRepository>>;

/// Services and capabilities shared across requests.
///
/// Cloning is cheap: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub referral_service: SharedReferralService,
    pub fingerprint_service: SharedFingerprintService,
    pub identity_resolver: Arc<dyn IdentityResolver>,
}

/// Collaborators the services are built from.
pub struct AppDependencies {
    pub referrals: Arc<dyn ReferralRepository>,
    pub fingerprints: Arc<dyn FingerprintRepository>,
    pub identity_resolver: Arc<dyn IdentityResolver>,
    pub classifier: Arc<dyn DeviceClassifier>,
    pub clock: Arc<dyn Clock>,
    pub link_settings: LinkSettings,
}

impl AppState {
    pub fn new(deps: AppDependencies) -> Self {
        let referral_service = Arc::new(ReferralService::new(
            deps.referrals.clone(),
            deps.clock.clone(),
        ));

        let fingerprint_service = Arc::new(FingerprintService::new(
            deps.referrals,
            deps.fingerprints,
            deps.classifier,
            deps.clock,
            deps.link_settings,
        ));

        Self {
            referral_service,
            fingerprint_service,
            identity_resolver: deps.identity_resolver,
        }
    }
}
