#![allow(dead_code)]

use axum::{Router, extract::ConnectInfo, middleware, routing::get};
use axum_test::TestServer;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use referral_links::api;
use referral_links::api::handlers::health_handler;
use referral_links::api::middleware::auth;
use referral_links::application::services::LinkSettings;
use referral_links::domain::clock::ManualClock;
use referral_links::infrastructure::identity::JwtIdentityResolver;
use referral_links::infrastructure::persistence::{
    InMemoryFingerprintRepository, InMemoryReferralRepository,
};
use referral_links::state::{AppDependencies, AppState};
use referral_links::utils::device::SubstringClassifier;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const ANDROID_APP_LINK: &str =
    "https://play.google.com/store/apps/details?id=com.cartoncaps.package";
pub const IOS_APP_LINK: &str = "https://apps.apple.com/app/id123456789";

pub const ANDROID_UA: &str =
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/126.0 Mobile Safari/537.36";
pub const IPHONE_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";

pub const REFEREE_IP: &str = "127.0.0.1:12345";
pub const OTHER_IP: &str = "10.1.2.3:40000";

pub struct TestContext {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub referrals: Arc<InMemoryReferralRepository>,
    pub fingerprints: Arc<InMemoryFingerprintRepository>,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 16, 0, 58, 49).unwrap()
}

/// In-memory state with a one minute link expiration window.
pub fn create_test_context() -> TestContext {
    let clock = Arc::new(ManualClock::new(start_time()));
    let referrals = Arc::new(InMemoryReferralRepository::new());
    let fingerprints = Arc::new(InMemoryFingerprintRepository::new());

    let state = AppState::new(AppDependencies {
        referrals: referrals.clone(),
        fingerprints: fingerprints.clone(),
        identity_resolver: Arc::new(JwtIdentityResolver::new(JWT_SECRET)),
        classifier: Arc::new(SubstringClassifier),
        clock: clock.clone(),
        link_settings: LinkSettings {
            expiration: TimeDelta::minutes(1),
            android_app_link: ANDROID_APP_LINK.to_string(),
            ios_app_link: IOS_APP_LINK.to_string(),
        },
    });

    TestContext {
        state,
        clock,
        referrals,
        fingerprints,
    }
}

/// Bearer token whose `sub` claim is `user`.
pub fn token_for(user: &str) -> String {
    JwtIdentityResolver::new(JWT_SECRET).issue(user)
}

/// Routes as served in production, minus rate limiting.
pub fn test_router(state: AppState, peer: &str) -> Router {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api::routes::public_routes())
        .nest("/api", api_router)
        .layer(MockConnectInfoLayer::new(peer))
        .with_state(state)
}

pub fn test_server(state: AppState, peer: &str) -> TestServer {
    TestServer::new(test_router(state, peer)).unwrap()
}

/// Creates a referral through the API and returns its public id.
pub async fn create_referral(server: &TestServer, user: &str, code: &str) -> String {
    let response = server
        .post("/api/referrals")
        .authorization_bearer(token_for(user))
        .json(&serde_json::json!({ "code": code }))
        .await;

    assert_eq!(response.status_code(), 201);

    response.json::<serde_json::Value>()["public_id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Opens a referral link and returns the fingerprint token from the cookie.
pub async fn open_link(server: &TestServer, public_id: &str, user_agent: &str) -> String {
    let response = server
        .get(&format!("/download/{public_id}"))
        .add_header("User-Agent", user_agent)
        .await;

    assert_eq!(response.status_code(), 302);

    fingerprint_from_set_cookie(response.header("set-cookie").to_str().unwrap())
}

pub fn fingerprint_from_set_cookie(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("fp_id="))
        .unwrap()
        .to_string()
}

#[derive(Clone)]
pub struct MockConnectInfoLayer {
    addr: SocketAddr,
}

impl MockConnectInfoLayer {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.parse().unwrap(),
        }
    }
}

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.addr,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}
