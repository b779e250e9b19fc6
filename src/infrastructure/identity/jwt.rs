//! HS256 JSON Web Token identity resolver.
//!
//! Only the signature is verified. Issuer, audience and lifetime are not
//! checked; tokens are expected to be minted by a trusted identity provider
//! sharing `JWT_SECRET` with this service.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value, json};
use sha2::Sha256;

use crate::domain::identity::{CallerIdentity, IdentityResolver};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Claim carrying the caller's identity in tokens issued by .NET-style providers.
pub const NAME_IDENTIFIER_CLAIM: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// Fallback identity claim.
pub const SUBJECT_CLAIM: &str = "sub";

/// Resolves identities from HS256-signed JWTs.
///
/// The identity is the name-identifier claim, falling back to `sub`. A token
/// with a valid signature but neither claim resolves to an empty identity.
#[derive(Clone)]
pub struct JwtIdentityResolver {
    secret: Vec<u8>,
}

impl JwtIdentityResolver {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    /// Issues a signed token whose `sub` claim is `subject`.
    ///
    /// Used by the admin CLI and tests.
    pub fn issue(&self, subject: &str) -> String {
        self.issue_with_claims(json!({ SUBJECT_CLAIM: subject }))
    }

    /// Issues a signed token carrying arbitrary `claims`.
    pub fn issue_with_claims(&self, claims: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{header}.{payload}");

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{signing_input}.{signature}")
    }

    fn decode_segment(segment: &str) -> Result<Map<String, Value>, AppError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| invalid_token("Malformed token encoding"))?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(invalid_token("Malformed token segment")),
        }
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, credential: &str) -> Result<CallerIdentity, AppError> {
        let mut parts = credential.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid_token("Malformed token"));
        };

        let header_claims = Self::decode_segment(header)?;
        if header_claims.get("alg").and_then(Value::as_str) != Some("HS256") {
            return Err(invalid_token("Unsupported token algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| invalid_token("Malformed token signature"))?;

        let mut mac = self.mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid_token("Invalid token signature"))?;

        let claims = Self::decode_segment(payload)?;
        let identity = [NAME_IDENTIFIER_CLAIM, SUBJECT_CLAIM]
            .iter()
            .find_map(|name| claims.get(*name).and_then(Value::as_str))
            .unwrap_or_default();

        Ok(CallerIdentity(identity.to_string()))
    }
}

fn invalid_token(reason: &str) -> AppError {
    AppError::unauthorized("Unauthorized", json!({ "reason": reason }))
}
