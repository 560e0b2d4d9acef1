//! The Auth Adapter: extracts the bearer token and resolves it to an
//! issuer `did`.
//!
//! The actual cryptographic verification of an AT Protocol service JWT
//! requires resolving the signing key out of the issuer's DID document,
//! which is keyed off algorithms (`ES256K` over `did:key` material) that
//! sit outside what a general-purpose JWT crate covers. The spec treats
//! this as an external boundary — `verify(token, key_resolver) -> issuer`
//! — so it's modeled here as a trait with one concrete implementation
//! good for any deployment willing to issue its own `EdDSA`-signed
//! service tokens; swapping in a full did:key resolver means implementing
//! [`TokenVerifier`] against that signing scheme without touching the
//! extractor or the routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use snafu::Snafu;

use feed_core::ids::Did;

use crate::state::AppState;

#[derive(Debug, Snafu)]
pub enum AuthError {
    #[snafu(display("missing or malformed Authorization header"))]
    MissingBearer,
    #[snafu(display("token signature verification failed"))]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(target: crate::LOG_TARGET, error = %self, "auth failure");
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// The boundary the spec describes as `verify(token, key_resolver) ->
/// issuer`.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Did, AuthError>;
}

#[derive(Debug, Deserialize)]
struct ServiceClaims {
    iss: String,
}

/// A `TokenVerifier` for service JWTs signed with a single shared `EdDSA`
/// key, as would be configured for a deployment that mints its own reader
/// tokens rather than accepting arbitrary PDS-issued ones.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(decoding_key: DecodingKey) -> Self {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::EdDSA);
        validation.validate_exp = true;
        Self {
            decoding_key,
            validation,
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Did, AuthError> {
        let data = jsonwebtoken::decode::<ServiceClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| {
                tracing::debug!(target: crate::LOG_TARGET, %err, "jwt decode failed");
                AuthError::InvalidToken
            })?;
        Ok(Did::new(data.claims.iss))
    }
}

/// The authenticated reader, extracted from a valid `Authorization:
/// Bearer <jwt>` header.
pub struct AuthedReader(pub Did);

impl FromRequestParts<AppState> for AuthedReader {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingBearer)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingBearer)?;

        let did = state.verifier.verify(token)?;
        Ok(AuthedReader(did))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeVerifier(Did);

    impl TokenVerifier for FakeVerifier {
        fn verify(&self, _token: &str) -> Result<Did, AuthError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn fake_verifier_returns_configured_did() {
        let verifier = FakeVerifier(Did::new("did:plc:reader"));
        assert_eq!(verifier.verify("anything").unwrap().as_str(), "did:plc:reader");
    }
}
