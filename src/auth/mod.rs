//! Caller authentication.
//!
//! Callers authenticate once against the gateway with a JWT carried as a
//! bearer token. The verification key is loaded once at process start and
//! held as read-only state; per-vault authentication happens separately in
//! the bridges using the `Vault-Auth` header.

use crate::domain::fields;
use crate::errors::{codes, BridgeError, ErrorTarget, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Audience every caller JWT must carry.
pub const CALLER_AUDIENCE: &str = "ZEN-VAULT-BRIDGE";

/// Claims extracted from a verified caller token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerClaims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: usize,
}

/// Verifies caller JWTs against the process-wide public key.
pub struct CallerVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl CallerVerifier {
    /// Builds a verifier from an already-loaded key.
    ///
    /// Production uses RS256 via [`CallerVerifier::from_rsa_pem_file`];
    /// tests may inject an HMAC key with [`Algorithm::HS256`].
    pub fn new(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[CALLER_AUDIENCE]);
        Self { decoding_key, validation }
    }

    /// Loads the RS256 public key from a PEM file, once, at startup.
    pub fn from_rsa_pem_file(path: &str) -> Result<Self> {
        let pem = std::fs::read(path).map_err(|e| {
            BridgeError::new(codes::FRAMEWORK_INTERNAL)
                .with_detail(format!("failed to read JWT public key {}: {}", path, e))
        })?;
        let decoding_key = DecodingKey::from_rsa_pem(&pem).map_err(|e| {
            BridgeError::new(codes::FRAMEWORK_INTERNAL)
                .with_detail(format!("invalid JWT public key {}: {}", path, e))
        })?;
        Ok(Self::new(decoding_key, Algorithm::RS256))
    }

    /// Validates the `Authorization` header and returns the caller's claims.
    pub fn verify_header(&self, authorization: &str) -> Result<CallerClaims> {
        let token = extract_bearer(authorization)?;
        decode::<CallerClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                BridgeError::new(codes::AUTH_INVALID_JWT)
                    .with_target(ErrorTarget::header(fields::AUTHORIZATION_HEADER))
                    .with_detail(format!("JWT validation failed: {}", e))
            })
    }
}

/// Pulls the token out of a `Bearer <token>` header value.
pub fn extract_bearer(authorization: &str) -> Result<&str> {
    let mut parts = authorization.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(BridgeError::new(codes::AUTH_INVALID_JWT)
            .with_target(ErrorTarget::header(fields::AUTHORIZATION_HEADER))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn hs256_verifier(secret: &[u8]) -> CallerVerifier {
        CallerVerifier::new(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        aud: String,
        exp: usize,
        iat: usize,
    }

    fn sign(secret: &[u8], aud: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = TestClaims {
            sub: "caller-1".to_string(),
            aud: aud.to_string(),
            exp: (now + exp_offset) as usize,
            iat: now as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn valid_token_yields_claims() {
        let secret = b"unit-test-signing-secret";
        let token = sign(secret, CALLER_AUDIENCE, 3600);
        let claims =
            hs256_verifier(secret).verify_header(&format!("Bearer {}", token)).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("caller-1"));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let secret = b"unit-test-signing-secret";
        let token = sign(secret, "some-other-service", 3600);
        let err = hs256_verifier(secret)
            .verify_header(&format!("Bearer {}", token))
            .unwrap_err();
        assert_eq!(err.code(), codes::AUTH_INVALID_JWT);
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = b"unit-test-signing-secret";
        let token = sign(secret, CALLER_AUDIENCE, -3600);
        let err = hs256_verifier(secret)
            .verify_header(&format!("Bearer {}", token))
            .unwrap_err();
        assert_eq!(err.code(), codes::AUTH_INVALID_JWT);
    }

    #[test]
    fn bad_public_key_file_fails_at_startup() {
        use std::io::Write;

        let err = CallerVerifier::from_rsa_pem_file("/nonexistent/key.pem").err().unwrap();
        assert_eq!(err.code(), codes::FRAMEWORK_INTERNAL);

        let mut pem = tempfile::NamedTempFile::new().unwrap();
        pem.write_all(b"not a pem file").unwrap();
        let err = CallerVerifier::from_rsa_pem_file(pem.path().to_str().unwrap()).err().unwrap();
        assert_eq!(err.code(), codes::FRAMEWORK_INTERNAL);
    }

    #[test]
    fn header_must_be_bearer_scheme() {
        assert!(extract_bearer("Bearer abc").is_ok());
        assert!(extract_bearer("Basic abc").is_err());
        assert!(extract_bearer("Bearer").is_err());
        assert!(extract_bearer("Bearer a b").is_err());
    }
}
