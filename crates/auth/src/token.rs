//! Bearer token verification.
//!
//! Tokens are issued by an external identity provider. This module only
//! checks them: signature, audience, issuer, expiry (with leeway) and the
//! presence of the claims the identity builder needs.

use std::collections::HashMap;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quill_core::UserId;

/// Verifier settings for one API surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtAuthenticationOptions {
    /// PEM public key, or the shared secret for HMAC algorithms.
    pub public_key: String,
    /// Signing key used by `quill dev jwt`. Never needed to verify tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub audience: String,
    pub issuer: String,
    pub algorithm: Algorithm,
    /// Clock skew tolerated on `exp` and `nbf`.
    pub leeway_secs: u64,
    /// `resource_access` entry whose roles are trusted. Defaults to the audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_resource: Option<String>,
}

impl Default for JwtAuthenticationOptions {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            private_key: None,
            audience: String::new(),
            issuer: String::new(),
            algorithm: Algorithm::RS256,
            leeway_secs: 60,
            roles_resource: None,
        }
    }
}

impl JwtAuthenticationOptions {
    pub fn roles_resource(&self) -> &str {
        self.roles_resource.as_deref().unwrap_or(&self.audience)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("invalid token audience")]
    InvalidAudience,

    #[error("invalid token issuer")]
    InvalidIssuer,

    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for AuthenticationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid verification key for {algorithm:?}: {source}")]
pub struct InvalidVerifierKey {
    algorithm: Algorithm,
    #[source]
    source: jsonwebtoken::errors::Error,
}

/// Roles granted for one resource server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The claims of a verified token that identities are built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub iss: String,
    pub sub: UserId,
    #[serde(default, alias = "preferred_username")]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    /// Authorized party: the client the token was issued to.
    #[serde(default)]
    pub azp: Option<String>,
    #[serde(default)]
    pub resource_access: HashMap<String, ResourceAccess>,
}

/// Verifies bearer tokens against one [`JwtAuthenticationOptions`].
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(options: &JwtAuthenticationOptions) -> Result<Self, InvalidVerifierKey> {
        let key = decoding_key(options.algorithm, options.public_key.as_bytes()).map_err(|source| {
            InvalidVerifierKey {
                algorithm: options.algorithm,
                source,
            }
        })?;

        let mut validation = Validation::new(options.algorithm);
        validation.set_audience(&[&options.audience]);
        validation.set_issuer(&[&options.issuer]);
        validation.set_required_spec_claims(&["aud", "exp", "iss", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = options.leeway_secs;

        Ok(Self { key, validation })
    }

    /// Verify `token` and return its payload. Any failure rejects the whole token.
    pub fn verify(&self, token: &str) -> Result<TokenPayload, AuthenticationError> {
        let data = decode::<TokenPayload>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

fn decoding_key(algorithm: Algorithm, key: &[u8]) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(DecodingKey::from_secret(key)),
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(key),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(key),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(key),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};

    use super::*;

    const SECRET: &str = "newsroom-test-secret";

    fn options() -> JwtAuthenticationOptions {
        JwtAuthenticationOptions {
            public_key: SECRET.to_string(),
            audience: "quill-internal".to_string(),
            issuer: "https://idp.example.org/realms/newsroom".to_string(),
            algorithm: Algorithm::HS256,
            ..Default::default()
        }
    }

    fn claims(exp_offset_secs: i64) -> Value {
        let now = Utc::now().timestamp();
        json!({
            "iss": "https://idp.example.org/realms/newsroom",
            "aud": ["quill-internal", "account"],
            "sub": uuid::Uuid::now_v7().to_string(),
            "iat": now - 600,
            "exp": now + exp_offset_secs,
            "email": "ann@example.org",
        })
    }

    fn sign(claims: &Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("failed to encode jwt")
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(&options()).unwrap()
    }

    #[test]
    fn accepts_a_well_formed_token() {
        let payload = verifier().verify(&sign(&claims(300), SECRET)).unwrap();
        assert_eq!(payload.email.as_deref(), Some("ann@example.org"));
        assert!(payload.resource_access.is_empty());
    }

    #[test]
    fn rejects_foreign_signing_key() {
        let err = verifier().verify(&sign(&claims(300), "some-other-secret")).unwrap_err();
        assert_eq!(err, AuthenticationError::InvalidSignature);
    }

    #[test]
    fn rejects_tokens_expired_beyond_leeway() {
        let err = verifier().verify(&sign(&claims(-120), SECRET)).unwrap_err();
        assert_eq!(err, AuthenticationError::Expired);
    }

    #[test]
    fn tolerates_expiry_within_leeway() {
        assert!(verifier().verify(&sign(&claims(-20), SECRET)).is_ok());
    }

    #[test]
    fn rejects_wrong_audience_and_issuer() {
        let mut c = claims(300);
        c["aud"] = json!("someone-else");
        assert_eq!(
            verifier().verify(&sign(&c, SECRET)).unwrap_err(),
            AuthenticationError::InvalidAudience
        );

        let mut c = claims(300);
        c["iss"] = json!("https://evil.example.org");
        assert_eq!(
            verifier().verify(&sign(&c, SECRET)).unwrap_err(),
            AuthenticationError::InvalidIssuer
        );
    }

    #[test]
    fn rejects_missing_or_malformed_subject() {
        let mut c = claims(300);
        c.as_object_mut().unwrap().remove("sub");
        assert!(matches!(
            verifier().verify(&sign(&c, SECRET)),
            Err(AuthenticationError::Malformed(_))
        ));

        let mut c = claims(300);
        c["sub"] = json!("not-a-uuid");
        assert!(matches!(
            verifier().verify(&sign(&c, SECRET)),
            Err(AuthenticationError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            verifier().verify("definitely.not.a-jwt"),
            Err(AuthenticationError::Malformed(_))
        ));
    }

    #[test]
    fn rsa_verifier_needs_a_pem_key() {
        let opts = JwtAuthenticationOptions {
            algorithm: Algorithm::RS256,
            public_key: "not a pem".to_string(),
            ..options()
        };
        assert!(TokenVerifier::new(&opts).is_err());
    }
}
