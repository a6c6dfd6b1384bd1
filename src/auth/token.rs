//! Proxy-authorization token issuing and inspection.

use std::collections::HashSet;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

/// Header carrying the token on deploy responses and proxied requests.
pub const PROXY_AUTHORIZATION: &str = "proxy-authorization";

/// Claims carried by a proxy-authorization token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyClaims {
    /// Application id the token was issued for. Only its presence is
    /// checked; an empty string is still a subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Not-before, unix seconds.
    pub nbf: i64,
}

/// Issues and inspects proxy-authorization tokens.
#[derive(Debug, Clone)]
pub struct TokenAuthority {
    validation: Validation,
}

impl TokenAuthority {
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // SECURITY GAP: signatures are not re-verified. The signing secret
        // belongs to the deploying application and is never stored here.
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self { validation }
    }

    /// Issue a token for `application_id`, signed with `secret`.
    pub fn issue(&self, application_id: &str, secret: &str) -> GatewayResult<String> {
        let claims = ProxyClaims {
            sub: Some(application_id.to_string()),
            nbf: Utc::now().timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| GatewayError::Token(e.to_string()))
    }

    /// Decode `token` and check its claims.
    ///
    /// Fails when the token does not decode, has no subject, or its
    /// not-before time is in the future.
    pub fn validate(&self, token: &str) -> GatewayResult<ProxyClaims> {
        let data = decode::<ProxyClaims>(token, &DecodingKey::from_secret(&[]), &self.validation)
            .map_err(|e| GatewayError::AuthorizationInvalid(e.to_string()))?;
        let claims = data.claims;

        if claims.sub.is_none() {
            return Err(GatewayError::AuthorizationInvalid("missing subject".into()));
        }
        if claims.nbf > Utc::now().timestamp() {
            return Err(GatewayError::AuthorizationInvalid(
                "token is not valid yet".into(),
            ));
        }

        Ok(claims)
    }
}

impl Default for TokenAuthority {
    fn default() -> Self {
        Self::new()
    }
}
