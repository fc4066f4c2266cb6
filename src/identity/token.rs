use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::{debug, instrument};

use super::models::{Identity, IdentityClaims};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid identity token: {0}")]
    InvalidToken(String),
}

/// Verifies HS256 identity tokens shared with the identity provider
#[derive(Clone)]
pub struct IdentityTokenConfig {
    secret: String,
}

impl IdentityTokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Validates a token and returns the identity it names
    #[instrument(skip(self, token))]
    pub fn decode(&self, token: &str) -> Result<Identity, IdentityError> {
        decode::<IdentityClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(identity_id = %data.claims.sub, exp = data.claims.exp, "Identity token decoded");
            Identity::from(data.claims)
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode identity token");
            IdentityError::InvalidToken(e.to_string())
        })
    }

    /// Issues a token for `identity`. Used by local tooling and tests standing in
    /// for the provider.
    pub fn create_token(
        &self,
        identity: &Identity,
        valid_for: Duration,
    ) -> Result<String, IdentityError> {
        let claims = IdentityClaims {
            sub: identity.id.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            picture: identity.photo_url.clone(),
            exp: (Utc::now() + valid_for).timestamp().max(0) as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| IdentityError::InvalidToken(e.to_string()))
    }
}
