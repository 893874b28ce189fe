//! JWT token creation for operator-issued tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use gateway_core::config::auth::AuthConfig;
use gateway_core::error::AppError;
use gateway_entity::user::Identity;

use super::claims::Claims;

/// Creates signed bearer tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Token lifetime in hours.
    ttl_hours: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_hours: config.token_ttl_hours as i64,
        }
    }

    /// Signs a token for `identity`, valid for the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, AppError> {
        self.issue_at(identity, Utc::now())
    }

    /// Signs a token as if issued at `now`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let expires_at = now + chrono::Duration::hours(self.ttl_hours);
        let claims = Claims {
            id: Some(identity.id.clone()),
            sub: None,
            email: identity.email.clone(),
            role: identity.role.as_str().to_string(),
            name: identity.name.clone(),
            hospital: identity.hospital.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}
