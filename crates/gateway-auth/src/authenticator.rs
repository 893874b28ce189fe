//! Bearer token authentication.

use tracing::debug;

use gateway_core::config::auth::AuthConfig;
use gateway_core::error::AppError;
use gateway_entity::user::{Identity, UserRole};

use crate::error::AuthError;
use crate::jwt::JwtDecoder;
use crate::rbac::RoleEnforcer;

/// Scheme prefix of the `Authorization` header.
const BEARER_PREFIX: &str = "Bearer ";

/// A caller whose token has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Identity resolved from the token claims.
    pub identity: Identity,
    /// Whether the caller's role grants access to every job.
    pub is_admin: bool,
    /// The raw bearer token, forwarded to the processing service.
    pub token: String,
}

/// Verifies bearer tokens and resolves caller identities.
#[derive(Debug, Clone)]
pub struct Authenticator {
    decoder: JwtDecoder,
    roles: RoleEnforcer,
}

impl Authenticator {
    /// Build an authenticator from configuration.
    ///
    /// Entries of `admin_roles` are matched exactly against the token's
    /// role claim. Fails when an entry is blank.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let admin_roles = config
            .admin_roles
            .iter()
            .map(|r| {
                if r.trim().is_empty() {
                    return Err(AppError::configuration(
                        "Blank role name in auth.admin_roles",
                    ));
                }
                Ok(UserRole::from(r.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            decoder: JwtDecoder::new(config),
            roles: RoleEnforcer::new(admin_roles),
        })
    }

    /// Role checks bound to the configured administrator roles.
    pub fn roles(&self) -> &RoleEnforcer {
        &self.roles
    }

    /// Authenticate from the raw `Authorization` header value.
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(header)?;
        let claims = self.decoder.decode(token)?;

        let id = claims
            .user_id()
            .ok_or_else(|| AuthError::Invalid("token carries no user id".to_string()))?
            .to_string();
        let identity = Identity {
            id,
            email: claims.email,
            role: UserRole::from(claims.role),
            name: claims.name,
            hospital: claims.hospital,
        };

        Ok(AuthenticatedUser {
            is_admin: self.roles.is_admin(&identity.role),
            identity,
            token: token.to_string(),
        })
    }

    /// Like [`authenticate`](Self::authenticate) but never fails: missing or
    /// invalid credentials yield an anonymous caller.
    pub fn authenticate_optional(&self, header: Option<&str>) -> Option<AuthenticatedUser> {
        match self.authenticate(header) {
            Ok(user) => Some(user),
            Err(AuthError::Missing) => None,
            Err(e) => {
                debug!(error = %e, "Ignoring invalid credentials on optional route");
                None
            }
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::Missing)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::Malformed)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}
