//! JWT claims structure carried in bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims payload.
///
/// Tokens minted by other services identify the user with either `id` or
/// the standard `sub`; both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Subject, used when `id` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: String,
    /// Role display name; empty when the issuer sent none.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default)]
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// The user ID, preferring `id` over `sub`.
    pub fn user_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.sub.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}
