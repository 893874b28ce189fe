//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// The identity resolved from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
}
