//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hospital roles carried in bearer tokens.
///
/// Known roles are recognised by their exact display name. Any other value,
/// including an empty one from a token without a role claim, is kept
/// verbatim in [`UserRole::Other`] so tokens from other issuers still
/// authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    /// System administrator.
    ItAdministrator,
    /// Reads and reports on studies.
    Radiologist,
    /// Acquires studies.
    Radiographer,
    /// Referring physician.
    Doctor,
    /// Billing staff.
    FinanceUser,
    /// A role this gateway has no name for.
    Other(String),
}

impl UserRole {
    /// Return the role's display name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ItAdministrator => "IT Administrator",
            Self::Radiologist => "Radiologist",
            Self::Radiographer => "Radiographer",
            Self::Doctor => "Doctor",
            Self::FinanceUser => "Finance User",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for UserRole {
    fn from(name: &str) -> Self {
        match name {
            "IT Administrator" => Self::ItAdministrator,
            "Radiologist" => Self::Radiologist,
            "Radiographer" => Self::Radiographer,
            "Doctor" => Self::Doctor,
            "Finance User" => Self::FinanceUser,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for UserRole {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}
