//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Bearer token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Lifetime of tokens minted by `issue-token`, in hours.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: u64,
    /// Clock skew tolerated when checking `exp`, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Roles allowed to see and mutate every job.
    #[serde(default = "default_admin_roles")]
    pub admin_roles: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl(),
            leeway_seconds: default_leeway(),
            admin_roles: default_admin_roles(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_token_ttl() -> u64 {
    24
}

fn default_leeway() -> u64 {
    5
}

fn default_admin_roles() -> Vec<String> {
    vec!["IT Administrator".to_string()]
}
