//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};

use gateway_entity::user::{Identity, UserRole};

/// Context for the current authenticated request.
///
/// Built by the HTTP layer and passed into service methods so that every
/// operation knows *who* is acting and with which credentials.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The caller's identity from the verified token.
    pub identity: Identity,
    /// Whether the caller holds an administrator role.
    pub is_admin: bool,
    /// The caller's bearer token, passed through to the processing service.
    pub bearer_token: Option<String>,
    /// IP address of the request origin.
    pub ip_address: String,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(
        identity: Identity,
        is_admin: bool,
        bearer_token: Option<String>,
        ip_address: String,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            identity,
            is_admin,
            bearer_token,
            ip_address,
            user_agent,
            request_time: Utc::now(),
        }
    }

    /// The caller's user ID.
    pub fn user_id(&self) -> &str {
        &self.identity.id
    }

    /// The caller's role.
    pub fn role(&self) -> &UserRole {
        &self.identity.role
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}
