//! RBAC helpers for role-based route guarding.

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Checks that the authenticated user holds an administrator role.
pub fn require_admin(state: &AppState, auth: &AuthUser) -> Result<(), ApiError> {
    state
        .authenticator
        .roles()
        .require_admin(auth.role())
        .map_err(ApiError::from)
}
