//! Role checks for route guards and job ownership.

use serde_json::Value;

use gateway_core::error::AppError;
use gateway_entity::user::UserRole;

/// Decides which roles may act on behalf of every user.
#[derive(Debug, Clone)]
pub struct RoleEnforcer {
    admin_roles: Vec<UserRole>,
}

impl RoleEnforcer {
    pub fn new(admin_roles: Vec<UserRole>) -> Self {
        Self { admin_roles }
    }

    /// Returns whether the role is an administrator role. Names must match
    /// exactly; unknown roles only qualify when configured verbatim.
    pub fn is_admin(&self, role: &UserRole) -> bool {
        self.admin_roles.contains(role)
    }

    /// Fails with `Forbidden` unless `role` is one of `allowed`.
    ///
    /// The error lists the permitted roles so clients can explain the denial.
    pub fn require_any(&self, role: &UserRole, allowed: &[UserRole]) -> Result<(), AppError> {
        if allowed.contains(role) {
            return Ok(());
        }
        let required: Vec<Value> = allowed
            .iter()
            .map(|r| Value::String(r.as_str().to_string()))
            .collect();
        Err(AppError::forbidden(format!(
            "Role '{role}' is not permitted to perform this action"
        ))
        .with_context("requiredRoles", required)
        .with_context("userRole", role.as_str()))
    }

    /// Fails with `Forbidden` unless `role` is an administrator role.
    pub fn require_admin(&self, role: &UserRole) -> Result<(), AppError> {
        self.require_any(role, &self.admin_roles)
    }
}
