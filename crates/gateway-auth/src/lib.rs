//! # gateway-auth
//!
//! Stateless bearer-token authentication and role checks for the imaging
//! gateway.
//!
//! ## Modules
//!
//! - `jwt`: token claims, verification, and issuance
//! - `authenticator`: `Authorization` header handling and identity resolution
//! - `rbac`: role-based access checks

pub mod authenticator;
pub mod error;
pub mod jwt;
pub mod rbac;

pub use authenticator::{AuthenticatedUser, Authenticator};
pub use error::AuthError;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use rbac::RoleEnforcer;
