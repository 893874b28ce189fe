//! Authentication failures.

use thiserror::Error;

use gateway_core::error::{AppError, ErrorKind};

/// Why a request could not be authenticated.
///
/// Each variant maps to its own error kind so that clients can tell an
/// expired session apart from a bad credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header.
    #[error("no token provided")]
    Missing,
    /// The header is present but does not carry a bearer token.
    #[error("authorization header must use the Bearer scheme")]
    Malformed,
    /// The token's `exp` is in the past.
    #[error("token has expired")]
    Expired,
    /// Signature, structure, or claims are invalid.
    #[error("invalid token: {0}")]
    Invalid(String),
}

impl AuthError {
    /// The application error kind this failure maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Missing => ErrorKind::AuthRequired,
            Self::Malformed => ErrorKind::MalformedToken,
            Self::Expired => ErrorKind::TokenExpired,
            Self::Invalid(_) => ErrorKind::InvalidToken,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = match &err {
            AuthError::Missing => "No token provided".to_string(),
            AuthError::Malformed => "Authorization header must be 'Bearer <token>'".to_string(),
            AuthError::Expired => "Your session has expired, please log in again".to_string(),
            AuthError::Invalid(_) => "The provided token is invalid".to_string(),
        };
        AppError::with_source(err.kind(), message, err)
    }
}
