use std::fmt;

use rocket::http::Status;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// A single rejected input field from a registration payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why the access guard turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    NoToken,
    TokenFailed,
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnauthorizedReason::NoToken => f.write_str("no token"),
            UnauthorizedReason::TokenFailed => f.write_str("token failed"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{}", join_field_errors(.0))]
    Validation(Vec<FieldError>),
    #[error("User already exists")]
    DuplicateAccount,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Not authorized, {0}")]
    Unauthorized(UnauthorizedReason),
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("User not found")]
    NotFound,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Sqlx(#[from] rocket_db_pools::sqlx::Error),
    #[error("jwt error: {0}")]
    Jwt(jsonwebtoken::errors::Error),
    #[error("argon2 parameter error: {0}")]
    Argon2(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::Validation(_) | AuthError::DuplicateAccount => Status::BadRequest,
            AuthError::InvalidCredentials => Status::Unauthorized,
            AuthError::Unauthorized(_) | AuthError::TokenExpired | AuthError::TokenInvalid => {
                Status::Unauthorized
            }
            AuthError::NotFound => Status::NotFound,
            AuthError::Config(_)
            | AuthError::Sqlx(_)
            | AuthError::Jwt(_)
            | AuthError::Argon2(_)
            | AuthError::PasswordHash(_)
            | AuthError::Other(_) => Status::InternalServerError,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status().code >= 500
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::Argon2(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Other(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_message() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
        assert_eq!(AuthError::InvalidCredentials.status(), Status::Unauthorized);
    }

    #[test]
    fn guard_rejections_render_reason() {
        assert_eq!(
            AuthError::Unauthorized(UnauthorizedReason::NoToken).to_string(),
            "Not authorized, no token"
        );
        assert_eq!(
            AuthError::Unauthorized(UnauthorizedReason::TokenFailed).to_string(),
            "Not authorized, token failed"
        );
    }

    #[test]
    fn validation_errors_join_field_messages() {
        let err = AuthError::Validation(vec![
            FieldError::new("username", "Please provide a username"),
            FieldError::new("email", "Please provide a valid email"),
        ]);
        assert_eq!(
            err.to_string(),
            "Please provide a username, Please provide a valid email"
        );
        assert_eq!(err.status(), Status::BadRequest);
    }

    #[test]
    fn infrastructure_failures_are_server_errors() {
        assert!(AuthError::Config("missing".into()).is_server_error());
        assert!(!AuthError::DuplicateAccount.is_server_error());
        assert_eq!(AuthError::NotFound.status(), Status::NotFound);
    }
}
