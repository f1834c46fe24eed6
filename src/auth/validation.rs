//! Server-side validation and normalization of registration input.
//!
//! Clients may mirror these checks for responsiveness, but the results here are
//! authoritative.

use std::sync::LazyLock;

use regex::Regex;

use crate::auth::responses::RegisterRequest;
use crate::auth::{AuthError, AuthResult, FieldError};

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

/// ASCII digits only; `\d` would also admit other scripts' digits.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));

/// Registration input after trimming and case normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub full_name: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Check every field and report all failures together.
pub fn validate_registration(request: &RegisterRequest) -> AuthResult<ValidRegistration> {
    let mut errors = Vec::new();

    let username = request.username.trim().to_string();
    if username.is_empty() {
        errors.push(FieldError::new("username", "Please provide a username"));
    }

    let email = normalize_email(&request.email);
    if email.is_empty() {
        errors.push(FieldError::new("email", "Please provide an email"));
    } else if !is_valid_email(&email) {
        errors.push(FieldError::new("email", "Please provide a valid email"));
    }

    // Passwords are taken verbatim; whitespace is significant. Length is in
    // Unicode scalar values.
    if request.password.is_empty() {
        errors.push(FieldError::new("password", "Please provide a password"));
    } else if request.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    let phone_number = request.phone_number.trim().to_string();
    if phone_number.is_empty() {
        errors.push(FieldError::new("phoneNumber", "Please provide a phone number"));
    } else if !is_valid_phone(&phone_number) {
        errors.push(FieldError::new(
            "phoneNumber",
            format!("{phone_number} is not a valid phone number! Format: 1234567890"),
        ));
    }

    let full_name = request.full_name.trim().to_string();
    if full_name.is_empty() {
        errors.push(FieldError::new("fullName", "Please provide your full name"));
    }

    if !errors.is_empty() {
        return Err(AuthError::Validation(errors));
    }

    Ok(ValidRegistration {
        username,
        email,
        password: request.password.clone(),
        phone_number,
        full_name,
    })
}
