//! Input validation and normalisation for account fields.
//!
//! Only checks that matter for account identity are performed here; the
//! transport layer handles payload shape.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Validation error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input exceeds maximum allowed length.
    #[error("{field} exceeds maximum length ({max} chars, got {actual})")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
        /// Actual input length.
        actual: usize,
    },

    /// Required field is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Email address is not well formed.
    #[error("Invalid email address")]
    InvalidEmail,

    /// Password is too short.
    #[error("Password must be at least {min} characters")]
    WeakPassword {
        /// Minimum length.
        min: usize,
    },

    /// Disallowed characters in input.
    #[error("Disallowed characters in {0}")]
    DisallowedChars(&'static str),
}

/// Size limits per field.
pub mod limits {
    /// Maximum email length (RFC 5321 path limit).
    pub const MAX_EMAIL_LENGTH: usize = 254;

    /// Maximum first/last name length.
    pub const MAX_NAME_LENGTH: usize = 100;

    /// Maximum phone number length.
    pub const MAX_PHONE_LENGTH: usize = 32;

    /// Minimum password length.
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// Maximum password length (bounds hashing work).
    pub const MAX_PASSWORD_LENGTH: usize = 256;
}

/// Normalise and validate an email address.
///
/// Emails are trimmed and lowercased so uniqueness is case-insensitive.
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` if the address is malformed.
pub fn normalize_email(input: &str) -> Result<String, ValidationError> {
    let email = input.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Empty("email"));
    }
    check_length("email", &email, limits::MAX_EMAIL_LENGTH)?;

    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidEmail);
    }

    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(email)
}

/// Validate and sanitise a display name.
///
/// Control characters are stripped and the result is NFKC-normalised.
///
/// # Errors
///
/// Returns error if the name is empty or too long.
pub fn sanitize_name(field: &'static str, input: &str) -> Result<String, ValidationError> {
    let sanitized: String = input.chars().filter(|c| !c.is_control()).collect();
    let normalized: String = sanitized.trim().nfkc().collect();

    if normalized.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    check_length(field, &normalized, limits::MAX_NAME_LENGTH)?;

    Ok(normalized)
}

/// Validate a phone number.
///
/// Accepts digits with an optional leading `+` and the separators
/// space, `-`, `(` and `)`.
///
/// # Errors
///
/// Returns error if the number contains other characters.
pub fn validate_phone(input: &str) -> Result<String, ValidationError> {
    let phone = input.trim();

    if phone.is_empty() {
        return Err(ValidationError::Empty("phone_number"));
    }
    check_length("phone_number", phone, limits::MAX_PHONE_LENGTH)?;

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
        || !body.chars().any(|c| c.is_ascii_digit())
    {
        return Err(ValidationError::DisallowedChars("phone_number"));
    }

    Ok(phone.to_string())
}

/// Check a plaintext password against length bounds.
///
/// # Errors
///
/// Returns error if the password is too short or too long.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < limits::MIN_PASSWORD_LENGTH {
        return Err(ValidationError::WeakPassword {
            min: limits::MIN_PASSWORD_LENGTH,
        });
    }
    if len > limits::MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "password",
            max: limits::MAX_PASSWORD_LENGTH,
            actual: len,
        });
    }
    if password.contains('\0') {
        return Err(ValidationError::DisallowedChars("password"));
    }
    Ok(())
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}
