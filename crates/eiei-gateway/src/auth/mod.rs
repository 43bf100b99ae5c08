//! Authentication and authorization for the account service.
//!
//! This module provides:
//! - Salted, adaptive password hashing
//! - Signed access token issuance and verification
//! - A durable revocation registry consulted on every protected call
//! - The hard authentication gate and the boolean authorization decision
//! - The user directory and the account operations built on top of it

mod accounts;
mod authorize;
mod config;
mod hasher;
mod jwt;
mod middleware;
mod revocation;
mod users;

pub use accounts::{
    AuthorizationQuery, ChangePasswordRequest, ListQuery, LoginRequest, LoginResponse,
    ProfileUpdate, RegisterRequest,
};
pub use authorize::{Authenticated, authorize, check_token};
pub use config::{AuthConfig, AuthConfigBuilder};
pub use hasher::CredentialHasher;
pub use jwt::{Claims, IssuedToken, TokenIssuer};
pub use middleware::{AuthState, BearerToken, ClientAddr, RequireAuth};
pub use revocation::{RevocationEntry, RevocationRegistry};
pub use users::{PublicUser, Role, User, UserStore};

#[cfg(test)]
pub(crate) use accounts::{test_state, vendor_registration};

use eiei_core::ValidationError;
use thiserror::Error;

/// Why a presented token was not accepted.
///
/// Kept distinct for logging; the HTTP boundary collapses all but
/// `Revoked` into one generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Signature mismatch, wrong algorithm, or undecodable payload.
    Malformed,
    /// Signature valid but `exp` has passed.
    Expired,
    /// Token was explicitly revoked (logout).
    Revoked,
    /// Token is valid but its subject no longer resolves to a user.
    UnknownSubject,
}

impl TokenRejection {
    /// Message shown to callers.
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::Revoked => "Token has been revoked",
            Self::Malformed | Self::Expired | Self::UnknownSubject => {
                "Could not validate credentials"
            }
        }
    }

    /// Internal reason label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::UnknownSubject => "unknown_subject",
        }
    }
}

impl std::fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email/password combination. Never says which one.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No bearer token was presented.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Bearer token was presented but rejected.
    #[error("{}", .0.public_message())]
    TokenRejected(TokenRejection),

    /// Email already belongs to another account.
    #[error("Email already registered")]
    DuplicateEmail(String),

    /// User not found.
    #[error("User not found")]
    UserNotFound(String),

    /// Requested role does not exist.
    #[error("Invalid role")]
    RoleNotFound(String),

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Too many attempts for this account.
    #[error("Too many login attempts, try again later")]
    RateLimited,

    /// Stored hash or salt could not be parsed.
    #[error("Corrupt credential record: {0}")]
    CorruptCredential(String),

    /// Token encoding failure.
    #[error("Token error: {0}")]
    Token(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Background task failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenRejection> for AuthError {
    fn from(reason: TokenRejection) -> Self {
        Self::TokenRejected(reason)
    }
}
