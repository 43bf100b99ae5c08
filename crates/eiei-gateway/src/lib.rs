//! # Eiei Gateway
//!
//! User-account and authentication service: credential hashing, access
//! tokens, revocation, role authorization, and the HTTP surface over them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and authorization.
pub mod auth;
mod middleware;
/// HTTP routes.
pub mod routes;
mod server;

pub use auth::{AuthConfig, AuthError, AuthState, PublicUser, TokenRejection, User, UserStore};
pub use middleware::LoginRateLimiter;
pub use server::{Gateway, GatewayBuilder, GatewayConfig, GatewayState};

/// Start the gateway server.
///
/// # Errors
///
/// Returns error if server fails to start.
pub async fn start(config: GatewayConfig) -> Result<(), GatewayError> {
    let gateway = Gateway::new(config)?;
    gateway.run().await
}

/// Gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Server error.
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Authentication setup error.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
