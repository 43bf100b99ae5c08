//! Authentication state and axum extractors.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Json,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use eiei_core::SigningSecret;
use serde::Serialize;

use super::AuthError;
use super::authorize::Authenticated;
use super::config::AuthConfig;
use super::hasher::CredentialHasher;
use super::jwt::TokenIssuer;
use super::revocation::RevocationRegistry;
use super::users::UserStore;
use crate::middleware::LoginRateLimiter;

/// Shared authentication state.
pub struct AuthState {
    /// Auth configuration.
    pub config: AuthConfig,
    /// Password hasher.
    pub hasher: CredentialHasher,
    /// Token issuer/verifier.
    pub issuer: TokenIssuer,
    /// User directory.
    pub users: UserStore,
    /// Revoked tokens.
    pub revocations: RevocationRegistry,
    /// Per-email login limiter.
    pub login_limiter: LoginRateLimiter,
}

impl AuthState {
    /// Assemble auth state from its parts.
    ///
    /// # Errors
    ///
    /// Returns error if the hashing parameters are invalid or the
    /// revocation tree cannot be opened.
    pub fn new(
        config: AuthConfig,
        secret: &SigningSecret,
        users: UserStore,
    ) -> Result<Self, AuthError> {
        let hasher = CredentialHasher::new(config.hashing)?;
        let issuer = TokenIssuer::new(secret, config.token_expiry);
        let revocations = RevocationRegistry::with_db(users.db())?;
        let login_limiter = LoginRateLimiter::new(config.login_attempts_per_minute);

        Ok(Self {
            config,
            hasher,
            issuer,
            users,
            revocations,
            login_limiter,
        })
    }

    /// Open the store under `data_dir`, resolve the signing secret and
    /// seed the default roles.
    ///
    /// A missing secret is generated; tokens then do not survive a restart.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be opened or the secret is invalid.
    pub fn initialize(config: AuthConfig, data_dir: &std::path::Path) -> Result<Self, AuthError> {
        let users = UserStore::open(data_dir)?;

        let secret = match &config.jwt_secret {
            Some(hex_secret) => SigningSecret::from_hex(hex_secret)
                .map_err(|e| AuthError::Config(format!("Invalid JWT secret: {e}")))?,
            None => {
                tracing::warn!(
                    "No JWT secret configured, generated an ephemeral one; set EIEI_JWT_SECRET to keep tokens valid across restarts"
                );
                SigningSecret::generate()
            }
        };

        let state = Self::new(config, &secret, users)?;
        let seeded = state.users.seed_roles(&state.config.default_roles)?;
        tracing::debug!(seeded, "Default roles checked");

        Ok(state)
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("user_count", &self.users.count())
            .field("revoked", &self.revocations.len())
            .finish_non_exhaustive()
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    detail: String,
    code: &'static str,
}

impl AuthError {
    /// HTTP status and stable machine code.
    #[must_use]
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            Self::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            Self::TokenRejected(super::TokenRejection::Revoked) => {
                (StatusCode::UNAUTHORIZED, "token_revoked")
            }
            Self::TokenRejected(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
            Self::DuplicateEmail(_) => (StatusCode::BAD_REQUEST, "duplicate_email"),
            Self::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),
            Self::RoleNotFound(_) => (StatusCode::BAD_REQUEST, "invalid_role"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Self::CorruptCredential(_)
            | Self::Token(_)
            | Self::Storage(_)
            | Self::Config(_)
            | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(AuthErrorResponse { detail, code })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Raw bearer token from the `Authorization` header, if any.
///
/// Never rejects; used where a missing token is an answer, not an error.
#[derive(Debug, Clone)]
pub struct BearerToken(pub Option<String>);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(TokenIssuer::extract_from_header)
            .map(ToString::to_string);

        Ok(Self(token))
    }
}

/// Peer IP address, when the server was started with connect info.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(Self(addr))
    }
}

/// Extractor for authenticated requests.
///
/// Use this in handler parameters to require authentication.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Authenticated);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    Arc<AuthState>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = Arc::<AuthState>::from_ref(state);

        let BearerToken(token) = BearerToken::from_request_parts(parts, state)
            .await
            .unwrap_or(BearerToken(None));
        let token = token.ok_or(AuthError::NotAuthenticated)?;

        auth_state.authenticate(&token).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenRejection;
    use axum::http::Request;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_seeds_roles() {
        let temp_dir = TempDir::new().unwrap();
        let config = AuthConfig::builder()
            .hashing(crate::auth::hasher::test_hasher().settings())
            .build();

        let state = AuthState::initialize(config, temp_dir.path()).unwrap();
        let roles: Vec<_> = state
            .users
            .list_roles()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(roles, vec!["organizer", "vendor"]);
    }

    #[test]
    fn test_initialize_rejects_bad_secret() {
        let temp_dir = TempDir::new().unwrap();
        let config = AuthConfig::builder().jwt_secret("zz").build();

        let result = AuthState::initialize(config, temp_dir.path());
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            AuthError::InvalidCredentials.status().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::DuplicateEmail("a@x.com".into()).status(),
            (StatusCode::BAD_REQUEST, "duplicate_email")
        );
        assert_eq!(
            AuthError::TokenRejected(TokenRejection::Revoked).status().1,
            "token_revoked"
        );
        assert_eq!(
            AuthError::Storage("down".into()).status().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = AuthError::NotAuthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_bearer_token_extractor() {
        let (mut parts, ()) = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .unwrap()
            .into_parts();
        let BearerToken(token) = BearerToken::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("abc.def.ghi"));

        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        let BearerToken(token) = BearerToken::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_client_addr_extractor() {
        let peer: SocketAddr = "192.0.2.7:53211".parse().unwrap();
        let (mut parts, ()) = Request::builder()
            .extension(ConnectInfo(peer))
            .body(())
            .unwrap()
            .into_parts();
        let ClientAddr(addr) = ClientAddr::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(addr, Some(peer.ip()));

        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        let ClientAddr(addr) = ClientAddr::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(addr.is_none());
    }
}
