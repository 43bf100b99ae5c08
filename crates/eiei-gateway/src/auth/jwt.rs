//! Access token issuance and verification (HS256).

use chrono::{DateTime, Duration, Utc};
use eiei_core::SigningSecret;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use super::{AuthError, TokenRejection};

/// Signed token claims.
///
/// `role` is copied in at issuance; a later role change only shows up in
/// tokens issued after the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Role name at issuance.
    pub role: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID, so two tokens minted in the same second differ.
    pub jti: String,
}

impl Claims {
    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly minted token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// The bearer string.
    pub token: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies access tokens with a symmetric secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer for the given secret.
    ///
    /// `default_ttl` applies when `issue` is called without a ttl.
    #[must_use]
    pub fn new(secret: &SigningSecret, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.expose()),
            decoding_key: DecodingKey::from_secret(secret.expose()),
            validation,
            default_ttl,
        }
    }

    /// Default token lifetime.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Mint a token for `subject` holding `role`.
    ///
    /// A negative `ttl` yields an already expired token.
    ///
    /// # Errors
    ///
    /// Returns error if the expiry overflows or token encoding fails.
    pub fn issue(
        &self,
        subject: &str,
        role: &str,
        ttl: Option<Duration>,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl.unwrap_or(self.default_ttl))
            .ok_or_else(|| AuthError::Token("Token lifetime out of range".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Token(format!("Encoding failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature, then expiry, and return the claims.
    ///
    /// Revocation is not checked here.
    ///
    /// # Errors
    ///
    /// Returns `TokenRejection::Expired` for an elapsed `exp`, and
    /// `TokenRejection::Malformed` for everything else.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenRejection> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Malformed,
            })
    }

    /// Extract token from an Authorization header value.
    ///
    /// Expects format: "Bearer <token>"
    #[must_use]
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
