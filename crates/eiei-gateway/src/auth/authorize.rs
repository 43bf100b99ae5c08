//! The hard authentication gate and the boolean authorization decision.
//!
//! Both entry points share `check_token`: revocation first, then signature
//! and expiry. The gate raises a structured rejection; `authorize` folds
//! every failure into `false`.

use super::jwt::{Claims, TokenIssuer};
use super::middleware::AuthState;
use super::revocation::RevocationRegistry;
use super::users::User;
use super::{AuthError, TokenRejection};

/// Verify `token` against the revocation registry and the issuer.
///
/// # Errors
///
/// Returns `AuthError::TokenRejected` with the reason, or a storage error
/// if the registry is unreachable.
pub fn check_token(
    issuer: &TokenIssuer,
    revocations: &RevocationRegistry,
    token: &str,
) -> Result<Claims, AuthError> {
    if revocations.is_revoked(token)? {
        return Err(TokenRejection::Revoked.into());
    }
    Ok(issuer.verify(token)?)
}

/// Does `token` carry exactly `required_role` (and, if given, belong to
/// `expected_subject`)?
///
/// Total over its inputs: any failure, including an unreachable registry,
/// answers `false`.
#[must_use]
pub fn authorize(
    issuer: &TokenIssuer,
    revocations: &RevocationRegistry,
    token: &str,
    required_role: &str,
    expected_subject: Option<&str>,
) -> bool {
    let claims = match check_token(issuer, revocations, token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Authorization check failed verification");
            return false;
        }
    };

    if expected_subject.is_some_and(|subject| subject != claims.sub) {
        return false;
    }

    claims.role == required_role
}

/// A caller that passed the hard gate.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// The presented bearer token.
    pub token: String,
    /// Its verified claims.
    pub claims: Claims,
    /// Current user record for the subject.
    pub user: User,
}

impl Authenticated {
    /// Get the user ID.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.claims.sub
    }

    /// Role embedded in the token.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.claims.role
    }
}

impl AuthState {
    /// Hard gate for identity-bearing operations.
    ///
    /// A token whose subject no longer exists is rejected like an invalid
    /// token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenRejected` on any token failure.
    pub fn authenticate(&self, token: &str) -> Result<Authenticated, AuthError> {
        let claims = match check_token(&self.issuer, &self.revocations, token) {
            Ok(claims) => claims,
            Err(AuthError::TokenRejected(reason)) => {
                tracing::warn!(reason = %reason, "Rejected bearer token");
                return Err(reason.into());
            }
            Err(e) => return Err(e),
        };

        let Some(user) = self.users.get(&claims.sub)? else {
            tracing::warn!(reason = %TokenRejection::UnknownSubject, "Rejected bearer token");
            return Err(TokenRejection::UnknownSubject.into());
        };

        Ok(Authenticated {
            token: token.to_string(),
            claims,
            user,
        })
    }

    /// Boolean authorization decision.
    #[must_use]
    pub fn is_authorized(
        &self,
        token: &str,
        required_role: &str,
        expected_subject: Option<&str>,
    ) -> bool {
        authorize(
            &self.issuer,
            &self.revocations,
            token,
            required_role,
            expected_subject,
        )
    }
}
