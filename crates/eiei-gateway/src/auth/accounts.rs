//! Account operations: registration, login, logout, profile and password.
//!
//! These run the deliberately slow password hash, so HTTP handlers call
//! them on the blocking pool.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use eiei_core::{UserId, validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use super::authorize::Authenticated;
use super::hasher::CredentialHasher;
use super::middleware::AuthState;
use super::users::{PublicUser, User};
use crate::middleware::LoginRateLimiter;

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Email, unique across accounts.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Plaintext password.
    pub password: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Name of a seeded role.
    pub role: String,
}

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub access_token: String,
    /// Always "bearer".
    pub token_type: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// User ID.
    pub id: UserId,
    /// Role embedded in the token.
    pub role: String,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    /// New email.
    #[serde(default)]
    pub email: Option<String>,
    /// New given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// New family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// New phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Password change payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current plaintext password.
    pub current_password: String,
    /// New plaintext password.
    pub new_password: String,
}

/// Authorization question: does the caller hold `role` (and is it `user_id`)?
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationQuery {
    /// Required role, matched exactly.
    pub role: String,
    /// Expected subject, if any.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Paging for user listings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListQuery {
    /// Entries to skip.
    #[serde(default)]
    pub skip: usize,
    /// Maximum entries to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

const fn default_limit() -> usize {
    100
}

impl AuthState {
    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `RoleNotFound` or `DuplicateEmail`, or a
    /// storage error.
    pub fn register(&self, request: &RegisterRequest) -> Result<PublicUser, AuthError> {
        let email = validation::normalize_email(&request.email)?;
        let first_name = validation::sanitize_name("first_name", &request.first_name)?;
        let last_name = validation::sanitize_name("last_name", &request.last_name)?;
        let phone_number = validation::validate_phone(&request.phone_number)?;
        validation::validate_password(&request.password)?;

        let Some(role) = self.users.find_role(&request.role)? else {
            tracing::error!(role = %request.role, "Registration named a role that was never seeded");
            return Err(AuthError::RoleNotFound(request.role.clone()));
        };

        let salt = CredentialHasher::generate_salt();
        let password_hash = self.hasher.hash(&request.password, &salt)?;

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            email,
            first_name,
            last_name,
            phone_number,
            password_hash,
            salt,
            role: role.name,
            created_at: now,
            updated_at: now,
        };

        self.users.create(&user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "Registered user");

        Ok(user.to_public())
    }

    /// Check credentials and issue a token.
    ///
    /// `client` scopes the attempt quota; pass `None` when the peer is
    /// unknown.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for any unknown email or wrong
    /// password, and `RateLimited` once the attempt quota is spent.
    pub fn login(
        &self,
        request: &LoginRequest,
        client: Option<IpAddr>,
    ) -> Result<LoginResponse, AuthError> {
        let email =
            validation::normalize_email(&request.email).map_err(|_| AuthError::InvalidCredentials)?;

        if !self
            .login_limiter
            .check(&LoginRateLimiter::attempt_key(&email, client))
        {
            tracing::warn!("Login rate limit exceeded");
            return Err(AuthError::RateLimited);
        }

        let Some(user) = self.users.get_by_email(&email)? else {
            tracing::debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify(&request.password, &user.salt, &user.password_hash)?
        {
            tracing::info!(user_id = %user.id, "Login failed");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.issuer.issue(user.id.as_str(), &user.role, None)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_at: issued.expires_at,
            id: user.id,
            role: user.role,
        })
    }

    /// Revoke the caller's token.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn logout(&self, auth: &Authenticated) -> Result<(), AuthError> {
        self.revocations
            .revoke(&auth.token, auth.claims.expires_at())?;
        tracing::info!(user_id = %auth.user_id(), "User logged out");
        Ok(())
    }

    /// Apply a partial profile update to the caller's account.
    ///
    /// # Errors
    ///
    /// Returns `Validation` or `DuplicateEmail`, or a storage error.
    pub fn edit_profile(
        &self,
        auth: &Authenticated,
        update: &ProfileUpdate,
    ) -> Result<PublicUser, AuthError> {
        let mut user = self.current_record(auth)?;

        if let Some(email) = &update.email {
            user.email = validation::normalize_email(email)?;
        }
        if let Some(first_name) = &update.first_name {
            user.first_name = validation::sanitize_name("first_name", first_name)?;
        }
        if let Some(last_name) = &update.last_name {
            user.last_name = validation::sanitize_name("last_name", last_name)?;
        }
        if let Some(phone_number) = &update.phone_number {
            user.phone_number = validation::validate_phone(phone_number)?;
        }
        user.updated_at = Utc::now();

        self.users.update(&user)?;
        tracing::info!(user_id = %user.id, "Profile updated");

        Ok(user.to_public())
    }

    /// Change the caller's password, rotating the salt.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if the current password is wrong, or
    /// `Validation` if the new one is unacceptable.
    pub fn change_password(
        &self,
        auth: &Authenticated,
        request: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        let mut user = self.current_record(auth)?;

        if !self
            .hasher
            .verify(&request.current_password, &user.salt, &user.password_hash)?
        {
            tracing::info!(user_id = %user.id, "Password change with wrong current password");
            return Err(AuthError::InvalidCredentials);
        }
        validation::validate_password(&request.new_password)?;

        let salt = CredentialHasher::generate_salt();
        user.password_hash = self.hasher.hash(&request.new_password, &salt)?;
        user.salt = salt;
        user.updated_at = Utc::now();

        self.users.update(&user)?;
        tracing::info!(user_id = %user.id, "Password changed");

        Ok(())
    }

    /// Public profile of any user.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the ID is unknown.
    pub fn user_info(&self, id: &str) -> Result<PublicUser, AuthError> {
        self.users
            .get(id)?
            .map(|u| u.to_public())
            .ok_or_else(|| AuthError::UserNotFound(id.to_string()))
    }

    /// A page of public profiles.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn list_users(&self, query: ListQuery) -> Result<Vec<PublicUser>, AuthError> {
        Ok(self
            .users
            .list(query.skip, query.limit)?
            .iter()
            .map(User::to_public)
            .collect())
    }

    // Re-read so concurrent edits made after authentication are not lost.
    fn current_record(&self, auth: &Authenticated) -> Result<User, AuthError> {
        self.users
            .get(auth.user_id())?
            .ok_or_else(|| super::TokenRejection::UnknownSubject.into())
    }
}

#[cfg(test)]
pub(crate) fn test_state(dir: &tempfile::TempDir) -> AuthState {
    use super::config::AuthConfig;
    use super::users::UserStore;
    use eiei_core::SigningSecret;

    let config = AuthConfig::builder()
        .hashing(super::hasher::test_hasher().settings())
        .login_attempts_per_minute(50)
        .build();
    let users = UserStore::open(dir.path()).unwrap();
    users.seed_roles(&config.default_roles).unwrap();
    AuthState::new(config, &SigningSecret::generate(), users).unwrap()
}

#[cfg(test)]
pub(crate) fn vendor_registration() -> RegisterRequest {
    RegisterRequest {
        email: "a@x.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        password: "Secret123+".to_string(),
        phone_number: "+2348000000000".to_string(),
        role: "vendor".to_string(),
    }
}
