//! Runtime authentication configuration.

use chrono::Duration;
use eiei_core::config::{AuthSettings, HashingSettings};

/// Ceiling for configured lifetimes that do not fit a `Duration`.
const MAX_TOKEN_EXPIRY_DAYS: i64 = 36_500;

/// Authentication configuration resolved for the running service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Hex-encoded signing secret. Generated at startup if not set.
    pub jwt_secret: Option<String>,

    /// Default access token lifetime.
    pub token_expiry: Duration,

    /// Password hashing cost.
    pub hashing: HashingSettings,

    /// Roles seeded at startup.
    pub default_roles: Vec<String>,

    /// Login attempts allowed per email per minute.
    pub login_attempts_per_minute: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::from(&AuthSettings::default())
    }
}

impl From<&AuthSettings> for AuthConfig {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone(),
            token_expiry: i64::try_from(settings.token_expiry_minutes)
                .ok()
                .and_then(Duration::try_minutes)
                .unwrap_or_else(|| Duration::days(MAX_TOKEN_EXPIRY_DAYS)),
            hashing: settings.hashing,
            default_roles: settings.default_roles.clone(),
            login_attempts_per_minute: settings.login_attempts_per_minute,
        }
    }
}

impl AuthConfig {
    /// Create a new auth config builder.
    #[must_use]
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Apply environment overrides (`EIEI_JWT_SECRET`).
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var("EIEI_JWT_SECRET") {
            if !secret.trim().is_empty() {
                self.jwt_secret = Some(secret);
            }
        }
        self
    }
}

/// Builder for `AuthConfig`.
#[derive(Debug, Default)]
pub struct AuthConfigBuilder {
    config: AuthConfig,
}

impl AuthConfigBuilder {
    /// Set the signing secret (hex).
    #[must_use]
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = Some(secret.into());
        self
    }

    /// Set the default token lifetime.
    #[must_use]
    pub fn token_expiry(mut self, expiry: Duration) -> Self {
        self.config.token_expiry = expiry;
        self
    }

    /// Set the hashing cost.
    #[must_use]
    pub fn hashing(mut self, hashing: HashingSettings) -> Self {
        self.config.hashing = hashing;
        self
    }

    /// Replace the roles seeded at startup.
    #[must_use]
    pub fn default_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.default_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-email login attempt quota.
    #[must_use]
    pub fn login_attempts_per_minute(mut self, attempts: u32) -> Self {
        self.config.login_attempts_per_minute = attempts;
        self
    }

    /// Build the config.
    #[must_use]
    pub fn build(self) -> AuthConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.token_expiry, Duration::minutes(60));
        assert_eq!(config.default_roles, vec!["vendor", "organizer"]);
        assert_eq!(config.login_attempts_per_minute, 10);
    }

    #[test]
    fn test_from_settings() {
        let settings = AuthSettings {
            token_expiry_minutes: 15,
            ..AuthSettings::default()
        };
        let config = AuthConfig::from(&settings);
        assert_eq!(config.token_expiry, Duration::minutes(15));
    }

    #[test]
    fn test_builder() {
        let config = AuthConfig::builder()
            .token_expiry(Duration::minutes(5))
            .default_roles(["admin"])
            .login_attempts_per_minute(3)
            .build();

        assert_eq!(config.token_expiry, Duration::minutes(5));
        assert_eq!(config.default_roles, vec!["admin"]);
        assert_eq!(config.login_attempts_per_minute, 3);
    }
}
