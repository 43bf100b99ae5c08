//! Salted password hashing with Argon2id.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use eiei_core::config::HashingSettings;
use rand::rngs::OsRng;

use super::AuthError;

/// Hashes and verifies passwords against a per-user salt.
///
/// The salt is stored next to the hash on the user record. Hashing the
/// same plaintext with the same salt and cost is deterministic.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    settings: HashingSettings,
}

impl CredentialHasher {
    /// Create a hasher with the given cost parameters.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the parameters are out of range.
    pub fn new(settings: HashingSettings) -> Result<Self, AuthError> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| AuthError::Config(format!("Invalid hashing parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            settings,
        })
    }

    /// Generate a fresh random salt (B64, 16 bytes of entropy).
    #[must_use]
    pub fn generate_salt() -> String {
        SaltString::generate(&mut OsRng).as_str().to_string()
    }

    /// Hash `plaintext` with `salt`, returning a PHC string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CorruptCredential` if the salt is not valid B64.
    pub fn hash(&self, plaintext: &str, salt: &str) -> Result<String, AuthError> {
        let salt = SaltString::from_b64(salt)
            .map_err(|e| AuthError::CorruptCredential(format!("Invalid salt: {e}")))?;

        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::CorruptCredential(format!("Password hashing failed: {e}")))
    }

    /// Check `plaintext` against a stored hash and salt.
    ///
    /// Comparison is constant-time. A mismatch is `Ok(false)`; a hash that
    /// cannot be parsed, or whose embedded salt differs from the stored
    /// one, is a corrupt record and an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CorruptCredential` for unparseable records.
    pub fn verify(&self, plaintext: &str, salt: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AuthError::CorruptCredential(format!("Invalid hash: {e}")))?;

        if parsed.salt.map(|s| s.as_str()) != Some(salt) {
            return Err(AuthError::CorruptCredential(
                "Stored salt does not match hash".to_string(),
            ));
        }

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::CorruptCredential(format!(
                "Verification failed: {e}"
            ))),
        }
    }

    /// Cost parameters in use.
    #[must_use]
    pub const fn settings(&self) -> HashingSettings {
        self.settings
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(HashingSettings {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salts_are_fresh() {
        let s1 = CredentialHasher::generate_salt();
        let s2 = CredentialHasher::generate_salt();
        assert_ne!(s1, s2);
        assert!(!s1.is_empty());
    }

    #[test]
    fn test_hash_is_deterministic_per_salt() {
        let hasher = test_hasher();
        let salt = CredentialHasher::generate_salt();

        let h1 = hasher.hash("Secret123+", &salt).unwrap();
        let h2 = hasher.hash("Secret123+", &salt).unwrap();
        assert_eq!(h1, h2);
        assert!(h1.starts_with("$argon2id$"));
    }

    #[test]
    fn test_distinct_salts_diversify_hashes() {
        let hasher = test_hasher();
        let s1 = CredentialHasher::generate_salt();
        let s2 = CredentialHasher::generate_salt();

        let h1 = hasher.hash("Secret123+", &s1).unwrap();
        let h2 = hasher.hash("Secret123+", &s2).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_verify() {
        let hasher = test_hasher();
        let salt = CredentialHasher::generate_salt();
        let hash = hasher.hash("Secret123+", &salt).unwrap();

        assert!(hasher.verify("Secret123+", &salt, &hash).unwrap());
        assert!(!hasher.verify("Secret123-", &salt, &hash).unwrap());
        assert!(!hasher.verify("", &salt, &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let hasher = test_hasher();
        let salt = CredentialHasher::generate_salt();

        let result = hasher.verify("Secret123+", &salt, "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::CorruptCredential(_))));
    }

    #[test]
    fn test_salt_mismatch_is_error() {
        let hasher = test_hasher();
        let salt = CredentialHasher::generate_salt();
        let other = CredentialHasher::generate_salt();
        let hash = hasher.hash("Secret123+", &salt).unwrap();

        let result = hasher.verify("Secret123+", &other, &hash);
        assert!(matches!(result, Err(AuthError::CorruptCredential(_))));
    }

    #[test]
    fn test_invalid_parameters() {
        let result = CredentialHasher::new(HashingSettings {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        });
        assert!(matches!(result, Err(AuthError::Config(_))));
    }
}
