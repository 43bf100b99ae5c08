//! Secret handling for the token signing key.
//!
//! `SigningSecret` keeps the key out of logs and debug output and zeroes
//! it on drop.

use rand::RngCore;
use secrecy::{ExposeSecret, SecretBox};
use thiserror::Error;

/// Minimum accepted signing key length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Errors from secret parsing.
#[derive(Error, Debug)]
pub enum SecretError {
    /// Secret is not valid hex.
    #[error("Invalid hex secret: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Secret is too short to be safe.
    #[error("Secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
    TooShort(usize),
}

/// Symmetric key used to sign and verify access tokens.
pub struct SigningSecret(SecretBox<[u8]>);

impl SigningSecret {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::TooShort` for keys under 32 bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self, SecretError> {
        if bytes.len() < MIN_SECRET_LEN {
            return Err(SecretError::TooShort(bytes.len()));
        }
        Ok(Self(SecretBox::new(bytes.into_boxed_slice())))
    }

    /// Generate a random 256-bit key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(SecretBox::new(bytes.into_boxed_slice()))
    }

    /// Parse a hex-encoded key.
    ///
    /// # Errors
    ///
    /// Returns error if decoding fails or the key is too short.
    pub fn from_hex(hex_secret: &str) -> Result<Self, SecretError> {
        let bytes = hex::decode(hex_secret.trim())?;
        Self::new(bytes)
    }

    /// Hex-encode the key, e.g. to persist a generated secret.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.expose())
    }

    /// Expose the key bytes to the signer.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningSecret([REDACTED])")
    }
}

impl std::fmt::Display for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random() {
        let a = SigningSecret::generate();
        let b = SigningSecret::generate();
        assert_ne!(a.expose(), b.expose());
        assert_eq!(a.expose().len(), 32);
    }

    #[test]
    fn test_hex_roundtrip() {
        let secret = SigningSecret::generate();
        let hex_secret = secret.to_hex();
        assert_eq!(hex_secret.len(), 64);

        let parsed = SigningSecret::from_hex(&hex_secret).unwrap();
        assert_eq!(parsed.expose(), secret.expose());
    }

    #[test]
    fn test_rejects_short_and_invalid() {
        assert!(matches!(
            SigningSecret::from_hex("abcd"),
            Err(SecretError::TooShort(2))
        ));
        assert!(matches!(
            SigningSecret::from_hex("not-hex"),
            Err(SecretError::Hex(_))
        ));
    }

    #[test]
    fn test_redacted_output() {
        let secret = SigningSecret::generate();
        assert_eq!(format!("{secret:?}"), "SigningSecret([REDACTED])");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }
}
