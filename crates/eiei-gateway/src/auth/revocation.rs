//! Durable registry of revoked access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AuthError;

const TREE_NAME: &str = "revoked_tokens";

/// One revoked token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEntry {
    /// When the token was revoked.
    pub revoked_at: DateTime<Utc>,
    /// The token's own expiry, if it was known at revocation time.
    ///
    /// Used only for pruning; entries without it are kept forever.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Set of revoked token strings, keyed by the exact token.
///
/// Inserts are append-only, so concurrent logouts never conflict.
#[derive(Clone)]
pub struct RevocationRegistry {
    tree: sled::Tree,
}

impl RevocationRegistry {
    /// Open the registry inside an existing database.
    ///
    /// # Errors
    ///
    /// Returns error if the tree cannot be opened.
    pub fn with_db(db: &sled::Db) -> Result<Self, AuthError> {
        let tree = db
            .open_tree(TREE_NAME)
            .map_err(|e| AuthError::Storage(format!("Failed to open revocation tree: {e}")))?;
        Ok(Self { tree })
    }

    /// Record `token` as revoked.
    ///
    /// Revoking an already revoked token succeeds and keeps the first entry.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn revoke(&self, token: &str, expires_at: Option<DateTime<Utc>>) -> Result<(), AuthError> {
        let entry = RevocationEntry {
            revoked_at: Utc::now(),
            expires_at,
        };
        let value = serde_json::to_vec(&entry)
            .map_err(|e| AuthError::Storage(format!("Serialization error: {e}")))?;

        let swapped = self
            .tree
            .compare_and_swap(token.as_bytes(), None as Option<&[u8]>, Some(value))
            .map_err(|e| AuthError::Storage(format!("Revocation insert error: {e}")))?;

        if swapped.is_err() {
            tracing::debug!("Token already revoked");
            return Ok(());
        }

        self.tree
            .flush()
            .map_err(|e| AuthError::Storage(format!("Flush error: {e}")))?;

        Ok(())
    }

    /// Exact-match lookup.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn is_revoked(&self, token: &str) -> Result<bool, AuthError> {
        self.tree
            .contains_key(token.as_bytes())
            .map_err(|e| AuthError::Storage(format!("Revocation lookup error: {e}")))
    }

    /// Get the entry for `token`, if revoked.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails or the entry is unreadable.
    pub fn entry(&self, token: &str) -> Result<Option<RevocationEntry>, AuthError> {
        match self.tree.get(token.as_bytes()) {
            Ok(Some(value)) => serde_json::from_slice(&value)
                .map(Some)
                .map_err(|e| AuthError::Storage(format!("Deserialization error: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(AuthError::Storage(format!("Get error: {e}"))),
        }
    }

    /// Remove entries whose token expired before `now`.
    ///
    /// Token expiry is checked in whole seconds and a token stays valid
    /// through its `exp` second, so an entry is only removed once `now` is
    /// in a later second. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Result<usize, AuthError> {
        let mut removed = 0;

        for result in self.tree.iter() {
            let (key, value) =
                result.map_err(|e| AuthError::Storage(format!("Iter error: {e}")))?;

            let Ok(entry) = serde_json::from_slice::<RevocationEntry>(&value) else {
                tracing::warn!("Skipping unreadable revocation entry");
                continue;
            };

            if entry
                .expires_at
                .is_some_and(|exp| exp.timestamp() < now.timestamp())
            {
                self.tree
                    .remove(&key)
                    .map_err(|e| AuthError::Storage(format!("Remove error: {e}")))?;
                removed += 1;
            }
        }

        if removed > 0 {
            self.tree
                .flush()
                .map_err(|e| AuthError::Storage(format!("Flush error: {e}")))?;
            tracing::info!(removed, "Pruned expired revocation entries");
        }

        Ok(removed)
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl std::fmt::Debug for RevocationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationRegistry")
            .field("entries", &self.tree.len())
            .finish()
    }
}
