//! User directory and role lookup, backed by sled.

use std::path::Path;

use chrono::{DateTime, Utc};
use eiei_core::UserId;
use serde::{Deserialize, Serialize};

use super::AuthError;

/// A named role (e.g. "vendor", "organizer").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role name.
    pub name: String,
    /// When the role was seeded.
    pub created_at: DateTime<Utc>,
}

/// User account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier, immutable once assigned.
    pub id: UserId,
    /// Normalised email; unique across users.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Argon2 PHC hash (never exposed in the public API).
    pub password_hash: String,
    /// Per-user salt, rotated on every password change.
    pub salt: String,
    /// Role name.
    pub role: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// Last profile or password change.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public projection for API responses (no hash, no salt).
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            role: self.role.clone(),
        }
    }
}

/// Public user representation (for API responses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    /// User ID.
    pub id: UserId,
    /// Email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Phone number.
    pub phone_number: String,
    /// Role name.
    pub role: String,
}

/// User and role store backed by sled.
///
/// Trees: `users` (id -> user), `users_email_idx` (email -> id) and
/// `roles` (name -> role).
#[derive(Clone)]
pub struct UserStore {
    db: sled::Db,
    users: sled::Tree,
    email_idx: sled::Tree,
    roles: sled::Tree,
}

impl UserStore {
    /// Open or create a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, AuthError> {
        let db = sled::open(path.join("accounts"))
            .map_err(|e| AuthError::Storage(format!("Failed to open account database: {e}")))?;
        Self::with_db(db)
    }

    /// Create a store on an existing sled database.
    ///
    /// # Errors
    ///
    /// Returns error if a tree cannot be opened.
    pub fn with_db(db: sled::Db) -> Result<Self, AuthError> {
        let open = |name: &str| {
            db.open_tree(name)
                .map_err(|e| AuthError::Storage(format!("Failed to open {name} tree: {e}")))
        };
        let users = open("users")?;
        let email_idx = open("users_email_idx")?;
        let roles = open("roles")?;

        Ok(Self {
            db,
            users,
            email_idx,
            roles,
        })
    }

    /// Get the underlying sled database.
    #[must_use]
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Check if any users exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Count total users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.users.len()
    }

    /// Insert a new user.
    ///
    /// The email is claimed with an atomic compare-and-swap on the email
    /// index, so two concurrent registrations cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DuplicateEmail` if the email is taken, or a
    /// storage error.
    pub fn create(&self, user: &User) -> Result<(), AuthError> {
        let claimed = self
            .email_idx
            .compare_and_swap(
                user.email.as_bytes(),
                None as Option<&[u8]>,
                Some(user.id.as_str().as_bytes()),
            )
            .map_err(|e| AuthError::Storage(format!("Index error: {e}")))?;

        if claimed.is_err() {
            return Err(AuthError::DuplicateEmail(user.email.clone()));
        }

        if let Err(e) = self.write_user(user) {
            // Release the email so a retry can succeed.
            let _ = self.email_idx.remove(user.email.as_bytes());
            return Err(e);
        }

        self.flush()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn get(&self, id: &str) -> Result<Option<User>, AuthError> {
        match self.users.get(id.as_bytes()) {
            Ok(Some(value)) => {
                let user: User = serde_json::from_slice(&value)
                    .map_err(|e| AuthError::Storage(format!("Deserialization error: {e}")))?;
                Ok(Some(user))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(AuthError::Storage(format!("Get error: {e}"))),
        }
    }

    /// Get a user by normalised email.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        match self.email_idx.get(email.as_bytes()) {
            Ok(Some(id_bytes)) => {
                let id = String::from_utf8_lossy(&id_bytes);
                self.get(&id)
            }
            Ok(None) => Ok(None),
            Err(e) => Err(AuthError::Storage(format!("Index lookup error: {e}"))),
        }
    }

    /// Replace an existing user record.
    ///
    /// An email change is checked against the index and then written;
    /// this is not atomic with respect to a concurrent edit claiming the
    /// same address.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user doesn't exist, `DuplicateEmail`
    /// if the new email belongs to someone else, or a storage error.
    pub fn update(&self, user: &User) -> Result<(), AuthError> {
        let existing = self
            .get(user.id.as_str())?
            .ok_or_else(|| AuthError::UserNotFound(user.id.to_string()))?;

        if existing.email != user.email {
            if let Some(owner) = self.get_by_email(&user.email)? {
                if owner.id != user.id {
                    return Err(AuthError::DuplicateEmail(user.email.clone()));
                }
            }

            self.email_idx
                .insert(user.email.as_bytes(), user.id.as_str().as_bytes())
                .map_err(|e| AuthError::Storage(format!("Index error: {e}")))?;
            self.email_idx
                .remove(existing.email.as_bytes())
                .map_err(|e| AuthError::Storage(format!("Index remove error: {e}")))?;
        }

        self.write_user(user)?;
        self.flush()
    }

    /// List users in key order, skipping `skip` and returning at most
    /// `limit`.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn list(&self, skip: usize, limit: usize) -> Result<Vec<User>, AuthError> {
        self.users
            .iter()
            .skip(skip)
            .take(limit)
            .map(|result| {
                let (_, value) =
                    result.map_err(|e| AuthError::Storage(format!("Iter error: {e}")))?;
                serde_json::from_slice(&value)
                    .map_err(|e| AuthError::Storage(format!("Deserialization error: {e}")))
            })
            .collect()
    }

    /// Insert any of `names` not already present. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn seed_roles<S: AsRef<str>>(&self, names: &[S]) -> Result<usize, AuthError> {
        let mut added = 0;

        for name in names {
            let role = Role {
                name: name.as_ref().to_string(),
                created_at: Utc::now(),
            };
            let value = serde_json::to_vec(&role)
                .map_err(|e| AuthError::Storage(format!("Serialization error: {e}")))?;

            let inserted = self
                .roles
                .compare_and_swap(role.name.as_bytes(), None as Option<&[u8]>, Some(value))
                .map_err(|e| AuthError::Storage(format!("Role insert error: {e}")))?;

            if inserted.is_ok() {
                tracing::info!(role = %role.name, "Seeded role");
                added += 1;
            }
        }

        if added > 0 {
            self.roles
                .flush()
                .map_err(|e| AuthError::Storage(format!("Flush error: {e}")))?;
        }

        Ok(added)
    }

    /// Look up a role by exact name.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn find_role(&self, name: &str) -> Result<Option<Role>, AuthError> {
        match self.roles.get(name.as_bytes()) {
            Ok(Some(value)) => serde_json::from_slice(&value)
                .map(Some)
                .map_err(|e| AuthError::Storage(format!("Deserialization error: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(AuthError::Storage(format!("Role lookup error: {e}"))),
        }
    }

    /// All roles, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn list_roles(&self) -> Result<Vec<Role>, AuthError> {
        self.roles
            .iter()
            .map(|result| {
                let (_, value) =
                    result.map_err(|e| AuthError::Storage(format!("Iter error: {e}")))?;
                serde_json::from_slice(&value)
                    .map_err(|e| AuthError::Storage(format!("Deserialization error: {e}")))
            })
            .collect()
    }

    fn write_user(&self, user: &User) -> Result<(), AuthError> {
        let value = serde_json::to_vec(user)
            .map_err(|e| AuthError::Storage(format!("Serialization error: {e}")))?;

        self.users
            .insert(user.id.as_str().as_bytes(), value)
            .map_err(|e| AuthError::Storage(format!("Insert error: {e}")))?;

        Ok(())
    }

    fn flush(&self) -> Result<(), AuthError> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|e| AuthError::Storage(format!("Flush error: {e}")))
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("users", &self.users.len())
            .field("roles", &self.roles.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn sample_user(email: &str, role: &str) -> User {
    let now = Utc::now();
    User {
        id: UserId::generate(),
        email: email.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        phone_number: "+2348000000000".to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        salt: "c2FsdHNhbHRzYWx0".to_string(),
        role: role.to_string(),
        created_at: now,
        updated_at: now,
    }
}
