//! Offline administration: roles, users and the revocation registry.
//!
//! These open the store directly, so the server must not be running.

use anyhow::Context;
use chrono::Utc;
use eiei_core::{Config, SigningSecret};
use eiei_gateway::auth::{
    AuthConfig, AuthState, PublicUser, RegisterRequest, RevocationRegistry, UserStore,
};

use crate::ui;

/// Admin actions.
pub enum AdminAction {
    /// Seed default roles plus any extra names.
    SeedRoles {
        /// Extra role names.
        names: Vec<String>,
    },
    /// List roles.
    ListRoles,
    /// Create a user through the normal registration path.
    CreateUser(RegisterRequest),
    /// List users.
    ListUsers {
        /// Entries to skip.
        skip: usize,
        /// Maximum entries.
        limit: usize,
    },
    /// Show a user by ID or email.
    ShowUser {
        /// ID or email.
        user: String,
    },
    /// Prune revocation entries for expired tokens.
    PruneTokens,
}

/// Run an admin action against the configured store.
///
/// # Errors
///
/// Returns error if the store cannot be opened or the operation fails.
pub fn run_admin(config: &Config, action: AdminAction) -> anyhow::Result<()> {
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let store = UserStore::open(&data_dir).with_context(|| {
        format!(
            "Failed to open store at {} (is the server running?)",
            data_dir.display()
        )
    })?;

    match action {
        AdminAction::SeedRoles { names } => {
            let mut all = config.auth.default_roles.clone();
            all.extend(names);
            let added = store.seed_roles(&all)?;
            ui::success(&format!("Seeded {added} new role(s)"));
        }
        AdminAction::ListRoles => {
            ui::role_list(&store.list_roles()?);
        }
        AdminAction::CreateUser(request) => {
            store.seed_roles(&config.auth.default_roles)?;
            // Registration never issues a token, so any key will do.
            let state = AuthState::new(
                AuthConfig::from(&config.auth),
                &SigningSecret::generate(),
                store,
            )?;
            let user = state.register(&request)?;
            ui::success(&format!("Created user {} ({})", user.email, user.role));
            ui::kv("ID", user.id.as_str());
        }
        AdminAction::ListUsers { skip, limit } => {
            let users: Vec<PublicUser> = store
                .list(skip, limit)?
                .iter()
                .map(eiei_gateway::User::to_public)
                .collect();
            ui::user_table(&users, skip);
        }
        AdminAction::ShowUser { user } => {
            let found = match store.get(&user)? {
                Some(found) => Some(found),
                None => store.get_by_email(&user.trim().to_lowercase())?,
            };
            let Some(found) = found else {
                anyhow::bail!("No user matches '{user}'");
            };
            ui::user_details(&found);
        }
        AdminAction::PruneTokens => {
            let registry = RevocationRegistry::with_db(store.db())?;
            let before = registry.len();
            let removed = registry.prune_expired(Utc::now())?;
            ui::success(&format!("Pruned {removed} of {before} revocation entries"));
        }
    }

    Ok(())
}
