//! Gateway server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;

use crate::GatewayError;
use crate::auth::{AuthConfig, AuthState};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port to listen on.
    pub port: u16,
    /// Bind address.
    pub bind_address: String,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Data directory for persistent storage.
    pub data_dir: PathBuf,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from_core(&eiei_core::Config::default())
    }
}

impl GatewayConfig {
    /// Derive the gateway configuration from the loaded config file.
    #[must_use]
    pub fn from_core(config: &eiei_core::Config) -> Self {
        Self {
            port: config.gateway.port,
            bind_address: config.gateway.bind_address(),
            cors_origins: config.gateway.cors_origins.clone(),
            timeout: Duration::from_secs(config.gateway.timeout_secs),
            data_dir: config.data_dir(),
            auth: AuthConfig::from(&config.auth),
        }
    }
}

/// Gateway server state shared across handlers.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Authentication state.
    pub auth: Arc<AuthState>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl FromRef<GatewayState> for Arc<AuthState> {
    fn from_ref(state: &GatewayState) -> Self {
        Arc::clone(&state.auth)
    }
}

/// Gateway server.
pub struct Gateway {
    config: GatewayConfig,
    state: GatewayState,
}

/// Builder for constructing a Gateway with its dependencies.
#[derive(Default)]
pub struct GatewayBuilder {
    config: GatewayConfig,
    auth_state: Option<Arc<AuthState>>,
}

impl GatewayBuilder {
    /// Create a new builder with default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set gateway configuration.
    #[must_use]
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an already initialised auth state.
    #[must_use]
    pub fn with_auth_state(mut self, auth: Arc<AuthState>) -> Self {
        self.auth_state = Some(auth);
        self
    }

    /// Build the gateway.
    ///
    /// # Errors
    ///
    /// Returns error if the data directory or auth initialization fails.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let auth = match self.auth_state {
            Some(auth) => auth,
            None => {
                std::fs::create_dir_all(&self.config.data_dir)
                    .map_err(|e| GatewayError::Config(format!("Failed to create data dir: {e}")))?;

                let auth_config = self.config.auth.clone().with_env_overrides();
                Arc::new(AuthState::initialize(auth_config, &self.config.data_dir)?)
            }
        };

        let state = GatewayState {
            auth,
            config: self.config.clone(),
        };

        Ok(Gateway {
            config: self.config,
            state,
        })
    }
}

impl Gateway {
    /// Create a gateway, initialising auth from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if initialization fails.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        GatewayBuilder::new().with_config(config).build()
    }

    /// Shared state handed to handlers.
    #[must_use]
    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Run the server until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error if the address is invalid or the listener fails.
    pub async fn run(&self) -> Result<(), GatewayError> {
        let app = crate::routes::router(self.state.clone());

        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| GatewayError::Config(format!("Invalid address: {e}")))?;

        let limiter_state = Arc::clone(&self.state.auth);
        let housekeeping = tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            loop {
                tick.tick().await;
                limiter_state.login_limiter.retain_recent();
            }
        });

        tracing::info!(
            users = self.state.auth.users.count(),
            "Account service listening on http://{}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
            .with_graceful_shutdown(shutdown_signal())
            .await;

        housekeeping.abort();
        result.map_err(|e| GatewayError::Server(format!("Server error: {e}")))?;

        tracing::info!("Account service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
