//! Configuration loading and validation.
//!
//! Supports JSON5 so operators can keep comments in the file.
//! Config location: `~/.eiei/eiei.json`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON5 parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] json5::Error),

    /// Config validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthSettings,

    /// Durable storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Global settings.
    #[serde(default)]
    pub settings: GlobalSettings,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns error if config cannot be loaded or parsed.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a path.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        Self::state_dir().join("eiei.json")
    }

    /// Get the state directory.
    ///
    /// Uses `EIEI_STATE_DIR` env var if set, otherwise `~/.eiei`.
    #[must_use]
    pub fn state_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("EIEI_STATE_DIR") {
            PathBuf::from(dir)
        } else if let Some(home) = dirs::home_dir() {
            home.join(".eiei")
        } else {
            PathBuf::from(".eiei")
        }
    }

    /// Resolve the data directory for the durable store.
    ///
    /// Precedence: `EIEI_DATA_DIR`, then `storage.dataDir`, then the
    /// platform data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("EIEI_DATA_DIR") {
            return PathBuf::from(dir);
        }
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("eiei")
                .join("accounts")
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.port == 0 {
            return Err(ConfigError::Validation(
                "Gateway port cannot be 0".to_string(),
            ));
        }

        if self.auth.token_expiry_minutes == 0 {
            return Err(ConfigError::Validation(
                "Token expiry must be at least one minute".to_string(),
            ));
        }

        if self.auth.hashing.parallelism == 0 || self.auth.hashing.iterations == 0 {
            return Err(ConfigError::Validation(
                "Hashing iterations and parallelism must be non-zero".to_string(),
            ));
        }

        if self.auth.default_roles.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "Default roles cannot contain empty names".to_string(),
            ));
        }

        Ok(())
    }
}

/// Gateway server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address mode.
    #[serde(default)]
    pub mode: BindMode,

    /// Origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            mode: BindMode::default(),
            cors_origins: default_cors_origins(),
            timeout_secs: default_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Concrete address to bind to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        match &self.mode {
            BindMode::Local => "127.0.0.1".to_string(),
            BindMode::Public => "0.0.0.0".to_string(),
            BindMode::Custom(addr) => addr.clone(),
        }
    }
}

const fn default_port() -> u16 {
    7001
}

const fn default_timeout() -> u64 {
    30
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5000".to_string(),
        "http://localhost:8000".to_string(),
    ]
}

/// Gateway bind mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    /// Bind to localhost only.
    #[default]
    Local,
    /// Bind to all interfaces.
    Public,
    /// Custom bind address.
    Custom(String),
}

/// Authentication settings as stored in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    /// Hex-encoded token signing secret. Generated at startup if unset.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in minutes.
    #[serde(default = "default_token_expiry_minutes")]
    pub token_expiry_minutes: u64,

    /// Password hashing cost.
    #[serde(default)]
    pub hashing: HashingSettings,

    /// Roles seeded on startup.
    #[serde(default = "default_roles")]
    pub default_roles: Vec<String>,

    /// Login attempts allowed per email per minute.
    #[serde(default = "default_login_attempts")]
    pub login_attempts_per_minute: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiry_minutes: default_token_expiry_minutes(),
            hashing: HashingSettings::default(),
            default_roles: default_roles(),
            login_attempts_per_minute: default_login_attempts(),
        }
    }
}

const fn default_token_expiry_minutes() -> u64 {
    60
}

const fn default_login_attempts() -> u32 {
    10
}

fn default_roles() -> Vec<String> {
    vec!["vendor".to_string(), "organizer".to_string()]
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashingSettings {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

// Argon2id recommended minimums (19 MiB, 2 passes, 1 lane).
const fn default_memory_kib() -> u32 {
    19 * 1024
}

const fn default_iterations() -> u32 {
    2
}

const fn default_parallelism() -> u32 {
    1
}

/// Durable storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory holding the account database.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Global settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Enable debug logging.
    #[serde(default)]
    pub debug: bool,

    /// Log format.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway.port, 7001);
        assert_eq!(config.auth.token_expiry_minutes, 60);
        assert_eq!(config.auth.default_roles, vec!["vendor", "organizer"]);
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");

        let mut config = Config::default();
        config.auth.token_expiry_minutes = 15;
        config.auth.hashing.iterations = 3;
        config.gateway.cors_origins = vec!["https://eiei.market".to_string()];
        config.settings.log_format = LogFormat::Json;

        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.auth.token_expiry_minutes, 15);
        assert_eq!(loaded.auth.hashing, config.auth.hashing);
        assert_eq!(loaded.gateway.cors_origins, vec!["https://eiei.market"]);
        assert_eq!(loaded.settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_json5_parsing() {
        let json5_content = r#"{
            // listen on the marketplace port
            gateway: {
                port: 8080,
                mode: "public",
            },
            auth: {
                tokenExpiryMinutes: 30,
                hashing: { memoryKib: 4096 },
            },
        }"#;

        let config: Config = json5::from_str(json5_content).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.bind_address(), "0.0.0.0");
        assert_eq!(config.auth.token_expiry_minutes, 30);
        assert_eq!(config.auth.hashing.memory_kib, 4096);
        assert_eq!(config.auth.hashing.iterations, 2);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.gateway.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.token_expiry_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.default_roles.push("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_bind_address() {
        let config = GatewayConfig {
            mode: BindMode::Custom("10.0.0.5".to_string()),
            ..Default::default()
        };
        assert_eq!(config.bind_address(), "10.0.0.5");
    }

    #[test]
    fn test_explicit_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("/srv/eiei"));
        if std::env::var("EIEI_DATA_DIR").is_err() {
            assert_eq!(config.data_dir(), PathBuf::from("/srv/eiei"));
        }
    }
}
