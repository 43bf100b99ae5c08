//! Status command - probe a running server and show configuration.

use std::time::Duration;

use anyhow::Result;
use eiei_core::Config;

use crate::ui::{self, HealthStatus};

/// Run the status command.
pub async fn run_status(config: &Config) -> Result<()> {
    ui::header("Eiei Status");

    let host = match config.gateway.bind_address().as_str() {
        "0.0.0.0" => "127.0.0.1".to_string(),
        other => other.to_string(),
    };
    let port = config.gateway.port;

    println!();
    ui::info("Server");
    match probe_health(&host, port).await {
        Ok(version) => {
            ui::health_check("Status", HealthStatus::Ok, Some("running"));
            ui::kv("  Address", &format!("{host}:{port}"));
            ui::kv("  Version", &version);
        }
        Err(e) => {
            ui::health_check("Status", HealthStatus::Warning, Some("not running"));
            tracing::debug!("Health probe failed: {}", e);
            ui::info("  Start with: eiei serve");
        }
    }

    println!();
    ui::info("Configuration");
    let path = Config::default_path();
    if path.exists() {
        ui::health_check("Config", HealthStatus::Ok, Some(&path.display().to_string()));
    } else {
        ui::health_check("Config", HealthStatus::Unknown, Some("using defaults"));
    }
    ui::kv("  Data", &config.data_dir().display().to_string());

    let secret_status = if config.auth.jwt_secret.is_some()
        || std::env::var("EIEI_JWT_SECRET").is_ok_and(|s| !s.trim().is_empty())
    {
        (HealthStatus::Ok, "configured")
    } else {
        (HealthStatus::Warning, "ephemeral (tokens reset on restart)")
    };
    ui::health_check("JWT secret", secret_status.0, Some(secret_status.1));

    Ok(())
}

/// Fetch the version from the health endpoint.
async fn probe_health(host: &str, port: u16) -> Result<String, String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .map_err(|e| e.to_string())?;

    let resp = client
        .get(format!("http://{host}:{port}/health"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.status().is_success() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let body: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
    Ok(body
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string())
}
