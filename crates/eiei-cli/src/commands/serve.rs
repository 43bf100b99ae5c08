//! Serve command - run the account service.

use anyhow::Result;
use eiei_core::Config;
use eiei_gateway::GatewayConfig;

use crate::ui;

/// Serve command arguments.
#[derive(Debug, Clone, Default)]
pub struct ServeArgs {
    /// Port override.
    pub port: Option<u16>,
    /// Bind address override.
    pub bind: Option<String>,
}

/// Start the HTTP server and block until shutdown.
pub async fn run_serve(config: Config, args: ServeArgs) -> Result<()> {
    let mut gateway_config = GatewayConfig::from_core(&config);
    if let Some(port) = args.port {
        gateway_config.port = port;
    }
    if let Some(bind) = args.bind {
        gateway_config.bind_address = bind;
    }

    ui::header("Starting Eiei account service");
    ui::kv(
        "Address",
        &format!("{}:{}", gateway_config.bind_address, gateway_config.port),
    );
    ui::kv("Data", &gateway_config.data_dir.display().to_string());
    ui::kv(
        "Token lifetime",
        &format!("{} min", gateway_config.auth.token_expiry.num_minutes()),
    );
    if gateway_config.auth.jwt_secret.is_none()
        && std::env::var("EIEI_JWT_SECRET").map_or(true, |s| s.trim().is_empty())
    {
        ui::warning("No JWT secret configured; issued tokens will not survive a restart");
    }
    println!();
    ui::info("Press Ctrl+C to stop");
    println!();

    eiei_gateway::start(gateway_config).await?;

    Ok(())
}
