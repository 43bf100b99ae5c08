//! Eiei CLI - run and administer the account service.

mod commands;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eiei_core::config::LogFormat;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "eiei")]
#[command(about = "Eiei - marketplace account and authentication service")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.eiei/eiei.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, global = true, env = "EIEI_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Check whether a server is running
    Status,

    /// Role management
    Roles {
        #[command(subcommand)]
        action: RolesCommands,
    },

    /// User management
    Users {
        #[command(subcommand)]
        action: UsersCommands,
    },

    /// Revocation registry maintenance
    Tokens {
        #[command(subcommand)]
        action: TokensCommands,
    },
}

#[derive(Subcommand)]
enum RolesCommands {
    /// Insert the configured default roles (idempotent)
    Seed {
        /// Extra role names to seed
        names: Vec<String>,
    },

    /// List roles
    List,
}

#[derive(Subcommand)]
enum UsersCommands {
    /// Create a user
    Create {
        /// Email address
        #[arg(long)]
        email: String,

        /// Given name
        #[arg(long)]
        first_name: String,

        /// Family name
        #[arg(long)]
        last_name: String,

        /// Phone number
        #[arg(long)]
        phone: String,

        /// Role name
        #[arg(long, default_value = "vendor")]
        role: String,

        /// Password
        #[arg(long, env = "EIEI_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List users
    List {
        /// Entries to skip
        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Maximum entries
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// Show one user by ID or email
    Show {
        /// User ID or email
        user: String,
    },
}

#[derive(Subcommand)]
enum TokensCommands {
    /// Remove revocation entries for tokens that have expired anyway
    Prune,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        ui::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = commands::load_config(cli.config.as_deref(), cli.data_dir)?;

    // Setup logging
    let filter = if cli.verbose || config.settings.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    match config.settings.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }

    match cli.command {
        Commands::Serve { port, bind } => {
            commands::run_serve(config, commands::serve::ServeArgs { port, bind }).await?;
        }

        Commands::Status => {
            commands::run_status(&config).await?;
        }

        Commands::Roles { action } => {
            let action = match action {
                RolesCommands::Seed { names } => commands::admin::AdminAction::SeedRoles { names },
                RolesCommands::List => commands::admin::AdminAction::ListRoles,
            };
            commands::run_admin(&config, action)?;
        }

        Commands::Users { action } => {
            let action = match action {
                UsersCommands::Create {
                    email,
                    first_name,
                    last_name,
                    phone,
                    role,
                    password,
                } => commands::admin::AdminAction::CreateUser(eiei_gateway::auth::RegisterRequest {
                    email,
                    first_name,
                    last_name,
                    password,
                    phone_number: phone,
                    role,
                }),
                UsersCommands::List { skip, limit } => {
                    commands::admin::AdminAction::ListUsers { skip, limit }
                }
                UsersCommands::Show { user } => commands::admin::AdminAction::ShowUser { user },
            };
            commands::run_admin(&config, action)?;
        }

        Commands::Tokens {
            action: TokensCommands::Prune,
        } => {
            commands::run_admin(&config, commands::admin::AdminAction::PruneTokens)?;
        }
    }

    Ok(())
}
