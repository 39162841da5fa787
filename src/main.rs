//! AuthGate Server: user registration and login with signed session tokens.
//!
//! Main entry point that loads configuration, initializes logging, and runs
//! the HTTP server.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use authgate_core::config::AppConfig;
use authgate_core::error::AppError;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "authgate-server", version, about = "AuthGate authentication server")]
struct Cli {
    /// Directory holding `default.toml` and per-environment overlays.
    #[arg(long, env = "AUTHGATE_CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment overlay to load on top of the defaults.
    #[arg(long, env = "AUTHGATE_ENV", default_value = "development")]
    env: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config_dir, &cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(
        config_dir = %cli.config_dir,
        env = %cli.env,
        "Starting AuthGate v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. `RUST_LOG` takes precedence over the config.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    let state = authgate_api::build_state(config).await?;
    authgate_api::run_server(state).await
}
