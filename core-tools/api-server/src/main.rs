// pitchd
// Main entry point for the pitch practice backend

use api_server::cli::{Cli, Command};
use api_server::commands::{handle_doctor, handle_judges, OutputFormat};
use clap::Parser;
use pitch_engine::config::Config;
use pitch_engine::persona::PersonaCatalog;
use pitch_engine::secrets::Credentials;
use pitch_engine::telemetry::init_telemetry_with_level;
use pitch_engine::Services;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Credentials may come from a local env file; real environment wins
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    // Load configuration (or use custom path if provided)
    let mut config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_default()?
    };

    // Only takes effect if RUST_LOG env var is not set
    let log_level = cli
        .log
        .clone()
        .unwrap_or_else(|| config.server.log_level.clone());
    init_telemetry_with_level(&log_level);

    tracing::info!("pitchd v{}", env!("CARGO_PKG_VERSION"));

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let credentials = Arc::new(Credentials::from_env());

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
                config.validate()?;
            }
            let services = Services::from_config(&config, credentials);
            api_server::serve(&config, services).await?;
            Ok(())
        }

        Command::Judges => handle_judges(&PersonaCatalog::builtin(), format),

        Command::Doctor => handle_doctor(&config, &credentials, format),
    }
}
