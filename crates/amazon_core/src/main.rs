//! amazon-core CLI binary.
//!
//! - Validate identifiers offline
//! - Print the configured rate limits
//! - Probe provider health with credentials from the environment

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands, check_health, show_limits, validate_value};

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    amazon_core::init_observability_with_config(
        amazon_core::ObservabilityConfig::default()
            .with_log_level(log_level)
            .with_json_logs(cli.json_logs),
    )?;

    match cli.command {
        Commands::Validate { kind, value } => {
            validate_value(kind, &value)?;
        }

        Commands::Limits { provider, config, format } => {
            show_limits(provider, config.as_deref(), format)?;
        }

        Commands::Health { format } => {
            check_health(format).await?;
        }
    }

    Ok(())
}
