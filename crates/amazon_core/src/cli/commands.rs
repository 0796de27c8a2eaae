//! CLI command definitions.

use amazon_core::Provider;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// amazon-core - Rate-limited Amazon API clients
#[derive(Parser, Debug)]
#[command(name = "amazon-core")]
#[command(about = "Validate identifiers, inspect rate limits and probe Amazon API health", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check an identifier without calling any API
    Validate {
        /// What the value is
        kind: ValueKind,

        /// Value to check
        value: String,
    },

    /// Print configured rate limits
    Limits {
        /// Only this provider (sp-api, associates, advertising)
        #[arg(long)]
        provider: Option<Provider>,

        /// Read this file instead of the layered defaults
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Probe every provider with credentials from the environment
    Health {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

/// Identifier kinds `validate` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueKind {
    /// 10-character ASIN
    Asin,
    /// Marketplace id, e.g. ATVPDKIKX0DER
    Marketplace,
    /// ISO-4217 currency code
    Currency,
    /// Seller SKU
    Sku,
    /// Order id (3-7-7 digits)
    OrderId,
    /// Associates partner tag
    PartnerTag,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
