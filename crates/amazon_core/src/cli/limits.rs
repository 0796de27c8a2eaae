//! Rate limit listing.

use super::OutputFormat;
use amazon_core::{AmazonConfig, AmazonError, Provider, ProviderSettings};
use std::collections::BTreeMap;
use std::path::Path;
use strum::IntoEnumIterator;

fn print_settings(provider: Provider, settings: &ProviderSettings) {
    println!("{}", provider);
    println!(
        "  default: {} req/s, burst {}",
        settings.rate_limit().requests_per_second,
        settings.rate_limit().burst_limit
    );
    let endpoints: BTreeMap<_, _> = settings.endpoints().iter().collect();
    for (pattern, limit) in endpoints {
        println!(
            "  {}: {} req/s, burst {}",
            pattern, limit.requests_per_second, limit.burst_limit
        );
    }
    println!(
        "  retry: {} retries, base {:?}, max {:?}, x{}",
        settings.retry().max_retries,
        settings.retry().base_delay,
        settings.retry().max_delay,
        settings.retry().backoff_multiplier
    );
}

/// Print the rate limits for one or every provider.
///
/// # Errors
///
/// Returns a configuration error if a configuration file is malformed.
pub fn show_limits(
    provider: Option<Provider>,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<(), AmazonError> {
    let config = match config_path {
        Some(path) => AmazonConfig::from_file(path)?,
        None => AmazonConfig::load()?,
    };
    let selected: BTreeMap<Provider, ProviderSettings> = Provider::iter()
        .filter(|p| provider.is_none_or(|wanted| wanted == *p))
        .map(|p| (p, config.provider(p)))
        .collect();

    match format {
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&selected)
                .map_err(|e| AmazonError::config(format!("Failed to render limits: {}", e)))?;
            println!("{}", rendered);
        }
        OutputFormat::Human => {
            for (provider, settings) in &selected {
                print_settings(*provider, settings);
            }
        }
    }
    Ok(())
}
