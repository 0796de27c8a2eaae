//! Provider health probes with credentials from the environment.

use super::OutputFormat;
use amazon_core::{
    AmazonConfig, AmazonContext, AmazonError, AmazonResult, AssociatesConfig, AssociatesMarketplace,
    AssociatesProvider, LwaCredentials, SpApiConfig, SpApiProvider, SpApiRegion,
};
use std::env;
use std::str::FromStr;
use tracing::{debug, info};

/// All of `names`, or `None` when any is unset or empty.
fn vars<const N: usize>(names: [&str; N]) -> Option<[String; N]> {
    let mut values: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, name) in values.iter_mut().zip(names) {
        *slot = env::var(name).ok().filter(|v| !v.trim().is_empty())?;
    }
    Some(values)
}

fn parse_env<T: FromStr>(name: &str, default: T) -> AmazonResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AmazonError::config(format!("{} has an unknown value '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

/// Context with every provider whose credentials are present.
///
/// SP-API reads `SP_API_CLIENT_ID`, `SP_API_CLIENT_SECRET`,
/// `SP_API_REFRESH_TOKEN` and optionally `SP_API_REGION`. Associates reads
/// `PAAPI_ACCESS_KEY`, `PAAPI_SECRET_KEY`, `PAAPI_PARTNER_TAG` and optionally
/// `PAAPI_MARKETPLACE`.
fn context_from_env(file: &AmazonConfig) -> AmazonResult<AmazonContext> {
    let mut context = AmazonContext::new();

    if let Some([client_id, client_secret, refresh_token]) =
        vars(["SP_API_CLIENT_ID", "SP_API_CLIENT_SECRET", "SP_API_REFRESH_TOKEN"])
    {
        let region = parse_env("SP_API_REGION", SpApiRegion::default())?;
        let config = SpApiConfig::from_file_config(
            file,
            LwaCredentials::new(client_id, client_secret, refresh_token),
            region,
        )?;
        context = context.with_sp_api(SpApiProvider::new(config)?);
    } else {
        debug!("SP-API credentials not set");
    }

    if let Some([access_key, secret_key, partner_tag]) =
        vars(["PAAPI_ACCESS_KEY", "PAAPI_SECRET_KEY", "PAAPI_PARTNER_TAG"])
    {
        let marketplace = parse_env("PAAPI_MARKETPLACE", AssociatesMarketplace::default())?;
        let config = AssociatesConfig::from_file_config(
            file,
            access_key,
            secret_key,
            partner_tag,
            marketplace,
        )?;
        context = context.with_associates(AssociatesProvider::new(config)?);
    } else {
        debug!("Associates credentials not set");
    }

    Ok(context)
}

/// Probe every provider configured in the environment and print the result.
///
/// # Errors
///
/// Returns a configuration error when no credentials are set or a provider
/// cannot be built, or when any provider is not healthy.
pub async fn check_health(format: OutputFormat) -> AmazonResult<()> {
    dotenvy::dotenv().ok();
    let file = AmazonConfig::load()?;
    let context = context_from_env(&file)?;
    if context.providers().is_empty() {
        return Err(AmazonError::config(
            "No credentials found; set SP_API_* or PAAPI_* environment variables",
        ));
    }

    let report = context.health_check_all().await;
    match format {
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&report)
                .map_err(|e| AmazonError::config(format!("Failed to render report: {}", e)))?;
            println!("{}", rendered);
        }
        OutputFormat::Human => {
            for (provider, status) in &report {
                let mark = if status.is_healthy() { "✓" } else { "✗" };
                println!("{} {}: {:?}", mark, provider, status);
            }
        }
    }

    let unhealthy = report.values().filter(|s| !s.is_healthy()).count();
    info!(providers = report.len(), unhealthy, "Health check complete");
    if unhealthy > 0 {
        return Err(AmazonError::config(format!(
            "{} of {} providers not healthy",
            unhealthy,
            report.len()
        )));
    }
    Ok(())
}
