//! File configuration and provider config builders.

use amazon_cache::TtlClass;
use amazon_error::{AmazonErrorKind, Provider};
use amazon_providers::{
    AmazonConfig, AssociatesConfig, AssociatesMarketplace, DEFAULT_HEALTH_CHECK_ASIN,
    LWA_TOKEN_URL, LwaCredentials, ProviderSettings, SpApiConfig, SpApiRegion,
};
use std::io::Write;
use std::time::Duration;

fn endpoint<'a>(
    settings: &'a ProviderSettings,
    pattern: &str,
) -> Option<&'a amazon_rate_limit::RateLimitConfig> {
    settings
        .endpoints()
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(pattern))
        .map(|(_, config)| config)
}

#[test]
fn test_from_file() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    write!(
        file,
        r#"
[providers.sp-api]
request_timeout_ms = 5000

[providers.sp-api.rate_limit]
requests_per_second = 2.0
burst_limit = 4

[providers.sp-api.retry]
max_retries = 1
base_delay_ms = 250
max_delay_ms = 1000
backoff_multiplier = 2.0

[providers.sp-api.endpoints."/orders/v0/orders"]
requests_per_second = 0.0167
burst_limit = 20

[cache]
max_size = 50

[cache.ttl]
orders_secs = 60
"#
    )?;

    let config = AmazonConfig::from_file(file.path())?;
    let sp_api = config.provider(Provider::SpApi);

    assert_eq!(sp_api.rate_limit().requests_per_second, 2.0);
    assert_eq!(sp_api.rate_limit().burst_limit, 4);
    assert_eq!(*sp_api.request_timeout(), Duration::from_millis(5000));
    assert_eq!(sp_api.retry().max_retries, 1);
    assert_eq!(sp_api.retry().base_delay, Duration::from_millis(250));
    let orders = endpoint(&sp_api, "/orders/v0/orders").expect("orders endpoint");
    assert_eq!(orders.requests_per_second, 0.0167);
    assert!(orders.jitter);
    sp_api.validate()?;

    assert_eq!(*config.cache.max_size(), 50);
    assert!(*config.cache.enabled());
    assert_eq!(config.cache.ttl_for(TtlClass::Orders), Duration::from_secs(60));
    assert_eq!(config.cache.ttl_for(TtlClass::Catalog), Duration::from_secs(7200));

    // Providers the file leaves out get their preset
    assert_eq!(
        config.provider(Provider::Associates),
        ProviderSettings::preset(Provider::Associates)
    );
    Ok(())
}

#[test]
fn test_malformed_file_is_config_error() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    write!(file, "[providers.sp-api.rate_limit]\nrequests_per_second = \"fast\"\n")?;

    let err = AmazonConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err.kind(), AmazonErrorKind::Config));
    Ok(())
}

#[test]
fn test_bundled_defaults() -> anyhow::Result<()> {
    let config = AmazonConfig::load()?;

    let sp_api = config.provider(Provider::SpApi);
    sp_api.validate()?;
    assert_eq!(sp_api.rate_limit().burst_limit, 5);
    assert_eq!(
        endpoint(&sp_api, "/reports/2021-06-30/reports").map(|c| c.requests_per_second),
        Some(0.0222)
    );
    assert_eq!(
        endpoint(&sp_api, "/orders/v0/orders/{orderId}/orderItems").map(|c| c.burst_limit),
        Some(30)
    );
    assert!(sp_api.endpoints().len() >= 9);

    let associates = config.provider(Provider::Associates);
    assert_eq!(associates.rate_limit().requests_per_second, 1.0);
    assert_eq!(associates.retry().max_retries, 2);
    assert_eq!(*associates.request_timeout(), Duration::from_secs(10));

    assert_eq!(config.cache.ttl_for(TtlClass::BrowseNodes), Duration::from_secs(7200));
    Ok(())
}

#[test]
fn test_presets() {
    let sp_api = ProviderSettings::preset(Provider::SpApi);
    assert_eq!(sp_api.rate_limit().burst_limit, 5);
    assert_eq!(sp_api.retry().max_retries, 3);
    assert!(sp_api.endpoints().is_empty());

    let advertising = ProviderSettings::preset(Provider::Advertising);
    assert_eq!(advertising.rate_limit().requests_per_second, 10.0);
    assert_eq!(advertising.retry().max_retries, 5);
}

#[test]
fn test_sp_api_config_defaults() -> anyhow::Result<()> {
    let config = SpApiConfig::builder()
        .credentials(LwaCredentials::new("client", "secret", "refresh"))
        .build()?;

    assert_eq!(*config.region(), SpApiRegion::NorthAmerica);
    assert!(!config.sandbox());
    assert_eq!(config.token_url(), LWA_TOKEN_URL);
    assert_eq!(config.base_url(), "https://sellingpartnerapi-na.amazon.com");
    assert_eq!(config.settings(), &ProviderSettings::preset(Provider::SpApi));

    let sandbox = SpApiConfig::builder()
        .credentials(LwaCredentials::new("client", "secret", "refresh"))
        .region(SpApiRegion::FarEast)
        .sandbox(true)
        .build()?;
    assert_eq!(sandbox.base_url(), "https://sandbox.sellingpartnerapi-fe.amazon.com");

    let missing = SpApiConfig::builder().build();
    assert!(missing.is_err());
    Ok(())
}

#[test]
fn test_associates_config_defaults() -> anyhow::Result<()> {
    let config = AssociatesConfig::builder()
        .access_key("AKIAEXAMPLE")
        .secret_key("very-secret")
        .partner_tag("mystore-21")
        .marketplace(AssociatesMarketplace::UnitedKingdom)
        .build()?;

    assert_eq!(config.base_url(), "https://webservices.amazon.co.uk");
    assert_eq!(config.health_check_asin(), DEFAULT_HEALTH_CHECK_ASIN);
    assert_eq!(config.settings(), &ProviderSettings::preset(Provider::Associates));
    assert!(!format!("{:?}", config).contains("very-secret"));
    Ok(())
}

#[test]
fn test_from_file_config() -> anyhow::Result<()> {
    let file = AmazonConfig::default();

    let sp_api = SpApiConfig::from_file_config(
        &file,
        LwaCredentials::new("client", "secret", "refresh"),
        SpApiRegion::Europe,
    )?;
    assert_eq!(sp_api.base_url(), "https://sellingpartnerapi-eu.amazon.com");

    let associates = AssociatesConfig::from_file_config(
        &file,
        "AKIAEXAMPLE",
        "secret",
        "mystore-20",
        AssociatesMarketplace::Germany,
    )?;
    assert_eq!(associates.base_url(), "https://webservices.amazon.de");
    Ok(())
}

#[test]
fn test_credentials_debug_is_redacted() {
    let rendered = format!("{:?}", LwaCredentials::new("client-id", "s3cr3t", "Atzr|refresh"));
    assert!(rendered.contains("client-id"));
    assert!(!rendered.contains("s3cr3t"));
    assert!(!rendered.contains("Atzr|refresh"));
}
