//! Calls against the real APIs.
//!
//! These tests require the `api` feature flag and credentials in the
//! environment (or a `.env` file):
//! ```bash
//! cargo test -p amazon_core --features api
//! ```

use amazon_core::{
    AmazonConfig, AmazonProvider, AssociatesConfig, AssociatesMarketplace, AssociatesProvider,
    HealthStatus, LwaCredentials, SpApiConfig, SpApiProvider, SpApiRegion,
};
use std::env;

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_sp_api_marketplace_participations() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let credentials = LwaCredentials::new(
        env::var("SP_API_CLIENT_ID").expect("SP_API_CLIENT_ID must be set for API tests"),
        env::var("SP_API_CLIENT_SECRET").expect("SP_API_CLIENT_SECRET must be set for API tests"),
        env::var("SP_API_REFRESH_TOKEN").expect("SP_API_REFRESH_TOKEN must be set for API tests"),
    );

    let file = AmazonConfig::load()?;
    let provider = SpApiProvider::new(SpApiConfig::from_file_config(
        &file,
        credentials,
        SpApiRegion::NorthAmerica,
    )?)?;

    provider.initialize().await?;
    let participations = provider.get_marketplace_participations().await?;
    println!("Participations: {}", participations);
    assert_eq!(provider.health_check().await, HealthStatus::Healthy);
    Ok(())
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_associates_get_item() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let file = AmazonConfig::load()?;
    let provider = AssociatesProvider::new(AssociatesConfig::from_file_config(
        &file,
        env::var("PAAPI_ACCESS_KEY").expect("PAAPI_ACCESS_KEY must be set for API tests"),
        env::var("PAAPI_SECRET_KEY").expect("PAAPI_SECRET_KEY must be set for API tests"),
        env::var("PAAPI_PARTNER_TAG").expect("PAAPI_PARTNER_TAG must be set for API tests"),
        AssociatesMarketplace::UnitedStates,
    )?)?;

    let item = provider.get_item("B00ZV9RDKK").await?;
    println!("Item: {:?}", item.title());
    assert_eq!(item.asin, "B00ZV9RDKK");
    Ok(())
}
