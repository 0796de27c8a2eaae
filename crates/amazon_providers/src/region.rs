//! Regional endpoints.

use serde::{Deserialize, Serialize};

/// SP-API selling region.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SpApiRegion {
    /// US, CA, MX, BR
    #[default]
    NorthAmerica,
    /// UK, EU marketplaces, IN, TR, AE, SA, EG
    Europe,
    /// JP, AU, SG
    FarEast,
}

impl SpApiRegion {
    /// Base URL, production or sandbox.
    pub fn endpoint(&self, sandbox: bool) -> &'static str {
        match (self, sandbox) {
            (SpApiRegion::NorthAmerica, false) => "https://sellingpartnerapi-na.amazon.com",
            (SpApiRegion::NorthAmerica, true) => "https://sandbox.sellingpartnerapi-na.amazon.com",
            (SpApiRegion::Europe, false) => "https://sellingpartnerapi-eu.amazon.com",
            (SpApiRegion::Europe, true) => "https://sandbox.sellingpartnerapi-eu.amazon.com",
            (SpApiRegion::FarEast, false) => "https://sellingpartnerapi-fe.amazon.com",
            (SpApiRegion::FarEast, true) => "https://sandbox.sellingpartnerapi-fe.amazon.com",
        }
    }

    /// AWS region hosting the endpoint.
    pub fn aws_region(&self) -> &'static str {
        match self {
            SpApiRegion::NorthAmerica => "us-east-1",
            SpApiRegion::Europe => "eu-west-1",
            SpApiRegion::FarEast => "us-west-2",
        }
    }
}

/// Associates (PA-API 5) marketplace.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AssociatesMarketplace {
    /// amazon.com
    #[default]
    UnitedStates,
    /// amazon.ca
    Canada,
    /// amazon.com.mx
    Mexico,
    /// amazon.com.br
    Brazil,
    /// amazon.co.uk
    UnitedKingdom,
    /// amazon.de
    Germany,
    /// amazon.fr
    France,
    /// amazon.it
    Italy,
    /// amazon.es
    Spain,
    /// amazon.in
    India,
    /// amazon.co.jp
    Japan,
    /// amazon.com.au
    Australia,
}

impl AssociatesMarketplace {
    /// Storefront host, sent as `Marketplace` and used for affiliate links.
    pub fn domain(&self) -> &'static str {
        match self {
            AssociatesMarketplace::UnitedStates => "www.amazon.com",
            AssociatesMarketplace::Canada => "www.amazon.ca",
            AssociatesMarketplace::Mexico => "www.amazon.com.mx",
            AssociatesMarketplace::Brazil => "www.amazon.com.br",
            AssociatesMarketplace::UnitedKingdom => "www.amazon.co.uk",
            AssociatesMarketplace::Germany => "www.amazon.de",
            AssociatesMarketplace::France => "www.amazon.fr",
            AssociatesMarketplace::Italy => "www.amazon.it",
            AssociatesMarketplace::Spain => "www.amazon.es",
            AssociatesMarketplace::India => "www.amazon.in",
            AssociatesMarketplace::Japan => "www.amazon.co.jp",
            AssociatesMarketplace::Australia => "www.amazon.com.au",
        }
    }

    /// PA-API host.
    pub fn host(&self) -> &'static str {
        match self {
            AssociatesMarketplace::UnitedStates => "webservices.amazon.com",
            AssociatesMarketplace::Canada => "webservices.amazon.ca",
            AssociatesMarketplace::Mexico => "webservices.amazon.com.mx",
            AssociatesMarketplace::Brazil => "webservices.amazon.com.br",
            AssociatesMarketplace::UnitedKingdom => "webservices.amazon.co.uk",
            AssociatesMarketplace::Germany => "webservices.amazon.de",
            AssociatesMarketplace::France => "webservices.amazon.fr",
            AssociatesMarketplace::Italy => "webservices.amazon.it",
            AssociatesMarketplace::Spain => "webservices.amazon.es",
            AssociatesMarketplace::India => "webservices.amazon.in",
            AssociatesMarketplace::Japan => "webservices.amazon.co.jp",
            AssociatesMarketplace::Australia => "webservices.amazon.com.au",
        }
    }

    /// AWS signing region.
    pub fn aws_region(&self) -> &'static str {
        match self {
            AssociatesMarketplace::UnitedStates
            | AssociatesMarketplace::Canada
            | AssociatesMarketplace::Mexico
            | AssociatesMarketplace::Brazil => "us-east-1",
            AssociatesMarketplace::UnitedKingdom
            | AssociatesMarketplace::Germany
            | AssociatesMarketplace::France
            | AssociatesMarketplace::Italy
            | AssociatesMarketplace::Spain
            | AssociatesMarketplace::India => "eu-west-1",
            AssociatesMarketplace::Japan | AssociatesMarketplace::Australia => "us-west-2",
        }
    }
}
