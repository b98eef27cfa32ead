use crate::{
    Config,
    error::ProviderError,
    model::{Coordinates, CurrentReport, Suggestion, TemperatureUnit},
    provider::open_meteo::OpenMeteo,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod open_meteo;

/// Forward and reverse place lookup.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Up to `count` places matching free text, in relevance order.
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Suggestion>, ProviderError>;

    /// Up to `count` places near `coords`.
    async fn reverse(
        &self,
        coords: Coordinates,
        count: usize,
    ) -> Result<Vec<Suggestion>, ProviderError>;
}

/// Current-conditions lookup.
#[async_trait]
pub trait Forecaster: Send + Sync + Debug {
    async fn current(
        &self,
        coords: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<CurrentReport, ProviderError>;
}

/// Construct the Open-Meteo client from the configured endpoints.
pub fn open_meteo_from_config(config: &Config) -> Arc<OpenMeteo> {
    Arc::new(OpenMeteo::with_endpoints(config.endpoints.clone()))
}
