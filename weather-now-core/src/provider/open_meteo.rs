use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::Endpoints,
    error::ProviderError,
    model::{Coordinates, CurrentReport, Place, Suggestion, TemperatureUnit},
};

use super::{Forecaster, Geocoder};

const SEARCH_ENDPOINT: &str = "geocoding search";
const REVERSE_ENDPOINT: &str = "geocoding reverse";
const FORECAST_ENDPOINT: &str = "forecast";

/// Client for the free Open-Meteo geocoding and forecast APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    endpoints: Endpoints,
    http: Client,
}

impl Default for OpenMeteo {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteo {
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            http: Client::new(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_body(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, ProviderError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| ProviderError::Http { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Http { endpoint, source })?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }

    async fn geocode(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Suggestion>, ProviderError> {
        let body = self.get_body(endpoint, url, query).await?;
        let parsed: OmGeocodingResponse = serde_json::from_str(&body)
            .map_err(|source| ProviderError::Parse { endpoint, source })?;

        Ok(parsed.results.into_iter().map(Suggestion::from).collect())
    }
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResponse {
    #[serde(default)]
    results: Vec<OmPlace>,
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    #[serde(default)]
    id: i64,
    name: String,
    #[serde(default)]
    country: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    timezone: String,
}

impl From<OmPlace> for Suggestion {
    fn from(raw: OmPlace) -> Self {
        Suggestion {
            id: raw.id,
            place: Place {
                name: raw.name,
                country: raw.country,
                latitude: raw.latitude,
                longitude: raw.longitude,
                timezone: raw.timezone,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    weathercode: i32,
    time: String,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    timezone: Option<String>,
    current_weather: Option<OmCurrentWeather>,
}

#[async_trait]
impl Geocoder for OpenMeteo {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Suggestion>, ProviderError> {
        let url = format!("{}/search", self.endpoints.geocoding_url);
        tracing::debug!(query, count, "searching places");

        self.geocode(
            SEARCH_ENDPOINT,
            &url,
            &[
                ("name", query.to_string()),
                ("count", count.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ],
        )
        .await
    }

    async fn reverse(
        &self,
        coords: Coordinates,
        count: usize,
    ) -> Result<Vec<Suggestion>, ProviderError> {
        let url = format!("{}/reverse", self.endpoints.geocoding_url);
        tracing::debug!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            "reverse geocoding"
        );

        self.geocode(
            REVERSE_ENDPOINT,
            &url,
            &[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("count", count.to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl Forecaster for OpenMeteo {
    async fn current(
        &self,
        coords: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<CurrentReport, ProviderError> {
        tracing::debug!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            %unit,
            "fetching current weather"
        );

        let body = self
            .get_body(
                FORECAST_ENDPOINT,
                &self.endpoints.forecast_url,
                &[
                    ("latitude", coords.latitude.to_string()),
                    ("longitude", coords.longitude.to_string()),
                    ("current_weather", "true".to_string()),
                    ("temperature_unit", unit.as_str().to_string()),
                    ("timezone", "auto".to_string()),
                ],
            )
            .await?;

        let parsed: OmForecastResponse =
            serde_json::from_str(&body).map_err(|source| ProviderError::Parse {
                endpoint: FORECAST_ENDPOINT,
                source,
            })?;

        let current = parsed
            .current_weather
            .ok_or(ProviderError::MissingCurrentWeather)?;

        Ok(CurrentReport {
            temperature: current.temperature,
            weathercode: current.weathercode,
            time: current.time,
            timezone: parsed.timezone,
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
