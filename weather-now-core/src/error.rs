use reqwest::StatusCode;

/// Failures talking to the geocoding or forecast service.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Failed to send request to {endpoint}: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to parse {endpoint} JSON: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Forecast response contained no current weather")]
    MissingCurrentWeather,
}

/// Failures obtaining the device position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}
