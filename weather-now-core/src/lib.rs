//! Core library for the `weather-now` lookup widget.
//!
//! This crate defines:
//! - Configuration handling
//! - Geocoding, forecast and geolocation collaborators
//! - The widget state record and the controller that debounces input,
//!   cancels superseded lookups and reconciles asynchronous results
//! - Pure presentation of that state
//!
//! It is used by `weather-now-cli`, but can also be driven by other front ends.

use std::time::Duration;

pub mod codes;
pub mod config;
pub mod controller;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod state;
pub mod view;

pub use config::{Config, Endpoints};
pub use controller::{Controller, Event, Services};
pub use error::{LocationError, ProviderError};
pub use geolocation::{Geolocator, geolocator_from_config};
pub use model::{
    Coordinates, CurrentConditions, CurrentReport, Place, RequestState, Suggestion,
    TemperatureUnit,
};
pub use provider::{Forecaster, Geocoder, open_meteo::OpenMeteo, open_meteo_from_config};
pub use state::{WeatherTicket, WidgetState};
pub use view::{WeatherPanel, weather_panel};

/// Quiet period after the last keystroke before suggestions are looked up.
pub const DEBOUNCE: Duration = Duration::from_millis(350);

/// Queries shorter than this (after trimming) are not looked up.
pub const MIN_QUERY_CHARS: usize = 2;

/// Suggestions requested from the geocoder and kept in the dropdown.
pub const MAX_SUGGESTIONS: usize = 5;

/// Places asked for when naming the device position.
pub const REVERSE_LOOKUP_COUNT: usize = 1;

/// Collaborators backed by Open-Meteo, with the position source chosen from
/// config (or an explicit override).
pub fn services_from_config(config: &Config, position: Option<Coordinates>) -> Services {
    let client = open_meteo_from_config(config);
    Services {
        geocoder: client.clone(),
        forecaster: client,
        geolocator: geolocator_from_config(config, position),
    }
}
