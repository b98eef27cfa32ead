//! Presentation: pure functions from [`WidgetState`] to what is shown.

use chrono::NaiveDateTime;
use std::fmt;

use crate::{
    codes,
    model::{RequestState, TemperatureUnit},
    state::WidgetState,
};

pub const LOADING_TEXT: &str = "Loading weather...";
pub const PLACEHOLDER_TEXT: &str = "Search for a city or use your location.";
pub const SUGGESTIONS_LOADING_TEXT: &str = "Loading...";
const MISSING_TEMPERATURE: &str = "—";

/// The conditions card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub heading: String,
    pub temperature: String,
    pub description: &'static str,
    pub icon: &'static str,
    pub timezone: String,
    pub observed: String,
}

/// Exactly one of these is shown in the weather area.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherPanel<'a> {
    Loading,
    Error(&'a str),
    Placeholder,
    Card(Card),
}

pub fn weather_panel(state: &WidgetState) -> WeatherPanel<'_> {
    match state.weather_request() {
        RequestState::Pending => return WeatherPanel::Loading,
        RequestState::Failed(message) => return WeatherPanel::Error(message),
        RequestState::Idle | RequestState::Succeeded => {}
    }

    let (Some(place), Some(conditions)) = (state.place(), state.conditions()) else {
        return WeatherPanel::Placeholder;
    };

    let condition = codes::describe(conditions.weathercode);
    WeatherPanel::Card(Card {
        heading: place.label(),
        temperature: format_temperature(Some(conditions.temperature), state.unit()),
        description: condition.description,
        icon: condition.icon,
        timezone: conditions.timezone.clone(),
        observed: format_observation_time(&conditions.time),
    })
}

/// Round half up to a whole degree, e.g. `18°C`; a dash when absent.
pub fn format_temperature(temperature: Option<f64>, unit: TemperatureUnit) -> String {
    match temperature {
        Some(t) if t.is_finite() => {
            let rounded = (t + 0.5).floor() as i64;
            format!("{rounded}°{}", unit.symbol())
        }
        _ => MISSING_TEMPERATURE.to_string(),
    }
}

/// Open-Meteo reports local times as `2024-01-01T12:00`.
pub fn format_observation_time(time: &str) -> String {
    match NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M") {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => time.to_string(),
    }
}

pub fn suggestion_labels(state: &WidgetState) -> Vec<String> {
    state.suggestions().iter().map(|s| s.label()).collect()
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        writeln!(f, "{}", self.temperature)?;
        writeln!(f, "{} {}", self.icon, self.description)?;
        write!(f, "{} • {}", self.timezone, self.observed)
    }
}

impl fmt::Display for WeatherPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherPanel::Loading => f.write_str(LOADING_TEXT),
            WeatherPanel::Error(message) => f.write_str(message),
            WeatherPanel::Placeholder => f.write_str(PLACEHOLDER_TEXT),
            WeatherPanel::Card(card) => write!(f, "{card}"),
        }
    }
}
