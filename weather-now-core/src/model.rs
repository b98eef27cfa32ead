use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Temperature unit requested from the forecast service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Name used on the wire (`temperature_unit` query parameter).
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    /// Single letter shown after the degree sign.
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown temperature unit '{0}'. Supported units: celsius, fahrenheit.")]
pub struct ParseUnitError(pub String);

impl FromStr for TemperatureUnit {
    type Err = ParseUnitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(ParseUnitError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A resolved geographic location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl Place {
    pub const ANONYMOUS_NAME: &'static str = "Your Location";

    /// Stand-in used when a device position cannot be resolved to a name.
    pub fn anonymous(coords: Coordinates) -> Self {
        Self {
            name: Self::ANONYMOUS_NAME.to_string(),
            country: String::new(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            timezone: "auto".to_string(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// `"<name>, <country>"`, or just the name when the country is unknown.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// One autocomplete candidate returned by the geocoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: i64,
    pub place: Place,
}

impl Suggestion {
    pub fn label(&self) -> String {
        self.place.label()
    }
}

/// Successful forecast payload, before timezone fallback is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReport {
    pub temperature: f64,
    pub weathercode: i32,
    pub time: String,
    pub timezone: Option<String>,
}

/// Latest conditions shown for the current place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub weathercode: i32,
    pub time: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_as_str_roundtrip() {
        for unit in TemperatureUnit::all() {
            let parsed: TemperatureUnit = unit.as_str().parse().expect("roundtrip should succeed");
            assert_eq!(*unit, parsed);
        }
    }

    #[test]
    fn unit_parses_short_forms() {
        assert_eq!("F".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!(" c ".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
    }

    #[test]
    fn unknown_unit_error() {
        let err = "kelvin".parse::<TemperatureUnit>().unwrap_err();
        assert!(err.to_string().contains("Unknown temperature unit 'kelvin'"));
    }

    #[test]
    fn toggling_twice_returns_original_unit() {
        let unit = TemperatureUnit::Celsius;
        assert_eq!(unit.toggled(), TemperatureUnit::Fahrenheit);
        assert_eq!(unit.toggled().toggled(), unit);
    }

    #[test]
    fn anonymous_place_has_no_country() {
        let place = Place::anonymous(Coordinates::new(1.5, -2.5));
        assert_eq!(place.name, "Your Location");
        assert_eq!(place.country, "");
        assert_eq!(place.timezone, "auto");
        assert_eq!(place.label(), "Your Location");
        assert_eq!(place.coordinates(), Coordinates::new(1.5, -2.5));
    }

    #[test]
    fn label_joins_name_and_country() {
        let place = Place {
            name: "Paris".into(),
            country: "France".into(),
            latitude: 48.85,
            longitude: 2.35,
            timezone: "Europe/Paris".into(),
        };
        assert_eq!(place.label(), "Paris, France");
    }

    #[test]
    fn request_state_accessors() {
        assert!(RequestState::Pending.is_pending());
        assert!(!RequestState::Idle.is_pending());
        assert_eq!(RequestState::Failed("boom".into()).error(), Some("boom"));
        assert_eq!(RequestState::Succeeded.error(), None);
    }
}
