//! The widget's single state record.
//!
//! Every field is changed through a transition method so that the conditions
//! shown always belong to the newest weather request.

use crate::{
    MAX_SUGGESTIONS, MIN_QUERY_CHARS,
    error::ProviderError,
    model::{CurrentConditions, CurrentReport, Place, RequestState, Suggestion, TemperatureUnit},
};

pub const WEATHER_FAILED_MESSAGE: &str = "Could not load weather data. Try again.";
pub const GEOLOCATION_UNSUPPORTED_MESSAGE: &str = "Geolocation not supported.";
pub const LOCATION_DENIED_MESSAGE: &str = "Location access denied or unavailable.";

/// Identifies one weather request (fetch or geolocation attempt).
/// Only the most recently issued ticket may change the weather fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeatherTicket(u64);

/// What the input controller should do after the query text changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAction {
    /// Too short: suggestions were cleared, no lookup.
    Cleared,
    /// Schedule a debounced lookup for this (trimmed) text.
    Lookup(String),
}

#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    query: String,
    suggestions: Vec<Suggestion>,
    suggestions_request: RequestState,
    place: Option<Place>,
    conditions: Option<CurrentConditions>,
    weather_request: RequestState,
    unit: TemperatureUnit,
    latest_ticket: u64,
    locating: bool,
}

impl WidgetState {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn suggestions_request(&self) -> &RequestState {
        &self.suggestions_request
    }

    pub fn is_loading_suggestions(&self) -> bool {
        self.suggestions_request.is_pending()
    }

    pub fn place(&self) -> Option<&Place> {
        self.place.as_ref()
    }

    pub fn conditions(&self) -> Option<&CurrentConditions> {
        self.conditions.as_ref()
    }

    pub fn weather_request(&self) -> &RequestState {
        &self.weather_request
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn is_current(&self, ticket: WeatherTicket) -> bool {
        ticket.0 == self.latest_ticket
    }

    /// True while the newest request is a geolocation attempt that has not
    /// yet turned into a weather fetch.
    pub fn is_locating(&self) -> bool {
        self.locating && self.weather_request.is_pending()
    }

    /// Record new query text and decide whether it warrants a lookup.
    pub fn set_query(&mut self, text: impl Into<String>) -> QueryAction {
        self.query = text.into();
        let trimmed = self.query.trim().to_string();

        if trimmed.chars().count() < MIN_QUERY_CHARS {
            self.clear_suggestions();
            return QueryAction::Cleared;
        }

        QueryAction::Lookup(trimmed)
    }

    /// Replace the displayed query without triggering a lookup.
    pub fn show_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    pub fn clear_suggestions(&mut self) {
        self.suggestions.clear();
    }

    pub fn begin_suggestion_lookup(&mut self) {
        self.suggestions_request = RequestState::Pending;
    }

    /// Apply a lookup result. Failures are silent: the list is just emptied.
    pub fn finish_suggestion_lookup(&mut self, result: Result<Vec<Suggestion>, ProviderError>) {
        match result {
            Ok(mut suggestions) => {
                suggestions.truncate(MAX_SUGGESTIONS);
                self.suggestions = suggestions;
                self.suggestions_request = RequestState::Succeeded;
            }
            Err(err) => {
                tracing::debug!(error = %err, "suggestion lookup failed");
                self.suggestions.clear();
                self.suggestions_request = RequestState::Idle;
            }
        }
    }

    /// A superseded or torn-down lookup must not leave the spinner on.
    pub fn cancel_suggestion_lookup(&mut self) {
        if self.suggestions_request.is_pending() {
            self.suggestions_request = RequestState::Idle;
        }
    }

    /// Take the `index`th suggestion as the chosen place: the query shows its
    /// label and the dropdown closes.
    pub fn select_suggestion(&mut self, index: usize) -> Option<Place> {
        let chosen = self.suggestions.get(index)?.clone();
        self.query = format!("{}, {}", chosen.place.name, chosen.place.country);
        self.suggestions.clear();
        Some(chosen.place)
    }

    fn issue_ticket(&mut self) -> WeatherTicket {
        self.latest_ticket += 1;
        WeatherTicket(self.latest_ticket)
    }

    /// Start fetching weather for `place`; supersedes every earlier request.
    pub fn begin_weather_fetch(&mut self, place: Place) -> WeatherTicket {
        self.conditions = None;
        self.weather_request = RequestState::Pending;
        self.place = Some(place);
        self.locating = false;
        self.issue_ticket()
    }

    /// Start a geolocation attempt; supersedes every earlier request.
    pub fn begin_locating(&mut self) -> WeatherTicket {
        self.weather_request = RequestState::Pending;
        self.locating = true;
        self.issue_ticket()
    }

    /// Fail immediately without any request, e.g. no positioning capability.
    pub fn reject_weather(&mut self, message: &str) {
        self.issue_ticket();
        self.locating = false;
        self.weather_request = RequestState::Failed(message.to_string());
    }

    /// Fail the request identified by `ticket`. Returns false if it was stale.
    pub fn fail_weather(&mut self, ticket: WeatherTicket, message: &str) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.locating = false;
        self.weather_request = RequestState::Failed(message.to_string());
        true
    }

    /// Apply a forecast result. Returns false (and changes nothing) if a newer
    /// request has been issued since `ticket`.
    pub fn finish_weather_fetch(
        &mut self,
        ticket: WeatherTicket,
        result: Result<CurrentReport, ProviderError>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        match result {
            Ok(report) => {
                let timezone = report
                    .timezone
                    .filter(|tz| !tz.is_empty())
                    .or_else(|| {
                        self.place
                            .as_ref()
                            .map(|p| p.timezone.clone())
                            .filter(|tz| !tz.is_empty())
                    })
                    .unwrap_or_else(|| "UTC".to_string());

                self.conditions = Some(CurrentConditions {
                    temperature: report.temperature,
                    weathercode: report.weathercode,
                    time: report.time,
                    timezone,
                });
                self.weather_request = RequestState::Succeeded;
            }
            Err(err) => {
                tracing::warn!(error = %err, "weather fetch failed");
                self.conditions = None;
                self.weather_request = RequestState::Failed(WEATHER_FAILED_MESSAGE.to_string());
            }
        }

        true
    }

    /// Flip the unit. Returns the place to re-fetch, if any.
    pub fn toggle_unit(&mut self) -> Option<Place> {
        self.set_unit(self.unit.toggled())
    }

    /// Change the unit. Returns the place to re-fetch when the unit actually
    /// changed and a place is selected. While locating nothing is re-fetched:
    /// the located place will be fetched in the new unit.
    pub fn set_unit(&mut self, unit: TemperatureUnit) -> Option<Place> {
        if self.unit == unit {
            return None;
        }
        self.unit = unit;
        if self.is_locating() {
            return None;
        }
        self.place.clone()
    }
}
