use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use weather_now_core::{
    Controller, Coordinates, CurrentReport, Forecaster, Geocoder, Geolocator, LocationError,
    Place, ProviderError, RequestState, Services, Suggestion, TemperatureUnit, WeatherPanel,
    state::{GEOLOCATION_UNSUPPORTED_MESSAGE, LOCATION_DENIED_MESSAGE, WEATHER_FAILED_MESSAGE},
    weather_panel,
};

fn place(name: &str, country: &str, latitude: f64, longitude: f64, timezone: &str) -> Place {
    Place {
        name: name.into(),
        country: country.into(),
        latitude,
        longitude,
        timezone: timezone.into(),
    }
}

fn paris() -> Place {
    place("Paris", "FR", 48.85, 2.35, "Europe/Paris")
}

fn unavailable(endpoint: &'static str) -> ProviderError {
    ProviderError::Status {
        endpoint,
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: String::new(),
    }
}

/// Search answers with one suggestion named after the query unless fixed
/// results are given.
#[derive(Debug, Default)]
struct MockGeocoder {
    results: Option<Vec<Suggestion>>,
    fail_search: bool,
    reverse_results: Option<Vec<Suggestion>>,
    latency: Duration,
    searches: Mutex<Vec<String>>,
    reverses: Mutex<Vec<Coordinates>>,
}

impl MockGeocoder {
    fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    fn reverse_count(&self) -> usize {
        self.reverses.lock().unwrap().len()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Suggestion>, ProviderError> {
        assert_eq!(count, 5);
        self.searches.lock().unwrap().push(query.to_string());
        tokio::time::sleep(self.latency).await;

        if self.fail_search {
            return Err(unavailable("geocoding search"));
        }
        Ok(self.results.clone().unwrap_or_else(|| {
            vec![Suggestion {
                id: 1,
                place: place(query, "XX", 1.0, 2.0, "UTC"),
            }]
        }))
    }

    async fn reverse(
        &self,
        coords: Coordinates,
        count: usize,
    ) -> Result<Vec<Suggestion>, ProviderError> {
        assert_eq!(count, 1);
        self.reverses.lock().unwrap().push(coords);
        self.reverse_results
            .clone()
            .ok_or_else(|| unavailable("geocoding reverse"))
    }
}

/// Replies are taken from a queue of (latency, payload); `None` means the
/// response had no current weather.
#[derive(Debug, Default)]
struct MockForecaster {
    replies: Mutex<VecDeque<(Duration, Option<CurrentReport>)>>,
    calls: Mutex<Vec<(Coordinates, TemperatureUnit)>>,
}

impl MockForecaster {
    fn with_replies(replies: Vec<(Duration, Option<CurrentReport>)>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(Coordinates, TemperatureUnit)> {
        self.calls.lock().unwrap().clone()
    }
}

fn report(temperature: f64, timezone: Option<&str>) -> CurrentReport {
    CurrentReport {
        temperature,
        weathercode: 2,
        time: "2024-01-01T12:00".into(),
        timezone: timezone.map(str::to_string),
    }
}

#[async_trait]
impl Forecaster for MockForecaster {
    async fn current(
        &self,
        coords: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<CurrentReport, ProviderError> {
        self.calls.lock().unwrap().push((coords, unit));
        let (latency, reply) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((Duration::from_millis(50), Some(report(18.4, Some("Europe/Paris")))));

        tokio::time::sleep(latency).await;
        reply.ok_or(ProviderError::MissingCurrentWeather)
    }
}

#[derive(Debug)]
struct MockGeolocator {
    supported: bool,
    latency: Duration,
    position: Result<Coordinates, LocationError>,
}

impl MockGeolocator {
    fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            supported: true,
            latency: Duration::from_millis(10),
            position: Ok(Coordinates::new(latitude, longitude)),
        }
    }
}

#[async_trait]
impl Geolocator for MockGeolocator {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        tokio::time::sleep(self.latency).await;
        self.position.clone()
    }
}

struct Harness {
    controller: Controller,
    geocoder: Arc<MockGeocoder>,
    forecaster: Arc<MockForecaster>,
}

fn harness(
    geocoder: MockGeocoder,
    forecaster: MockForecaster,
    geolocator: MockGeolocator,
) -> Harness {
    let geocoder = Arc::new(geocoder);
    let forecaster = Arc::new(forecaster);
    let services = Services {
        geocoder: geocoder.clone(),
        forecaster: forecaster.clone(),
        geolocator: Arc::new(geolocator),
    };
    Harness {
        controller: Controller::new(services, TemperatureUnit::Celsius),
        geocoder,
        forecaster,
    }
}

fn default_harness() -> Harness {
    harness(
        MockGeocoder::default(),
        MockForecaster::default(),
        MockGeolocator::at(52.52, 13.41),
    )
}

fn paris_harness() -> Harness {
    harness(
        MockGeocoder {
            results: Some(vec![Suggestion { id: 2988507, place: paris() }]),
            ..MockGeocoder::default()
        },
        MockForecaster::default(),
        MockGeolocator::at(52.52, 13.41),
    )
}

#[tokio::test(start_paused = true)]
async fn short_query_issues_no_lookup() {
    let mut h = default_harness();

    h.controller.set_query("Paris");
    h.controller.settle().await;
    assert_eq!(h.controller.state().suggestions().len(), 1);

    h.controller.set_query(" P ");
    assert!(h.controller.state().suggestions().is_empty());
    assert!(!h.controller.is_busy());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.controller.apply_pending(), 0);
    assert_eq!(h.geocoder.searches(), vec!["Paris"]);
}

#[tokio::test(start_paused = true)]
async fn keystrokes_within_quiet_period_collapse_into_one_lookup() {
    let mut h = default_harness();

    for text in ["Pa", "Par", "Pari", "Paris"] {
        h.controller.set_query(text);
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    h.controller.settle().await;

    assert_eq!(h.geocoder.searches(), vec!["Paris"]);
    assert_eq!(h.controller.state().suggestions()[0].place.name, "Paris");
    assert!(!h.controller.state().is_loading_suggestions());
}

#[tokio::test(start_paused = true)]
async fn superseded_lookup_never_overwrites_newer_results() {
    let mut h = harness(
        MockGeocoder {
            latency: Duration::from_secs(1),
            ..MockGeocoder::default()
        },
        MockForecaster::default(),
        MockGeolocator::at(0.0, 0.0),
    );

    h.controller.set_query("Pa");
    assert!(h.controller.step().await);
    assert!(h.controller.state().is_loading_suggestions());

    h.controller.set_query("Paris");
    assert!(!h.controller.state().is_loading_suggestions());

    h.controller.settle().await;
    let names: Vec<_> = h
        .controller
        .state()
        .suggestions()
        .iter()
        .map(|s| s.place.name.clone())
        .collect();
    assert_eq!(names, vec!["Paris"]);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.controller.apply_pending(), 0);
    assert_eq!(h.controller.state().suggestions()[0].place.name, "Paris");
}

#[tokio::test(start_paused = true)]
async fn lookup_failure_is_silent() {
    let mut h = harness(
        MockGeocoder {
            fail_search: true,
            ..MockGeocoder::default()
        },
        MockForecaster::default(),
        MockGeolocator::at(0.0, 0.0),
    );

    h.controller.set_query("Paris");
    h.controller.settle().await;

    let state = h.controller.state();
    assert!(state.suggestions().is_empty());
    assert!(!state.is_loading_suggestions());
    assert_eq!(state.weather_request(), &RequestState::Idle);
    assert_eq!(weather_panel(state), WeatherPanel::Placeholder);
}

#[tokio::test(start_paused = true)]
async fn selecting_paris_shows_its_weather() {
    let mut h = paris_harness();

    h.controller.set_query("Paris");
    h.controller.settle().await;
    assert_eq!(h.controller.state().suggestions().len(), 1);

    assert!(h.controller.select_suggestion(0));
    assert_eq!(h.controller.state().query(), "Paris, FR");
    assert!(h.controller.state().suggestions().is_empty());
    assert_eq!(weather_panel(h.controller.state()), WeatherPanel::Loading);

    h.controller.settle().await;

    assert_eq!(
        h.forecaster.calls(),
        vec![(Coordinates::new(48.85, 2.35), TemperatureUnit::Celsius)]
    );
    let WeatherPanel::Card(card) = weather_panel(h.controller.state()) else {
        panic!("expected a card");
    };
    assert_eq!(card.heading, "Paris, FR");
    assert_eq!(card.temperature, "18°C");
    assert_eq!(card.description, "Partly cloudy");
    assert_eq!(card.icon, "⛅");
    assert_eq!(card.timezone, "Europe/Paris");

    // Selection does not start another lookup for the label text.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.controller.apply_pending(), 0);
    assert_eq!(h.geocoder.searches(), vec!["Paris"]);
}

#[tokio::test(start_paused = true)]
async fn selecting_missing_suggestion_does_nothing() {
    let mut h = default_harness();
    assert!(!h.controller.select_suggestion(3));
    assert!(h.forecaster.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_payload_fails_with_fixed_message() {
    let mut h = harness(
        MockGeocoder::default(),
        MockForecaster::with_replies(vec![(Duration::from_millis(20), None)]),
        MockGeolocator::at(0.0, 0.0),
    );

    h.controller.fetch_weather(paris());
    h.controller.settle().await;

    let state = h.controller.state();
    assert_eq!(state.weather_request().error(), Some(WEATHER_FAILED_MESSAGE));
    assert!(state.conditions().is_none());
}

#[tokio::test(start_paused = true)]
async fn toggling_unit_refetches_current_place_once() {
    let mut h = default_harness();

    h.controller.fetch_weather(paris());
    h.controller.settle().await;
    assert!(h.controller.state().conditions().is_some());

    h.controller.toggle_unit();
    assert!(h.controller.state().conditions().is_none());
    assert!(h.controller.state().weather_request().is_pending());
    h.controller.settle().await;

    let calls = h.forecaster.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1], (Coordinates::new(48.85, 2.35), TemperatureUnit::Fahrenheit));

    let WeatherPanel::Card(card) = weather_panel(h.controller.state()) else {
        panic!("expected a card");
    };
    assert!(card.temperature.ends_with("°F"));
}

#[tokio::test(start_paused = true)]
async fn toggling_unit_without_place_fetches_nothing() {
    let mut h = default_harness();

    h.controller.toggle_unit();
    assert_eq!(h.controller.state().unit(), TemperatureUnit::Fahrenheit);
    assert!(!h.controller.is_busy());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(h.forecaster.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slower_older_fetch_is_discarded() {
    let mut h = harness(
        MockGeocoder::default(),
        MockForecaster::with_replies(vec![
            (Duration::from_secs(5), Some(report(1.0, Some("Europe/Paris")))),
            (Duration::from_secs(1), Some(report(2.0, Some("Europe/Berlin")))),
        ]),
        MockGeolocator::at(0.0, 0.0),
    );

    h.controller.fetch_weather(paris());
    h.controller
        .fetch_weather(place("Berlin", "DE", 52.52, 13.41, "Europe/Berlin"));
    h.controller.settle().await;

    assert_eq!(h.controller.state().conditions().map(|c| c.temperature), Some(2.0));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.controller.apply_pending(), 1);

    let state = h.controller.state();
    assert_eq!(state.conditions().map(|c| c.temperature), Some(2.0));
    assert_eq!(state.place().map(|p| p.name.as_str()), Some("Berlin"));
}

#[tokio::test(start_paused = true)]
async fn geolocation_unsupported_fails_immediately() {
    let mut h = harness(
        MockGeocoder::default(),
        MockForecaster::default(),
        MockGeolocator {
            supported: false,
            latency: Duration::ZERO,
            position: Err(LocationError::Unavailable("none".into())),
        },
    );

    h.controller.use_my_location();

    let state = h.controller.state();
    assert_eq!(state.weather_request().error(), Some(GEOLOCATION_UNSUPPORTED_MESSAGE));
    assert!(!state.weather_request().is_pending());
    assert!(!h.controller.is_busy());
    assert_eq!(
        weather_panel(state),
        WeatherPanel::Error("Geolocation not supported.")
    );
}

#[tokio::test(start_paused = true)]
async fn geolocation_denied_does_not_fetch() {
    let mut h = harness(
        MockGeocoder::default(),
        MockForecaster::default(),
        MockGeolocator {
            supported: true,
            latency: Duration::from_millis(10),
            position: Err(LocationError::PermissionDenied),
        },
    );

    h.controller.use_my_location();
    assert_eq!(weather_panel(h.controller.state()), WeatherPanel::Loading);
    h.controller.settle().await;

    assert_eq!(
        h.controller.state().weather_request().error(),
        Some(LOCATION_DENIED_MESSAGE)
    );
    assert_eq!(h.geocoder.reverse_count(), 0);
    assert!(h.forecaster.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn geolocation_with_resolved_place_updates_query() {
    let mut h = harness(
        MockGeocoder {
            reverse_results: Some(vec![Suggestion {
                id: 2950159,
                place: place("Berlin", "DE", 52.52437, 13.41053, "Europe/Berlin"),
            }]),
            ..MockGeocoder::default()
        },
        MockForecaster::default(),
        MockGeolocator::at(52.52, 13.41),
    );

    h.controller.use_my_location();
    h.controller.settle().await;

    let state = h.controller.state();
    assert_eq!(state.query(), "Berlin, DE");
    assert_eq!(state.place().map(|p| p.name.as_str()), Some("Berlin"));
    assert_eq!(
        h.forecaster.calls(),
        vec![(Coordinates::new(52.52437, 13.41053), TemperatureUnit::Celsius)]
    );
    assert!(state.conditions().is_some());
}

#[tokio::test(start_paused = true)]
async fn geolocation_with_empty_reverse_uses_anonymous_place() {
    let mut h = harness(
        MockGeocoder {
            reverse_results: Some(Vec::new()),
            ..MockGeocoder::default()
        },
        MockForecaster::with_replies(vec![(Duration::from_millis(20), Some(report(7.0, None)))]),
        MockGeolocator::at(10.5, -20.25),
    );

    h.controller.use_my_location();
    h.controller.settle().await;

    let state = h.controller.state();
    let current = state.place().expect("place set");
    assert_eq!(current.name, "Your Location");
    assert_eq!(current.country, "");
    assert_eq!(state.query(), "");
    assert_eq!(
        h.forecaster.calls(),
        vec![(Coordinates::new(10.5, -20.25), TemperatureUnit::Celsius)]
    );
    assert_eq!(state.conditions().map(|c| c.timezone.as_str()), Some("auto"));
}

#[tokio::test(start_paused = true)]
async fn geolocation_with_failed_reverse_still_shows_weather() {
    let mut h = harness(
        MockGeocoder::default(),
        MockForecaster::default(),
        MockGeolocator::at(10.5, -20.25),
    );

    h.controller.use_my_location();
    h.controller.settle().await;

    let state = h.controller.state();
    assert_eq!(state.place().map(|p| p.name.as_str()), Some("Your Location"));
    assert_eq!(state.weather_request(), &RequestState::Succeeded);
    assert_eq!(h.geocoder.reverse_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn selection_supersedes_slow_geolocation() {
    let mut h = harness(
        MockGeocoder {
            reverse_results: Some(Vec::new()),
            ..MockGeocoder::default()
        },
        MockForecaster::default(),
        MockGeolocator {
            latency: Duration::from_secs(3),
            ..MockGeolocator::at(10.0, 10.0)
        },
    );

    h.controller.use_my_location();
    h.controller.fetch_weather(paris());
    h.controller.settle().await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    h.controller.apply_pending();

    let state = h.controller.state();
    assert_eq!(state.place().map(|p| p.name.as_str()), Some("Paris"));
    assert_eq!(h.geocoder.reverse_count(), 0);
    assert_eq!(h.forecaster.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn toggle_during_locate_keeps_location() {
    let mut h = harness(
        MockGeocoder {
            reverse_results: Some(vec![Suggestion {
                id: 2950159,
                place: place("Berlin", "DE", 52.52437, 13.41053, "Europe/Berlin"),
            }]),
            ..MockGeocoder::default()
        },
        MockForecaster::default(),
        MockGeolocator {
            latency: Duration::from_secs(2),
            ..MockGeolocator::at(52.52, 13.41)
        },
    );

    h.controller.fetch_weather(paris());
    h.controller.settle().await;

    h.controller.use_my_location();
    h.controller.toggle_unit();
    h.controller.settle().await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    h.controller.apply_pending();

    let state = h.controller.state();
    assert_eq!(state.place().map(|p| p.name.as_str()), Some("Berlin"));
    assert_eq!(state.query(), "Berlin, DE");
    assert_eq!(state.unit(), TemperatureUnit::Fahrenheit);
    assert_eq!(h.geocoder.reverse_count(), 1);
    assert_eq!(
        h.forecaster.calls(),
        vec![
            (Coordinates::new(48.85, 2.35), TemperatureUnit::Celsius),
            (Coordinates::new(52.52437, 13.41053), TemperatureUnit::Fahrenheit),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_scheduled_lookup() {
    let h = default_harness();
    let Harness {
        mut controller,
        geocoder,
        ..
    } = h;

    controller.set_query("Paris");
    drop(controller);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(geocoder.searches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_in_flight_lookup() {
    let mut h = harness(
        MockGeocoder {
            latency: Duration::from_secs(2),
            ..MockGeocoder::default()
        },
        MockForecaster::default(),
        MockGeolocator::at(0.0, 0.0),
    );

    h.controller.set_query("Paris");
    assert!(h.controller.step().await);
    h.controller.shutdown();

    assert!(!h.controller.is_busy());
    assert!(!h.controller.state().is_loading_suggestions());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.controller.apply_pending(), 0);
    assert!(h.controller.state().suggestions().is_empty());
}
