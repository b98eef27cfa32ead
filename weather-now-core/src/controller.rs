//! Input controller and request reconciliation.
//!
//! User operations mutate [`WidgetState`] synchronously and spawn tokio tasks
//! for network and positioning work. Tasks never touch the state: they report
//! back through [`Event`]s, which the owner of the controller applies one at a
//! time with [`Controller::apply`] (or [`Controller::step`]).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    DEBOUNCE, MAX_SUGGESTIONS, REVERSE_LOOKUP_COUNT,
    error::{LocationError, ProviderError},
    geolocation::Geolocator,
    model::{Coordinates, CurrentReport, Place, Suggestion, TemperatureUnit},
    provider::{Forecaster, Geocoder},
    state::{
        GEOLOCATION_UNSUPPORTED_MESSAGE, LOCATION_DENIED_MESSAGE, QueryAction, WeatherTicket,
        WidgetState,
    },
};

/// External collaborators the controller talks to.
#[derive(Debug, Clone)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub forecaster: Arc<dyn Forecaster>,
    pub geolocator: Arc<dyn Geolocator>,
}

/// Completion of a background task.
#[derive(Debug)]
pub enum Event {
    /// The debounce period elapsed and the lookup request is going out.
    LookupStarted { generation: u64 },
    LookupFinished {
        generation: u64,
        result: Result<Vec<Suggestion>, ProviderError>,
    },
    PositionResolved {
        ticket: WeatherTicket,
        result: Result<Coordinates, LocationError>,
    },
    ReverseResolved {
        ticket: WeatherTicket,
        coords: Coordinates,
        result: Result<Vec<Suggestion>, ProviderError>,
    },
    WeatherResolved {
        ticket: WeatherTicket,
        result: Result<CurrentReport, ProviderError>,
    },
}

#[derive(Debug)]
struct PendingLookup {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Debug)]
pub struct Controller {
    state: WidgetState,
    services: Services,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    lookup: Option<PendingLookup>,
    lookup_generation: u64,
}

impl Controller {
    pub fn new(services: Services, unit: TemperatureUnit) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: WidgetState::new(unit),
            services,
            events_tx,
            events_rx,
            lookup: None,
            lookup_generation: 0,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    /// True while a suggestion lookup is scheduled or in flight, or a weather
    /// request has not resolved yet.
    pub fn is_busy(&self) -> bool {
        self.lookup.is_some() || self.state.weather_request().is_pending()
    }

    /// New query text. Supersedes any scheduled or in-flight lookup.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.cancel_lookup();

        match self.state.set_query(text) {
            QueryAction::Cleared => {}
            QueryAction::Lookup(query) => self.schedule_lookup(query),
        }
    }

    /// Choose the `index`th suggestion and fetch its weather.
    /// Returns false if there is no such suggestion.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        let Some(place) = self.state.select_suggestion(index) else {
            return false;
        };
        // The query now shows the chosen label; nothing left to look up.
        self.cancel_lookup();
        self.fetch_weather(place);
        true
    }

    /// Fetch current conditions for `place` in the current unit.
    pub fn fetch_weather(&mut self, place: Place) {
        let coords = place.coordinates();
        let unit = self.state.unit();
        let ticket = self.state.begin_weather_fetch(place);
        tracing::debug!(
            ?ticket,
            latitude = coords.latitude,
            longitude = coords.longitude,
            %unit,
            "weather fetch started"
        );

        let forecaster = Arc::clone(&self.services.forecaster);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = forecaster.current(coords, unit).await;
            let _ = tx.send(Event::WeatherResolved { ticket, result });
        });
    }

    pub fn toggle_unit(&mut self) {
        if let Some(place) = self.state.toggle_unit() {
            self.fetch_weather(place);
        }
    }

    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        if let Some(place) = self.state.set_unit(unit) {
            self.fetch_weather(place);
        }
    }

    /// Resolve the device position and show its weather.
    pub fn use_my_location(&mut self) {
        if !self.services.geolocator.is_supported() {
            self.state.reject_weather(GEOLOCATION_UNSUPPORTED_MESSAGE);
            return;
        }

        let ticket = self.state.begin_locating();
        tracing::debug!(?ticket, "locating device");

        let geolocator = Arc::clone(&self.services.geolocator);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = geolocator.current_position().await;
            let _ = tx.send(Event::PositionResolved { ticket, result });
        });
    }

    /// Cancel outstanding suggestion work. Weather requests run to completion
    /// but their results are still subject to ticket checks.
    pub fn shutdown(&mut self) {
        self.cancel_lookup();
    }

    /// Wait for the next background event. Never returns `None` while the
    /// controller is alive, so only await this when something is outstanding.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    /// Wait for one event and apply it. Returns whether the state changed.
    pub async fn step(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => self.apply(event),
            None => false,
        }
    }

    /// Apply every event already queued, without waiting.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Step until no lookup or weather request is outstanding.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            self.step().await;
        }
    }

    /// Apply a background event. Returns whether the state changed.
    pub fn apply(&mut self, event: Event) -> bool {
        match event {
            Event::LookupStarted { generation } => {
                if !self.is_current_lookup(generation) {
                    return false;
                }
                self.state.begin_suggestion_lookup();
                true
            }
            Event::LookupFinished { generation, result } => {
                if !self.is_current_lookup(generation) {
                    tracing::debug!(generation, "dropping superseded suggestion result");
                    return false;
                }
                self.lookup = None;
                self.state.finish_suggestion_lookup(result);
                true
            }
            Event::PositionResolved { ticket, result } => {
                if !self.state.is_current(ticket) {
                    tracing::debug!(?ticket, "dropping superseded position");
                    return false;
                }
                match result {
                    Ok(coords) => {
                        self.spawn_reverse_lookup(ticket, coords);
                        false
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "geolocation failed");
                        self.state.fail_weather(ticket, LOCATION_DENIED_MESSAGE)
                    }
                }
            }
            Event::ReverseResolved {
                ticket,
                coords,
                result,
            } => {
                if !self.state.is_current(ticket) {
                    tracing::debug!(?ticket, "dropping superseded reverse lookup");
                    return false;
                }
                let best = match result {
                    Ok(found) => found.into_iter().next(),
                    Err(err) => {
                        tracing::warn!(error = %err, "reverse lookup failed, using coordinates");
                        None
                    }
                };
                match best {
                    Some(suggestion) => {
                        let label = format!(
                            "{}, {}",
                            suggestion.place.name, suggestion.place.country
                        );
                        self.fetch_weather(suggestion.place);
                        self.state.show_query(label);
                    }
                    None => self.fetch_weather(Place::anonymous(coords)),
                }
                true
            }
            Event::WeatherResolved { ticket, result } => {
                let applied = self.state.finish_weather_fetch(ticket, result);
                if !applied {
                    tracing::debug!(?ticket, "dropping superseded weather result");
                }
                applied
            }
        }
    }

    fn is_current_lookup(&self, generation: u64) -> bool {
        self.lookup
            .as_ref()
            .is_some_and(|lookup| lookup.generation == generation)
    }

    fn cancel_lookup(&mut self) {
        if let Some(lookup) = self.lookup.take() {
            tracing::trace!(generation = lookup.generation, "cancelling suggestion lookup");
            lookup.cancel.cancel();
        }
        self.state.cancel_suggestion_lookup();
    }

    fn schedule_lookup(&mut self, query: String) {
        self.lookup_generation += 1;
        let generation = self.lookup_generation;
        let cancel = CancellationToken::new();
        self.lookup = Some(PendingLookup {
            generation,
            cancel: cancel.clone(),
        });

        let geocoder = Arc::clone(&self.services.geocoder);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(DEBOUNCE) => {}
            }

            if tx.send(Event::LookupStarted { generation }).is_err() {
                return;
            }

            // Losing the race drops the request future, which aborts the HTTP call.
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                result = geocoder.search(&query, MAX_SUGGESTIONS) => result,
            };

            let _ = tx.send(Event::LookupFinished { generation, result });
        });
    }

    fn spawn_reverse_lookup(&self, ticket: WeatherTicket, coords: Coordinates) {
        let geocoder = Arc::clone(&self.services.geocoder);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = geocoder.reverse(coords, REVERSE_LOOKUP_COUNT).await;
            let _ = tx.send(Event::ReverseResolved {
                ticket,
                coords,
                result,
            });
        });
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(lookup) = self.lookup.take() {
            lookup.cancel.cancel();
        }
    }
}
