//! Search flow: geocode, fetch the forecast, render, remember the place.
//!
//! The widget's view lives in [`ViewState`], whose transitions are plain
//! methods so the state machine can be exercised without any network.
//! [`SearchOrchestrator`] drives those transitions from the async clients.
//!
//! Every search takes a sequence number when it starts. Only the most
//! recently started search may change the view; an older one that finishes
//! later is dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use wdash_core::{Config, StorageError};
use wdash_weather::{
    render, FavoritesView, GeoError, GeocodingClient, LocationError, LocationProvider, Place,
    TemperatureUnit, ViewModel, WeatherClient, WeatherError, WeatherSnapshot,
};

use crate::favorites::FavoritesStore;
use crate::store::KeyValueStore;

/// Label used for searches started from the device location
pub const CURRENT_LOCATION_LABEL: &str = "Current location";

/// Quick picks offered when there is nothing to resume
pub const SAMPLE_CITIES: [&str; 3] = ["Jakarta", "London", "New York"];

const FETCHING_STATUS: &str = "Fetching weather data...";
const LOCATING_STATUS: &str = "Detecting location...";
const NOTHING_TO_REFRESH: &str = "Nothing to refresh yet.";

/// Search errors, each terminal for the action that raised it.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Empty search query")]
    Validation,
    #[error(transparent)]
    Geocoding(#[from] GeoError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    Location(#[from] LocationError),
}

impl SearchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::Validation => "Enter a city name.",
            SearchError::Geocoding(e) => e.user_message(),
            SearchError::Weather(e) => e.user_message(),
            SearchError::Location(e) => e.user_message(),
        }
    }
}

/// Where the search flow is.
///
/// `Failed` accepts new actions exactly like `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    Rendered,
    Failed,
}

/// What the current-conditions area shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Panel {
    #[default]
    Samples,
    Status(String),
    Error(String),
    Weather(ViewModel),
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Panel::Samples => write!(f, "Try a quick search: {}", SAMPLE_CITIES.join(" | ")),
            Panel::Status(message) => f.write_str(message),
            Panel::Error(message) => write!(f, "Error: {message}"),
            Panel::Weather(view) => write!(f, "{view}"),
        }
    }
}

/// Result of one search-like action.
#[derive(Debug)]
pub enum SearchOutcome {
    /// The view was replaced
    Rendered(ViewModel),
    /// The action failed and the error is on the panel
    Failed(SearchError),
    /// Rejected before any request was made
    Rejected(SearchError),
    /// Refresh had no place to refresh
    NothingToRefresh,
    /// A newer search started while this one was in flight
    Superseded,
}

impl SearchOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, SearchOutcome::Rendered(_))
    }
}

/// The orchestrator-owned view: current place, its snapshot, unit and panel.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub phase: SearchPhase,
    pub place: Option<Place>,
    pub snapshot: Option<WeatherSnapshot>,
    pub unit: TemperatureUnit,
    pub panel: Panel,
    latest_seq: u64,
}

impl ViewState {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    /// Start a search showing `status`; returns its sequence number.
    pub fn begin(&mut self, status: &str) -> u64 {
        self.latest_seq += 1;
        self.phase = SearchPhase::Searching;
        self.panel = Panel::Status(status.to_string());
        self.latest_seq
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest_seq
    }

    /// Replace the view with a fresh result. `None` if `seq` was superseded.
    pub fn complete(
        &mut self,
        seq: u64,
        place: Place,
        snapshot: WeatherSnapshot,
        icon_base_url: &str,
    ) -> Option<ViewModel> {
        if !self.is_current(seq) {
            return None;
        }
        let view = render(&snapshot, &place.display_name, self.unit, icon_base_url);
        self.place = Some(place);
        self.snapshot = Some(snapshot);
        self.phase = SearchPhase::Rendered;
        self.panel = Panel::Weather(view.clone());
        Some(view)
    }

    /// Show a failure. Returns false if `seq` was superseded.
    pub fn fail(&mut self, seq: u64, message: &str) -> bool {
        if !self.is_current(seq) {
            return false;
        }
        self.phase = SearchPhase::Failed;
        self.panel = Panel::Error(message.to_string());
        true
    }

    /// Show a validation message without starting a search.
    pub fn reject(&mut self, message: &str) {
        if self.phase != SearchPhase::Searching {
            self.phase = SearchPhase::Idle;
        }
        self.panel = Panel::Error(message.to_string());
    }

    /// Show a neutral message.
    pub fn show_status(&mut self, message: &str) {
        if self.phase != SearchPhase::Searching {
            self.phase = SearchPhase::Idle;
        }
        self.panel = Panel::Status(message.to_string());
    }

    pub fn show_samples(&mut self) {
        if self.phase != SearchPhase::Searching {
            self.phase = SearchPhase::Idle;
        }
        self.panel = Panel::Samples;
    }

    /// Switch units and redraw the cached snapshot, if any.
    pub fn set_unit(&mut self, unit: TemperatureUnit, icon_base_url: &str) -> Option<ViewModel> {
        self.unit = unit;
        let (place, snapshot) = (self.place.as_ref()?, self.snapshot.as_ref()?);
        let view = render(snapshot, &place.display_name, unit, icon_base_url);
        if self.phase != SearchPhase::Searching {
            self.phase = SearchPhase::Rendered;
        }
        self.panel = Panel::Weather(view.clone());
        Some(view)
    }
}

/// Coordinates geocoding, forecast fetching, rendering and persistence.
pub struct SearchOrchestrator {
    geocoder: GeocodingClient,
    weather: WeatherClient,
    favorites: FavoritesStore,
    state: Mutex<ViewState>,
    icon_base_url: String,
    location_timeout: Duration,
}

impl SearchOrchestrator {
    pub fn new(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self, SearchError> {
        Ok(Self {
            geocoder: GeocodingClient::new(&config.weather)?,
            weather: WeatherClient::new(&config.weather)?,
            favorites: FavoritesStore::new(store),
            state: Mutex::new(ViewState::new(config.weather.temperature_unit)),
            icon_base_url: config.weather.icon_base_url.clone(),
            location_timeout: Duration::from_secs(config.location.timeout_secs),
        })
    }

    /// Search by free-text place name.
    pub async fn search_by_name(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            let err = SearchError::Validation;
            self.state.lock().reject(err.user_message());
            return SearchOutcome::Rejected(err);
        }

        let seq = self.state.lock().begin(FETCHING_STATUS);
        tracing::info!(seq, "Searching for \"{}\"", query);

        let place = match self.geocoder.resolve(query).await {
            Ok(place) => place,
            Err(e) => return self.fail(seq, e.into()),
        };

        self.fetch_and_commit(seq, place).await
    }

    /// Search known coordinates, shown under `label`.
    pub async fn search_by_coordinates(&self, lat: f64, lon: f64, label: &str) -> SearchOutcome {
        let seq = self.state.lock().begin(FETCHING_STATUS);
        tracing::info!(seq, "Fetching weather for {} ({:.4}, {:.4})", label, lat, lon);

        let place = Place {
            display_name: label.to_string(),
            lat,
            lon,
        };
        self.fetch_and_commit(seq, place).await
    }

    /// Search the device's current location.
    pub async fn search_by_geolocation(&self, provider: &dyn LocationProvider) -> SearchOutcome {
        let seq = self.state.lock().begin(LOCATING_STATUS);

        let fix = tokio::time::timeout(self.location_timeout, provider.current_location()).await;
        let (lat, lon) = match fix {
            Ok(Ok(coords)) => coords,
            Ok(Err(e)) => return self.fail(seq, e.into()),
            Err(_) => return self.fail(seq, LocationError::Timeout.into()),
        };
        tracing::info!(seq, "Located device at {:.4}, {:.4}", lat, lon);

        let place = Place {
            display_name: CURRENT_LOCATION_LABEL.to_string(),
            lat,
            lon,
        };
        self.fetch_and_commit(seq, place).await
    }

    /// Re-run the current view's coordinates, else the last searched city.
    pub async fn refresh(&self) -> SearchOutcome {
        let current = self.state.lock().place.clone();
        if let Some(place) = current {
            return self
                .search_by_coordinates(place.lat, place.lon, &place.display_name)
                .await;
        }

        match self.search_last_city().await {
            Some(outcome) => outcome,
            None => {
                self.state.lock().show_status(NOTHING_TO_REFRESH);
                SearchOutcome::NothingToRefresh
            }
        }
    }

    /// Re-resolve the persisted last city by name; the view is untouched if there is none.
    pub async fn refresh_last_city(&self) -> SearchOutcome {
        self.search_last_city()
            .await
            .unwrap_or(SearchOutcome::NothingToRefresh)
    }

    /// Start-up: search the last city if there is one, else offer samples.
    pub async fn resume(&self) -> Option<SearchOutcome> {
        let outcome = self.search_last_city().await;
        if outcome.is_none() {
            self.state.lock().show_samples();
        }
        outcome
    }

    pub fn show_samples(&self) {
        self.state.lock().show_samples();
    }

    /// Flip between Celsius and Fahrenheit without refetching.
    pub fn toggle_unit(&self) -> TemperatureUnit {
        let mut state = self.state.lock();
        let unit = state.unit.toggled();
        state.set_unit(unit, &self.icon_base_url);
        unit
    }

    pub fn set_unit(&self, unit: TemperatureUnit) -> Option<ViewModel> {
        self.state.lock().set_unit(unit, &self.icon_base_url)
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.state.lock().unit
    }

    pub fn phase(&self) -> SearchPhase {
        self.state.lock().phase
    }

    pub fn panel(&self) -> Panel {
        self.state.lock().panel.clone()
    }

    pub fn current_place(&self) -> Option<Place> {
        self.state.lock().place.clone()
    }

    /// Copy of the whole view state.
    pub fn view_state(&self) -> ViewState {
        self.state.lock().clone()
    }

    /// Save the current place as a favorite. `Ok(false)` if there is no
    /// current place or it is already a favorite.
    pub fn add_favorite(&self) -> Result<bool, StorageError> {
        let name = match self.state.lock().place.as_ref() {
            Some(place) => place.display_name.clone(),
            None => return Ok(false),
        };
        self.favorites.add(&name)
    }

    pub fn remove_favorite(&self, name: &str) -> Result<(), StorageError> {
        self.favorites.remove(name)
    }

    pub fn favorites(&self) -> Vec<String> {
        self.favorites.list()
    }

    pub fn favorites_view(&self) -> FavoritesView {
        wdash_weather::favorites_view(&self.favorites.list())
    }

    pub fn last_searched(&self) -> Option<String> {
        self.favorites.last_searched()
    }

    async fn search_last_city(&self) -> Option<SearchOutcome> {
        let city = self.favorites.last_searched()?;
        tracing::debug!("Re-running last searched city: {}", city);
        Some(self.search_by_name(&city).await)
    }

    async fn fetch_and_commit(&self, seq: u64, place: Place) -> SearchOutcome {
        let snapshot = match self.weather.fetch_forecast(place.lat, place.lon).await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(seq, e.into()),
        };

        let name = place.display_name.clone();
        let view = self
            .state
            .lock()
            .complete(seq, place, snapshot, &self.icon_base_url);

        match view {
            Some(view) => {
                if let Err(e) = self.favorites.set_last_searched(&name) {
                    tracing::warn!("Failed to remember last city: {}", e);
                }
                tracing::info!(seq, "Rendered weather for {}", name);
                SearchOutcome::Rendered(view)
            }
            None => {
                tracing::debug!(seq, "Discarding result for {}: superseded", name);
                SearchOutcome::Superseded
            }
        }
    }

    fn fail(&self, seq: u64, err: SearchError) -> SearchOutcome {
        if self.state.lock().fail(seq, err.user_message()) {
            tracing::warn!(seq, "Search failed: {}", err);
            SearchOutcome::Failed(err)
        } else {
            tracing::debug!(seq, "Discarding failure ({}): superseded", err);
            SearchOutcome::Superseded
        }
    }
}
