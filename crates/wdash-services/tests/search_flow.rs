//! Integration tests for SearchOrchestrator using wiremock.
//!
//! Both the geocoding and forecast endpoints are served by one mock server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use wdash_core::{Config, LocationConfig, TemperatureUnit, WeatherConfig};
use wdash_services::{
    AutoRefresh, KeyValueStore, MemoryStore, Panel, RefreshFuture, RefreshTask, SearchError,
    SearchOrchestrator, SearchOutcome, SearchPhase, CURRENT_LOCATION_LABEL, LAST_CITY_KEY,
};
use wdash_weather::{FixedLocation, GeoError, LocationError, LocationProvider, NoLocation};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a geocoding candidate
fn candidate(name: &str, lat: &str, lon: &str) -> serde_json::Value {
    serde_json::json!({
        "display_name": name,
        "lat": lat,
        "lon": lon
    })
}

/// Helper to create a forecast body with the given current temperature
fn forecast(temp: f64) -> serde_json::Value {
    serde_json::json!({
        "utc_offset_seconds": 25200,
        "current_weather": {
            "temperature": temp,
            "windspeed": 11.5,
            "weathercode": 1,
            "time": "2024-03-01T14:00"
        },
        "hourly": {
            "time": ["2024-03-01T13:00", "2024-03-01T14:00"],
            "relativehumidity_2m": [70, 74]
        },
        "daily": {
            "time": ["2024-03-01", "2024-03-02", "2024-03-03", "2024-03-04", "2024-03-05"],
            "temperature_2m_min": [24.1, 23.8, 24.0, 23.5, 24.2],
            "temperature_2m_max": [31.9, 32.4, 30.0, 31.0, 31.5],
            "weathercode": [1, 61, 3, 80, 95]
        }
    })
}

fn config_for(server: &MockServer) -> Config {
    Config {
        weather: WeatherConfig {
            geocoding_url: format!("{}/search", server.uri()),
            forecast_url: format!("{}/v1/forecast", server.uri()),
            ..WeatherConfig::default()
        },
        location: LocationConfig {
            timeout_secs: 1,
            ..LocationConfig::default()
        },
        ..Config::default()
    }
}

fn orchestrator(server: &MockServer) -> (SearchOrchestrator, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = SearchOrchestrator::new(&config_for(server), store.clone()).unwrap();
    (orchestrator, store)
}

async fn mount_geocode(server: &MockServer, query: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_forecast(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_by_name_renders_and_persists_last_city() {
    let server = MockServer::start().await;
    mount_geocode(
        &server,
        "Jakarta",
        serde_json::json!([
            candidate("Jakarta, Indonesia", "-6.1753942", "106.827183"),
            candidate("Jakarta, Somewhere Else", "1.0", "2.0")
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "-6.1753942"))
        .and(query_param("longitude", "106.827183"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(30.2)))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, store) = orchestrator(&server);
    let outcome = orchestrator.search_by_name("  Jakarta ").await;

    let view = match outcome {
        SearchOutcome::Rendered(view) => view,
        other => panic!("Expected rendered view, got {other:?}"),
    };
    assert_eq!(view.current.place_name, "Jakarta, Indonesia");
    assert_eq!(view.current.temperature_text(), "30°C");
    assert_eq!(view.current.humidity_percent, Some(74));
    assert_eq!(view.forecast.len(), 5);

    assert_eq!(orchestrator.phase(), SearchPhase::Rendered);
    assert!(matches!(orchestrator.panel(), Panel::Weather(_)));
    assert_eq!(
        store.get(LAST_CITY_KEY).unwrap().as_deref(),
        Some("Jakarta, Indonesia")
    );
}

#[tokio::test]
async fn test_not_found_skips_forecast() {
    let server = MockServer::start().await;
    mount_geocode(&server, "Qwxz", serde_json::json!([])).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(0.0)))
        .expect(0)
        .mount(&server)
        .await;

    let (orchestrator, store) = orchestrator(&server);
    let outcome = orchestrator.search_by_name("Qwxz").await;

    assert!(matches!(
        outcome,
        SearchOutcome::Failed(SearchError::Geocoding(GeoError::NotFound(_)))
    ));
    assert_eq!(orchestrator.phase(), SearchPhase::Failed);
    assert_eq!(
        orchestrator.panel(),
        Panel::Error("City not found. Try another spelling (e.g. \"Jakarta\").".into())
    );
    assert_eq!(store.get(LAST_CITY_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_empty_query_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (orchestrator, _) = orchestrator(&server);
    let outcome = orchestrator.search_by_name("   ").await;

    assert!(matches!(
        outcome,
        SearchOutcome::Rejected(SearchError::Validation)
    ));
    assert_eq!(orchestrator.phase(), SearchPhase::Idle);
    assert!(matches!(orchestrator.panel(), Panel::Error(_)));
}

#[tokio::test]
async fn test_forecast_failure_reports_weather_service() {
    let server = MockServer::start().await;
    mount_geocode(
        &server,
        "London",
        serde_json::json!([candidate("London, UK", "51.5", "-0.12")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .mount(&server)
        .await;

    let (orchestrator, store) = orchestrator(&server);
    let outcome = orchestrator.search_by_name("London").await;

    assert!(matches!(
        outcome,
        SearchOutcome::Failed(SearchError::Weather(_))
    ));
    assert_eq!(
        orchestrator.panel(),
        Panel::Error("Failed to reach the weather service. Check your connection.".into())
    );
    assert_eq!(orchestrator.current_place(), None);
    assert_eq!(store.get(LAST_CITY_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_geocoding_failure_reports_geocoding_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (orchestrator, _) = orchestrator(&server);
    let outcome = orchestrator.search_by_name("Paris").await;

    assert!(matches!(
        outcome,
        SearchOutcome::Failed(SearchError::Geocoding(GeoError::Transport(_)))
    ));
    assert_eq!(
        orchestrator.panel(),
        Panel::Error("Failed to reach the geocoding service. Check your connection.".into())
    );
}

#[tokio::test]
async fn test_newer_search_wins() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Slowtown"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([candidate("Slowtown", "10.0", "10.0")]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    mount_geocode(
        &server,
        "Fastville",
        serde_json::json!([candidate("Fastville", "20.0", "20.0")]),
    )
    .await;
    mount_forecast(&server, forecast(15.0)).await;

    let (orchestrator, store) = orchestrator(&server);
    let (slow, fast) = tokio::join!(
        orchestrator.search_by_name("Slowtown"),
        orchestrator.search_by_name("Fastville"),
    );

    assert!(matches!(slow, SearchOutcome::Superseded));
    assert!(fast.is_rendered());
    assert_eq!(
        orchestrator.current_place().map(|p| p.display_name),
        Some("Fastville".to_string())
    );
    assert_eq!(store.get(LAST_CITY_KEY).unwrap().as_deref(), Some("Fastville"));
}

#[tokio::test]
async fn test_refresh_reuses_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([candidate("Oslo, Norway", "59.91", "10.75")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "59.91"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(-3.0)))
        .expect(2)
        .mount(&server)
        .await;

    let (orchestrator, _) = orchestrator(&server);
    assert!(orchestrator.search_by_name("Oslo").await.is_rendered());

    let refreshed = orchestrator.refresh().await;
    match refreshed {
        SearchOutcome::Rendered(view) => assert_eq!(view.current.place_name, "Oslo, Norway"),
        other => panic!("Expected rendered view, got {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_with_nothing_shows_status() {
    let server = MockServer::start().await;
    let (orchestrator, _) = orchestrator(&server);

    assert!(matches!(
        orchestrator.refresh().await,
        SearchOutcome::NothingToRefresh
    ));
    assert_eq!(
        orchestrator.panel(),
        Panel::Status("Nothing to refresh yet.".into())
    );

    assert!(matches!(
        orchestrator.refresh_last_city().await,
        SearchOutcome::NothingToRefresh
    ));
}

#[tokio::test]
async fn test_refresh_last_city_geocodes_by_name() {
    let server = MockServer::start().await;
    mount_geocode(
        &server,
        "London, UK",
        serde_json::json!([candidate("London, UK", "51.5", "-0.12")]),
    )
    .await;
    mount_forecast(&server, forecast(12.0)).await;

    let (orchestrator, store) = orchestrator(&server);
    store.set(LAST_CITY_KEY, "London, UK").unwrap();

    assert!(orchestrator.refresh_last_city().await.is_rendered());
    assert_eq!(
        orchestrator.current_place().map(|p| p.lat),
        Some(51.5)
    );
}

#[tokio::test]
async fn test_resume_without_history_offers_samples() {
    let server = MockServer::start().await;
    let (orchestrator, _) = orchestrator(&server);

    assert!(orchestrator.resume().await.is_none());
    assert_eq!(orchestrator.panel(), Panel::Samples);
    assert_eq!(orchestrator.phase(), SearchPhase::Idle);
}

#[tokio::test]
async fn test_resume_searches_last_city() {
    let server = MockServer::start().await;
    mount_geocode(
        &server,
        "Jakarta",
        serde_json::json!([candidate("Jakarta", "-6.17", "106.82")]),
    )
    .await;
    mount_forecast(&server, forecast(30.0)).await;

    let (orchestrator, store) = orchestrator(&server);
    store.set(LAST_CITY_KEY, "Jakarta").unwrap();

    let outcome = orchestrator.resume().await;
    assert!(outcome.is_some_and(|o| o.is_rendered()));
}

#[tokio::test]
async fn test_favorites_follow_current_place() {
    let server = MockServer::start().await;
    mount_geocode(
        &server,
        "Paris",
        serde_json::json!([candidate("Paris, France", "48.85", "2.35")]),
    )
    .await;
    mount_forecast(&server, forecast(18.0)).await;

    let (orchestrator, _) = orchestrator(&server);
    assert!(!orchestrator.add_favorite().unwrap());
    assert_eq!(orchestrator.favorites_view().to_string(), "No favorites yet");

    orchestrator.search_by_name("Paris").await;
    assert!(orchestrator.add_favorite().unwrap());
    assert!(!orchestrator.add_favorite().unwrap());
    assert_eq!(orchestrator.favorites(), vec!["Paris, France".to_string()]);

    orchestrator.remove_favorite("Paris, France").unwrap();
    assert!(orchestrator.favorites().is_empty());
}

#[tokio::test]
async fn test_unit_toggle_does_not_refetch() {
    let server = MockServer::start().await;
    mount_geocode(
        &server,
        "Zero",
        serde_json::json!([candidate("Zero", "0.0", "0.0")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(0.0)))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, _) = orchestrator(&server);
    orchestrator.search_by_name("Zero").await;

    assert_eq!(orchestrator.toggle_unit(), TemperatureUnit::Fahrenheit);
    match orchestrator.panel() {
        Panel::Weather(view) => assert_eq!(view.current.temperature_text(), "32°F"),
        other => panic!("Expected weather panel, got {other:?}"),
    }

    assert_eq!(orchestrator.toggle_unit(), TemperatureUnit::Celsius);
    assert_eq!(orchestrator.unit(), TemperatureUnit::Celsius);
}

#[tokio::test]
async fn test_geolocation_uses_current_location_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "-6.2"))
        .and(query_param("longitude", "106.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(29.0)))
        .mount(&server)
        .await;

    let (orchestrator, store) = orchestrator(&server);
    let provider = FixedLocation {
        latitude: -6.2,
        longitude: 106.8,
    };

    let outcome = orchestrator.search_by_geolocation(&provider).await;
    match outcome {
        SearchOutcome::Rendered(view) => {
            assert_eq!(view.current.place_name, CURRENT_LOCATION_LABEL)
        }
        other => panic!("Expected rendered view, got {other:?}"),
    }
    assert_eq!(
        store.get(LAST_CITY_KEY).unwrap().as_deref(),
        Some(CURRENT_LOCATION_LABEL)
    );
}

#[tokio::test]
async fn test_geolocation_unavailable() {
    let server = MockServer::start().await;
    let (orchestrator, _) = orchestrator(&server);

    let outcome = orchestrator.search_by_geolocation(&NoLocation).await;
    assert!(matches!(
        outcome,
        SearchOutcome::Failed(SearchError::Location(LocationError::ServiceUnavailable))
    ));
    assert_eq!(
        orchestrator.panel(),
        Panel::Error("Geolocation is not available.".into())
    );
}

/// Never produces a fix.
struct SilentLocation;

#[async_trait]
impl LocationProvider for SilentLocation {
    async fn current_location(&self) -> Result<(f64, f64), LocationError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_geolocation_times_out() {
    let server = MockServer::start().await;
    let (orchestrator, _) = orchestrator(&server);

    let outcome = orchestrator.search_by_geolocation(&SilentLocation).await;
    assert!(matches!(
        outcome,
        SearchOutcome::Failed(SearchError::Location(LocationError::Timeout))
    ));
    assert_eq!(
        orchestrator.panel(),
        Panel::Error("Location permission denied or timed out.".into())
    );
}

#[tokio::test]
async fn test_hiding_mid_refresh_keeps_the_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Oslo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([candidate("Oslo", "59.91", "10.75")]))
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&server)
        .await;
    mount_forecast(&server, forecast(4.0)).await;

    let (orchestrator, store) = orchestrator(&server);
    store.set(LAST_CITY_KEY, "Oslo").unwrap();
    let orchestrator = Arc::new(orchestrator);

    let refreshing = Arc::clone(&orchestrator);
    let task: RefreshTask = Arc::new(move || -> RefreshFuture {
        let orchestrator = Arc::clone(&refreshing);
        Box::pin(async move {
            orchestrator.refresh_last_city().await;
        })
    });
    let auto_refresh = AutoRefresh::new(Duration::from_millis(100), task);
    auto_refresh.start();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(orchestrator.phase(), SearchPhase::Searching);
    auto_refresh.set_visible(false);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(orchestrator.phase(), SearchPhase::Rendered);
    assert!(matches!(orchestrator.panel(), Panel::Weather(_)));
}
