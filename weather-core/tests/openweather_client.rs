//! Integration tests for OpenWeatherClient and WeatherSession using wiremock.
//!
//! A mock server stands in for OpenWeatherMap's current-weather and forecast
//! endpoints.

use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use weather_core::{
    Config, ErrorKind, OpenWeatherClient, QueryOrigin, QueryTarget, UnitSystem, WeatherProvider,
    WeatherSession,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CURRENT: &str = "/data/2.5/weather";
const FORECAST: &str = "/data/2.5/forecast";

fn current_body(name: &str, temp: f64) -> Value {
    json!({
        "name": name,
        "dt": 1_700_000_000,
        "visibility": 9000,
        "main": {
            "temp": temp,
            "feels_like": temp - 0.5,
            "temp_min": temp - 2.0,
            "temp_max": temp + 1.0,
            "pressure": 1013,
            "humidity": 64
        },
        "weather": [{ "main": "Clouds", "description": "scattered clouds" }],
        "wind": { "speed": 3.6 },
        "sys": { "country": "FR", "sunrise": 1_699_990_000, "sunset": 1_700_025_000 }
    })
}

fn forecast_body(periods: usize, temp: f64) -> Value {
    let list: Vec<Value> = (0..periods)
        .map(|i| {
            json!({
                "dt": 1_700_010_800 + (i as i64) * 10_800,
                "main": { "temp": temp + i as f64 },
                "weather": [{ "main": "Rain", "description": "light rain" }]
            })
        })
        .collect();
    json!({ "cod": "200", "cnt": periods, "list": list })
}

fn client_for(server: &MockServer, timeout_secs: u64) -> OpenWeatherClient {
    let cfg = Config {
        api_key: Some("TEST_KEY".into()),
        base_url: Some(server.uri()),
        timeout_secs: Some(timeout_secs),
        ..Config::default()
    };
    OpenWeatherClient::new(cfg.client_settings().unwrap()).unwrap()
}

async fn mount_city(server: &MockServer, city: &str, units: &str, temp: f64) {
    Mock::given(method("GET"))
        .and(path(CURRENT))
        .and(query_param("q", city))
        .and(query_param("units", units))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(city, temp)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(FORECAST))
        .and(query_param("q", city))
        .and(query_param("units", units))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(8, temp)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_city_query_returns_paired_report() {
    let server = MockServer::start().await;
    mount_city(&server, "Paris", "metric", 18.4).await;

    let client = client_for(&server, 10);
    let report = client
        .fetch_weather(&QueryTarget::ByCity("Paris".into()), UnitSystem::Metric)
        .await
        .unwrap();

    assert_eq!(report.current.place_name, "Paris");
    assert_eq!(report.location_label(), "Paris, FR");
    assert_eq!(report.current.temperature, 18.4);
    assert_eq!(report.unit.format_temperature(report.current.temperature), "18°C");
    assert_eq!(report.current.visibility_m, Some(9000));

    assert_eq!(report.forecast.len(), 5);
    assert_eq!(report.forecast[0].temperature, 18.4);
    assert!(report.forecast.windows(2).all(|w| w[0].time < w[1].time));
}

#[tokio::test]
async fn test_coordinate_query_sends_lat_lon() {
    let server = MockServer::start().await;

    for (endpoint, body) in [(CURRENT, current_body("Montmartre", 12.0)), (FORECAST, forecast_body(3, 12.0))] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param("lat", "48.8867"))
            .and(query_param("lon", "2.3431"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server, 10);
    let report = client
        .fetch_weather(&QueryTarget::coordinates(48.8867, 2.3431), UnitSystem::Imperial)
        .await
        .unwrap();

    assert_eq!(report.current.place_name, "Montmartre");
    assert_eq!(report.forecast.len(), 3);
    assert_eq!(report.unit, UnitSystem::Imperial);
}

#[tokio::test]
async fn test_unknown_city_is_not_found() {
    let server = MockServer::start().await;

    for endpoint in [CURRENT, FORECAST] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;
    }

    let client = client_for(&server, 10);
    let err = client
        .fetch_weather(&QueryTarget::ByCity("Nowhereville".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.origin, QueryOrigin::City);
    assert!(err.detail.contains("404"), "Error should mention 404 status: {}", err.detail);
    assert_eq!(err.user_message(), "City not found. Please try again.");
}

#[tokio::test]
async fn test_one_failing_half_fails_the_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Lyon", 20.0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FORECAST))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, 10);
    let err = client
        .fetch_weather(&QueryTarget::coordinates(45.76, 4.83), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.origin, QueryOrigin::Coordinates);
    assert!(err.detail.contains("forecast"));
}

#[tokio::test]
async fn test_missing_fields_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Nice" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FORECAST))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(5, 20.0)))
        .mount(&server)
        .await;

    let client = client_for(&server, 10);
    let err = client
        .fetch_weather(&QueryTarget::ByCity("Nice".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_missing_humidity_is_malformed() {
    let server = MockServer::start().await;

    let mut current = current_body("Nice", 20.0);
    current["main"].as_object_mut().unwrap().remove("humidity");

    Mock::given(method("GET"))
        .and(path(CURRENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(current))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FORECAST))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(5, 20.0)))
        .mount(&server)
        .await;

    let client = client_for(&server, 10);
    let err = client
        .fetch_weather(&QueryTarget::ByCity("Nice".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::MalformedResponse);
    assert!(err.detail.contains("humidity"), "{}", err.detail);
}

#[tokio::test]
async fn test_unused_forecast_periods_are_ignored() {
    let server = MockServer::start().await;

    let mut forecast = forecast_body(8, 10.0);
    forecast["list"][6] = json!({ "dt": 1_700_075_600, "main": {} });

    Mock::given(method("GET"))
        .and(path(CURRENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Brest", 10.0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FORECAST))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast))
        .mount(&server)
        .await;

    let client = client_for(&server, 10);
    let report = client
        .fetch_weather(&QueryTarget::ByCity("Brest".into()), UnitSystem::Metric)
        .await
        .unwrap();

    assert_eq!(report.forecast.len(), 5);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;

    for (endpoint, body) in [(CURRENT, current_body("Slowtown", 1.0)), (FORECAST, forecast_body(5, 1.0))] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(body).set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
    }

    let client = client_for(&server, 1);
    let err = client
        .fetch_weather(&QueryTarget::ByCity("Slowtown".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachable_provider_is_network_failure() {
    let cfg = Config {
        api_key: Some("TEST_KEY".into()),
        // Nothing listens on the discard port.
        base_url: Some("http://127.0.0.1:9".into()),
        ..Config::default()
    };
    let client = OpenWeatherClient::new(cfg.client_settings().unwrap()).unwrap();

    let err = client
        .fetch_weather(&QueryTarget::ByCity("Paris".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NetworkFailure);
}

#[tokio::test]
async fn test_session_paris_then_unit_toggle() {
    let server = MockServer::start().await;
    mount_city(&server, "Paris", "metric", 18.4).await;
    mount_city(&server, "Paris", "imperial", 65.1).await;

    let session = WeatherSession::new(Arc::new(client_for(&server, 10)), UnitSystem::Metric);

    session.submit_city("Paris").await.unwrap();
    let snapshot = session.snapshot();
    let report = snapshot.report().unwrap();
    assert_eq!(report.unit.format_temperature(report.current.temperature), "18°C");

    session.toggle_unit().await.unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.unit, UnitSystem::Imperial);
    let report = snapshot.report().unwrap();
    assert_eq!(report.unit.format_temperature(report.current.temperature), "65°F");
}

#[tokio::test]
async fn test_session_blank_submission_sends_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = WeatherSession::new(Arc::new(client_for(&server, 10)), UnitSystem::Metric);

    assert!(session.submit_city("   ").await.is_none());
    assert!(session.toggle_unit().await.is_none());
}

#[tokio::test]
async fn test_session_not_found_clears_previous_report() {
    let server = MockServer::start().await;
    mount_city(&server, "Paris", "metric", 18.4).await;

    for endpoint in [CURRENT, FORECAST] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param("q", "Nowhereville"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
    }

    let session = WeatherSession::new(Arc::new(client_for(&server, 10)), UnitSystem::Metric);
    session.submit_city("Paris").await.unwrap();
    assert!(session.snapshot().report().is_some());

    session.submit_city("Nowhereville").await.unwrap();

    let snapshot = session.snapshot();
    assert!(!snapshot.is_loading());
    assert!(snapshot.report().is_none());
    assert_eq!(snapshot.error().map(|e| e.kind), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_session_abandoned_query_does_not_stay_loading() {
    let server = MockServer::start().await;

    for (endpoint, body) in [(CURRENT, current_body("Slowtown", 1.0)), (FORECAST, forecast_body(5, 1.0))] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(body).set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
    }

    let session = WeatherSession::new(Arc::new(client_for(&server, 10)), UnitSystem::Metric);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), session.submit_city("Slowtown")).await;
    assert!(abandoned.is_err());

    let snapshot = session.snapshot();
    assert!(!snapshot.is_loading());
    assert!(snapshot.report().is_none());
}
