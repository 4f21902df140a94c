//! End-to-end tests of the fetch pipeline against a mock OpenWeather server.

use std::time::Duration;

use openweather_core::{
    EndpointBuilder, ErrorKind, FetchOutcome, HttpWeatherClient, LocationQuery, QueryVariant,
    RequestOrchestrator, WeatherFetcher, project,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn london_body() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1257, "lat": 51.5085 },
        "weather": [
            { "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }
        ],
        "base": "stations",
        "main": {
            "temp": 282.55,
            "feels_like": 281.86,
            "temp_min": 280.37,
            "temp_max": 284.26,
            "pressure": 1023,
            "humidity": 100,
            "sea_level": 1023,
            "grnd_level": 1023
        },
        "visibility": 10000,
        "wind": { "speed": 4.1, "deg": 80 },
        "clouds": { "all": 1 },
        "dt": 1485789600,
        "sys": {
            "type": 1,
            "id": 5091,
            "country": "GB",
            "sunrise": 1485762037,
            "sunset": 1485794875
        },
        "timezone": 0,
        "id": 2643743,
        "name": "London",
        "cod": 200
    })
}

fn create_orchestrator(mock_server: &MockServer) -> RequestOrchestrator {
    let base_url = format!("{}/data/2.5/weather", mock_server.uri());
    let builder = EndpointBuilder::with_base_url(base_url, "TEST_KEY");
    let client = HttpWeatherClient::with_timeout(Duration::from_secs(5))
        .expect("Failed to create client");
    RequestOrchestrator::new(builder, Box::new(client))
}

fn city_name(outcome: &FetchOutcome) -> Option<&str> {
    outcome.model()?.name.as_deref()
}

#[tokio::test]
async fn test_fetch_success_publishes_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London,GB"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let orch = create_orchestrator(&mock_server);
    let query = LocationQuery::city_country("London", "GB");
    let outcome = orch.get_data(QueryVariant::CityAndCountry, query).await;

    let model = outcome.model().expect("expected success");
    let projection = project(model);
    let coordinates = "Latitude: 51.5085 Longitude: -0.1257";
    assert_eq!(projection.get("City"), Some("London"));
    assert_eq!(projection.get("Coordinates"), Some(coordinates));
    assert_eq!(projection.get("Description"), Some("clear sky"));
    assert_eq!(orch.current_variant(), Some(QueryVariant::CityAndCountry));
}

#[tokio::test]
async fn test_city_state_country_query_param() {
    let mock_server = MockServer::start().await;

    let body = serde_json::json!({ "name": "Paris" });

    Mock::given(method("GET"))
        .and(query_param("q", "Paris,IDF,FR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let orch = create_orchestrator(&mock_server);
    let query = LocationQuery::city_state_country("Paris", "IDF", "FR");
    let outcome = orch.get_data(QueryVariant::CityStateAndCountry, query).await;

    assert_eq!(city_name(&outcome), Some("Paris"));
}

#[tokio::test]
async fn test_non_success_status_clears_previous_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
        .mount(&mock_server)
        .await;

    let not_found = serde_json::json!({ "cod": "404", "message": "city not found" });

    Mock::given(method("GET"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found))
        .mount(&mock_server)
        .await;

    let orch = create_orchestrator(&mock_server);

    let london = LocationQuery::city("London");
    let first = orch.get_data(QueryVariant::CityOnly, london).await;
    assert!(first.is_success());

    let atlantis = LocationQuery::city("Atlantis");
    let second = orch.get_data(QueryVariant::CityOnly, atlantis).await;
    assert_eq!(second, FetchOutcome::Failure(ErrorKind::NetworkFailure));

    let current = orch.current_outcome().expect("outcome must be published");
    assert!(current.model().is_none());
    assert_eq!(current.error(), Some(ErrorKind::NetworkFailure));
}

#[tokio::test]
async fn test_invalid_body_is_decode_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let orch = create_orchestrator(&mock_server);
    let query = LocationQuery::city("London");
    let outcome = orch.get_data(QueryVariant::CityOnly, query).await;

    assert_eq!(outcome, FetchOutcome::Failure(ErrorKind::DecodeFailure));
}

#[tokio::test]
async fn test_partial_body_decodes() {
    let mock_server = MockServer::start().await;

    let mut body = london_body();
    if let Some(obj) = body.as_object_mut() {
        obj.remove("wind");
        obj.remove("coord");
    }

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let orch = create_orchestrator(&mock_server);
    let query = LocationQuery::city("London");
    let outcome = orch.get_data(QueryVariant::CityOnly, query).await;

    let model = outcome.model().expect("partial body must decode");
    assert!(model.wind.is_none());
    assert_eq!(model.main.as_ref().and_then(|m| m.temp), Some(282.55));
    assert_eq!(project(model).get("Coordinates"), Some("N/A"));
}

#[tokio::test]
async fn test_invalid_query_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let orch = create_orchestrator(&mock_server);
    let query = LocationQuery::city("London");
    let outcome = orch.get_data(QueryVariant::CityAndCountry, query).await;

    assert_eq!(outcome, FetchOutcome::Failure(ErrorKind::InvalidQuery));
}

#[tokio::test]
async fn test_retry_repeats_same_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("q", "Austin,TX,US"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = serde_json::json!({ "name": "Austin" });

    Mock::given(method("GET"))
        .and(query_param("q", "Austin,TX,US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let orch = create_orchestrator(&mock_server);
    let variant = QueryVariant::CityStateAndCountry;
    let query = LocationQuery::city_state_country("Austin", "TX", "US");

    let first = orch.get_data(variant, query).await;
    assert_eq!(first.error(), Some(ErrorKind::NetworkFailure));

    let retried = orch.retry().await;
    assert_eq!(city_name(&retried), Some("Austin"));
    assert_eq!(orch.current_variant(), Some(variant));
}

#[tokio::test]
async fn test_slow_server_times_out_as_network_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(london_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpWeatherClient::with_timeout(Duration::from_millis(200))
        .expect("Failed to create client");
    let url = EndpointBuilder::with_base_url(mock_server.uri(), "TEST_KEY")
        .build(QueryVariant::CityOnly, &LocationQuery::city("London"))
        .expect("valid query");

    let err = client.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
}
