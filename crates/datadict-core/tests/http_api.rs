//! HTTP client tests against a mock Looker API

use datadict_core::api::{ApiError, HttpLookerApi, LookerApi};
use datadict_core::config::{ApiConfig, DictionaryConfig};
use datadict_core::{load_model_detail, DictionarySession};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> HttpLookerApi {
    let config = ApiConfig {
        base_url: server.uri(),
        access_token: Some("abc".to_string()),
        ..ApiConfig::default()
    };
    HttpLookerApi::new(&config).unwrap()
}

fn models_body() -> serde_json::Value {
    json!([
        {
            "name": "thelook",
            "label": "The Look",
            "project_name": "ecommerce",
            "explores": [
                {"name": "orders", "label": "Orders"},
                {"name": "users", "hidden": true}
            ]
        }
    ])
}

fn explore_body(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "model_name": "thelook",
        "fields": {
            "dimensions": [{"name": format!("{}.id", name), "type": "number"}],
            "measures": [{"name": format!("{}.count", name), "type": "count"}]
        },
        "joins": [{"name": "users", "relationship": "many_to_one", "type": "left_outer"}]
    })
}

#[tokio::test]
async fn test_list_all_models_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/4.0/lookml_models"))
        .and(header("authorization", "token abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_body()))
        .expect(1)
        .mount(&server)
        .await;

    let models = api_for(&server).list_all_models().await.unwrap();

    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "thelook");
    assert_eq!(models[0].explores.len(), 2);
    assert!(models[0].explores[1].hidden);
}

#[tokio::test]
async fn test_get_explore() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/4.0/lookml_models/thelook/explores/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(explore_body("orders")))
        .mount(&server)
        .await;

    let explore = api_for(&server).get_explore("thelook", "orders").await.unwrap();

    assert_eq!(explore.name, "orders");
    assert_eq!(explore.fields.dimensions[0].field_type.as_deref(), Some("number"));
    assert_eq!(explore.fields.len(), 2);
    assert_eq!(explore.joins[0].relationship.as_deref(), Some("many_to_one"));
}

#[tokio::test]
async fn test_missing_model_name_filled_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/4.0/lookml_models/thelook/explores/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "bare"})))
        .mount(&server)
        .await;

    let explore = api_for(&server).get_explore("thelook", "bare").await.unwrap();
    assert_eq!(explore.model_name, "thelook");
    assert!(explore.fields.is_empty());
}

#[tokio::test]
async fn test_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/4.0/lookml_models/thelook/explores/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/4.0/lookml_models/thelook/explores/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database exploded"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/4.0/lookml_models/thelook/explores/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let api = api_for(&server);

    let err = api.get_explore("thelook", "gone").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    match api.get_explore("thelook", "broken").await.unwrap_err() {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database exploded");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = api.get_explore("thelook", "garbled").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
}

#[tokio::test]
async fn test_session_over_http_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/4.0/lookml_models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_body()))
        .expect(1)
        .mount(&server)
        .await;
    for name in ["orders", "users"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/4.0/lookml_models/thelook/explores/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(explore_body(name)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let session = DictionarySession::new(api_for(&server), &DictionaryConfig::default()).unwrap();

    let detail = load_model_detail(&session, "thelook").await.unwrap();
    assert_eq!(detail.explores.len(), 2);
    assert_eq!(detail.relationships().len(), 2);

    let again = load_model_detail(&session, "thelook").await.unwrap();
    assert_eq!(again.field_count(), 4);

    session.explore("thelook", "orders").await.unwrap();
    // MockServer verifies the `expect(1)` counts on drop
}
