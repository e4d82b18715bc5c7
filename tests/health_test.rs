use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use speech_intake::config::ServerConfig;
use speech_intake::services::model::{ModelSize, load_model};
use speech_intake::{AppState, create_app};
use tower::ServiceExt;

fn app() -> axum::Router {
    create_app(AppState::new(
        ServerConfig::development(),
        load_model(ModelSize::Base),
    ))
}

fn assert_cors_headers(headers: &axum::http::HeaderMap) {
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS, GET");
}

#[tokio::test]
async fn test_status_is_stable() {
    let app = app();
    let mut bodies = Vec::new();

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors_headers(response.headers());
        assert!(response.headers().contains_key("x-request-id"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        bodies.push(serde_json::from_slice::<Value>(&body).unwrap());
    }

    assert_eq!(bodies[0]["status"], "ok");
    assert!(bodies[0]["message"].is_string());
    assert!(bodies.iter().all(|b| *b == bodies[0]));
}

#[tokio::test]
async fn test_options_transcribe_is_empty() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/transcribe")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(response.headers());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_preflight_is_answered() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/echo")
                .header("Origin", "https://recorder.example.com")
                .header("Access-Control-Request-Method", "POST")
                .header("Access-Control-Request-Headers", "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(response.headers());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/test")
                .header("x-request-id", "trace-me-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn test_generated_request_id_is_seen_by_inner_layers() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let request_id = response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(!request_id.is_empty());

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["headers"]["x-request-id"], request_id.as_str());
}

#[tokio::test]
async fn test_error_responses_carry_cors_headers() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors_headers(response.headers());
}

#[tokio::test]
async fn test_openapi_document() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"]["/transcribe"]["post"].is_object());
    assert!(doc["paths"]["/echo"]["post"].is_object());
    assert_eq!(doc["paths"]["/test"]["get"]["tags"], json!(["debug"]));
}
