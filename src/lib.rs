pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers::{echo, health, transcribe};
use crate::api::middleware::request_id::{REQUEST_ID_HEADER, request_id_middleware};
use crate::config::ServerConfig;
use crate::services::model::SpeechModel;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method, Response, header},
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, info_span};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        transcribe::transcribe,
        transcribe::transcribe_options,
        health::status,
        echo::echo,
    ),
    components(
        schemas(
            transcribe::TranscribeResponse,
            transcribe::TranscribeForm,
            health::StatusResponse,
            echo::EchoResponse,
            echo::FileInfo,
            services::model::Transcript,
            services::model::Segment,
        )
    ),
    tags(
        (name = "transcribe", description = "Audio upload intake"),
        (name = "debug", description = "Request introspection endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub model: Arc<dyn SpeechModel>,
}

impl AppState {
    pub fn new(config: ServerConfig, model: Arc<dyn SpeechModel>) -> Self {
        Self {
            config: Arc::new(config),
            model,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_size;

    // Preflights to any route are answered by the CORS layer; the header
    // layers below stamp the same policy onto every other response.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::OPTIONS, Method::GET]);

    // Layers run outermost-last: the request id is assigned before the trace
    // span opens and is echoed on preflights too.
    Router::new()
        .route(
            "/transcribe",
            post(transcribe::transcribe).options(transcribe::transcribe_options),
        )
        .route("/test", get(health::status))
        .route("/echo", post(echo::echo))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_request(|request: &Request, _span: &Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(|response: &Response<_>, latency: Duration, _span: &Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS, GET"),
        ))
        .with_state(state)
}

fn request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
