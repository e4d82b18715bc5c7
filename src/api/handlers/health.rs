use axum::{Json, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

pub const STATUS_MESSAGE: &str = "Transcription service is up and accepting uploads";

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/test",
    responses(
        (status = 200, description = "Service is operational", body = StatusResponse)
    ),
    tag = "debug"
)]
pub async fn status() -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: STATUS_MESSAGE.to_string(),
    })
}
