use crate::AppState;
use crate::api::error::{AppError, RequestDiagnostics};
use crate::api::handlers::collect_multipart;
use crate::models::CollectedForm;
use crate::services::intake::{IntakePipeline, select_upload};
use axum::{
    Json,
    extract::{Multipart, OriginalUri, State, multipart::MultipartRejection},
    http::{HeaderMap, Method, StatusCode},
};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

pub const RECEIVED_MESSAGE: &str = "File received successfully";

#[derive(Serialize, ToSchema)]
pub struct TranscribeResponse {
    pub success: bool,
    pub message: String,
    /// Filename exactly as the client sent it
    pub filename: String,
    pub file_size: u64,
    /// Client-declared content type of the file part
    pub content_type: Option<String>,
}

/// Multipart body accepted by `POST /transcribe`
#[derive(ToSchema)]
pub struct TranscribeForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[utoipa::path(
    options,
    path = "/transcribe",
    responses(
        (status = 200, description = "Pre-flight acknowledged, empty body")
    ),
    tag = "transcribe"
)]
pub async fn transcribe_options() -> StatusCode {
    StatusCode::OK
}

#[utoipa::path(
    post,
    path = "/transcribe",
    request_body(content = TranscribeForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File received and inspected", body = TranscribeResponse),
        (status = 400, description = "No usable file part"),
        (status = 413, description = "Body exceeds the upload limit"),
        (status = 500, description = "Storing the file failed")
    ),
    tag = "transcribe"
)]
pub async fn transcribe(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, AppError> {
    let diagnostics = RequestDiagnostics::from_parts(&method, &uri, &headers);

    let mut form = CollectedForm::default();
    match multipart {
        Ok(mut multipart) => collect_multipart(&mut multipart, &mut form).await?,
        // Not multipart at all: carry on with no parts and report the missing file.
        Err(rejection) => debug!("Request body is not multipart: {}", rejection.body_text()),
    }

    let available_fields = form.file_field_names();
    let form_fields = form.form_field_names();

    let Some(upload) = select_upload(form.files, &state.config.upload_field) else {
        return Err(AppError::missing_file(
            "No file was sent",
            available_fields,
            form_fields,
            diagnostics,
        ));
    };

    if upload.filename.is_empty() {
        return Err(AppError::missing_file(
            "No file selected",
            available_fields,
            form_fields,
            diagnostics,
        ));
    }

    let report = IntakePipeline::new(&state.config)
        .run(&upload)
        .await
        .into_result()
        .map_err(|error| AppError::Storage { error, diagnostics })?;

    info!(
        "📥 Received '{}' via field '{}' ({} bytes, {})",
        report.filename,
        report.field,
        report.file_size,
        report.content_type.as_deref().unwrap_or("no content type")
    );

    Ok(Json(TranscribeResponse {
        success: true,
        message: RECEIVED_MESSAGE.to_string(),
        filename: report.filename,
        file_size: report.file_size,
        content_type: report.content_type,
    }))
}
