use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::api::handlers::{full_url, header_str};
use crate::api::middleware::request_id::REQUEST_ID_HEADER;

/// Request metadata attached to error bodies for debugging clients.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestDiagnostics {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub request_id: Option<String>,
}

impl RequestDiagnostics {
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        Self {
            method: method.to_string(),
            url: full_url(headers, uri),
            content_type: header_str(headers, header::CONTENT_TYPE.as_str()).map(str::to_string),
            content_length: header_str(headers, header::CONTENT_LENGTH.as_str())
                .and_then(|v| v.parse().ok()),
            request_id: header_str(headers, REQUEST_ID_HEADER).map(str::to_string),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    MissingFile {
        message: String,
        available_fields: Vec<String>,
        form_fields: Vec<String>,
        diagnostics: RequestDiagnostics,
    },

    #[error("Invalid multipart body: {message}")]
    InvalidMultipart { status: StatusCode, message: String },

    #[error("Error processing file: {error}")]
    Storage {
        error: anyhow::Error,
        diagnostics: RequestDiagnostics,
    },
}

impl AppError {
    pub fn missing_file(
        message: impl Into<String>,
        available_fields: Vec<String>,
        form_fields: Vec<String>,
        diagnostics: RequestDiagnostics,
    ) -> Self {
        AppError::MissingFile {
            message: message.into(),
            available_fields,
            form_fields,
            diagnostics,
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::InvalidMultipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, body) = match self {
            AppError::MissingFile {
                available_fields,
                form_fields,
                diagnostics,
                ..
            } => {
                tracing::warn!(
                    "Rejected upload: {} (file fields: {:?})",
                    message,
                    available_fields
                );
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": message,
                        "available_fields": available_fields,
                        "form_fields": form_fields,
                        "request": diagnostics,
                    }),
                )
            }
            AppError::InvalidMultipart { status, .. } => {
                tracing::warn!("Multipart error: {}", message);
                (status, json!({ "error": message }))
            }
            AppError::Storage { error, diagnostics } => {
                tracing::error!("Storage failure: {:#}", error);
                let trace: Vec<String> = error.chain().map(|cause| cause.to_string()).collect();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": message,
                        "trace": trace,
                        "request": diagnostics,
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
