use crate::AppState;
use crate::api::handlers::{collect_multipart, full_url, header_str};
use crate::models::{CollectedForm, Outcome};
use axum::{
    Json,
    body::{self, Body},
    extract::{FromRequest, Multipart, Request, State},
    http::{HeaderMap, header},
};
use mime::Mime;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use utoipa::ToSchema;

pub const ECHO_MESSAGE: &str = "Echo of the received request";

#[derive(Debug, Serialize, ToSchema)]
pub struct FileInfo {
    pub filename: String,
    pub content_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EchoResponse {
    pub message: String,
    /// Text form fields; the last value wins on duplicate keys
    pub received_data: BTreeMap<String, String>,
    /// File parts by field name; the first part wins on duplicate names
    pub received_files: BTreeMap<String, FileInfo>,
    pub content_type: Option<String>,
    pub method: String,
    pub url: String,
    pub args: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    /// Present when the body parsed as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub received_json: Option<Value>,
}

#[utoipa::path(
    post,
    path = "/echo",
    responses(
        (status = 200, description = "Reflection of the request", body = EchoResponse)
    ),
    tag = "debug"
)]
pub async fn echo(State(state): State<AppState>, request: Request) -> Json<EchoResponse> {
    let method = request.method().to_string();
    let url = full_url(request.headers(), request.uri());
    let args = query_args(request.uri().query());
    let headers = header_map(request.headers());
    let content_type = header_str(request.headers(), header::CONTENT_TYPE.as_str())
        .map(str::to_string);
    let parsed = content_type.as_deref().and_then(|ct| ct.parse::<Mime>().ok());

    let mut form = CollectedForm::default();
    let mut received_json = None;
    let limit = state.config.max_upload_size;

    let outcome = match parsed {
        Some(m) if m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA => {
            read_multipart(request, &state, &mut form).await
        }
        Some(m) if m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() => {
            read_urlencoded(request.into_body(), limit, &mut form).await
        }
        Some(m) if m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON) => {
            match read_json(request.into_body(), limit).await {
                Outcome::Success(value) => {
                    received_json = Some(value);
                    Outcome::Success(())
                }
                Outcome::NonFatal(e) => Outcome::NonFatal(e),
                Outcome::Fatal(e) => Outcome::Fatal(e),
            }
        }
        _ => Outcome::Success(()),
    };

    if let Outcome::NonFatal(reason) | Outcome::Fatal(reason) = outcome {
        debug!("Echo body only partially read: {}", reason);
    }

    let received_files = file_infos(&form);

    Json(EchoResponse {
        message: ECHO_MESSAGE.to_string(),
        received_data: form.text_fields(),
        received_files,
        content_type,
        method,
        url,
        args,
        headers,
        received_json,
    })
}

async fn read_multipart(
    request: Request,
    state: &AppState,
    form: &mut CollectedForm,
) -> Outcome<(), String> {
    let mut multipart = match Multipart::from_request(request, state).await {
        Ok(multipart) => multipart,
        Err(rejection) => return Outcome::NonFatal(rejection.body_text()),
    };

    match collect_multipart(&mut multipart, form).await {
        Ok(()) => Outcome::Success(()),
        Err(e) => Outcome::NonFatal(e.body_text()),
    }
}

async fn read_urlencoded(body: Body, limit: usize, form: &mut CollectedForm) -> Outcome<(), String> {
    let bytes = match body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => return Outcome::NonFatal(e.to_string()),
    };

    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes) {
        Ok(pairs) => {
            form.fields.extend(pairs);
            Outcome::Success(())
        }
        Err(e) => Outcome::NonFatal(e.to_string()),
    }
}

async fn read_json(body: Body, limit: usize) -> Outcome<Value, String> {
    let bytes = match body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => return Outcome::NonFatal(e.to_string()),
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Outcome::Success(value),
        Err(e) => Outcome::NonFatal(e.to_string()),
    }
}

/// Same rule as `/transcribe` uses for its canonical field: the first part
/// sent under a name is the one that counts.
fn file_infos(form: &CollectedForm) -> BTreeMap<String, FileInfo> {
    let mut files = BTreeMap::new();
    for part in &form.files {
        files.entry(part.field.clone()).or_insert_with(|| FileInfo {
            filename: part.filename.clone(),
            content_type: part.content_type.clone(),
        });
    }
    files
}

fn query_args(query: Option<&str>) -> BTreeMap<String, String> {
    let Some(query) = query else {
        return BTreeMap::new();
    };

    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_else(|e| {
            debug!("Ignoring malformed query string {:?}: {}", query, e);
            BTreeMap::new()
        })
}

/// Flattens headers to one string per name; repeated headers are joined
/// with ", ".
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}
