pub mod echo;
pub mod health;
pub mod transcribe;

use crate::models::{CollectedForm, FilePart};
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::{HeaderMap, Uri, header};

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Absolute URL of the request, rebuilt from the `Host` header when the
/// request line only carried a path.
pub fn full_url(headers: &HeaderMap, uri: &Uri) -> String {
    if uri.authority().is_some() {
        return uri.to_string();
    }

    let host = header_str(headers, header::HOST.as_str()).unwrap_or("localhost");
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("http://{}{}", host, path)
}

/// Reads every part of a multipart body into `form`.
///
/// Parts with a `filename` parameter (even an empty one) are files; the rest
/// are text fields. On error, `form` keeps whatever was read before it.
pub async fn collect_multipart(
    multipart: &mut Multipart,
    form: &mut CollectedForm,
) -> Result<(), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                form.files.push(FilePart {
                    field: name,
                    filename,
                    content_type,
                    data,
                });
            }
            None => {
                let value = field.text().await?;
                form.fields.push((name, value));
            }
        }
    }

    Ok(())
}
