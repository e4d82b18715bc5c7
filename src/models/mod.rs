use bytes::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of a step whose failure may or may not end the request.
#[derive(Debug)]
pub enum Outcome<T, E> {
    Success(T),
    /// Failed, but the request carries on.
    NonFatal(E),
    /// Failed, and the request must report it.
    Fatal(E),
}

impl<T, E> Outcome<T, E> {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Success(value) => Ok(value),
            Self::NonFatal(err) | Self::Fatal(err) => Err(err),
        }
    }
}

/// A multipart part that declared a filename, buffered in memory.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    /// As sent by the client; may be empty.
    pub filename: String,
    /// Client-declared and untrusted.
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Everything read out of a multipart body, in arrival order.
#[derive(Debug, Default)]
pub struct CollectedForm {
    pub files: Vec<FilePart>,
    pub fields: Vec<(String, String)>,
}

impl CollectedForm {
    /// Distinct file field names, sorted.
    pub fn file_field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.iter().map(|f| f.field.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn form_field_names(&self) -> Vec<String> {
        self.text_fields().into_keys().collect()
    }

    /// Text fields keyed by name; the last value wins on duplicates.
    pub fn text_fields(&self) -> BTreeMap<String, String> {
        self.fields.iter().cloned().collect()
    }
}

/// What the intake pipeline learned about a stored upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeReport {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub file_size: u64,
}
