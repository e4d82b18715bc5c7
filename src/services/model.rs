//! Speech-to-text model handle.
//!
//! The model is loaded once at startup and shared through `AppState`. Handlers
//! depend on the [`SpeechModel`] trait only, so tests can swap in a fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

/// Pretrained model variants, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiny" => Ok(Self::Tiny),
            "base" => Ok(Self::Base),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(ModelError::UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown model variant: {0}")]
    UnknownVariant(String),

    #[error("No inference engine linked for model '{0}'")]
    NotLinked(String),
}

/// Time-stamped piece of recognized speech. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
}

#[async_trait]
pub trait SpeechModel: Send + Sync {
    fn name(&self) -> &str;

    /// Transcribe the audio file stored at `path`.
    async fn transcribe(&self, path: &Path) -> Result<Transcript, ModelError>;
}

/// Model handle with no inference engine behind it.
///
/// Keeps the selected variant so startup logs and future wiring know what was
/// requested. Every transcription attempt fails with [`ModelError::NotLinked`].
pub struct DetachedModel {
    size: ModelSize,
}

impl DetachedModel {
    pub fn new(size: ModelSize) -> Self {
        Self { size }
    }
}

#[async_trait]
impl SpeechModel for DetachedModel {
    fn name(&self) -> &str {
        self.size.as_str()
    }

    async fn transcribe(&self, path: &Path) -> Result<Transcript, ModelError> {
        tracing::debug!("Refusing to transcribe {}: no engine linked", path.display());
        Err(ModelError::NotLinked(self.size.to_string()))
    }
}

pub fn load_model(size: ModelSize) -> Arc<dyn SpeechModel> {
    tracing::info!("Loading speech model '{}'", size);
    Arc::new(DetachedModel::new(size))
}
