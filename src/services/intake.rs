use crate::config::ServerConfig;
use crate::models::{FilePart, IntakeReport, Outcome};
use crate::utils::validation::sanitize_filename;
use anyhow::Context;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const TEMP_DIR_PREFIX: &str = "intake-";

/// Picks the file part to process.
///
/// The first part named `canonical` wins. Without one, the part whose field
/// name sorts lowest is used, earliest first among equal names.
pub fn select_upload(mut files: Vec<FilePart>, canonical: &str) -> Option<FilePart> {
    let index = files
        .iter()
        .position(|f| f.field == canonical)
        .or_else(|| {
            files
                .iter()
                .enumerate()
                .min_by(|(ia, a), (ib, b)| a.field.cmp(&b.field).then(ia.cmp(ib)))
                .map(|(i, _)| i)
        })?;

    let selected = files.swap_remove(index);
    if selected.field != canonical {
        info!(
            "No '{}' field, falling back to file field '{}'",
            canonical, selected.field
        );
    }
    Some(selected)
}

/// Stages one upload in a request-scoped temp directory, inspects it, and
/// removes it again.
#[derive(Debug, Clone)]
pub struct IntakePipeline {
    temp_root: Option<PathBuf>,
}

impl IntakePipeline {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            temp_root: config.temp_root.clone(),
        }
    }

    pub fn with_temp_root(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: Some(temp_root.into()),
        }
    }

    /// Runs the upload through storage. The temp directory never outlives
    /// this call; cleanup failures are logged and do not change the result.
    pub async fn run(&self, upload: &FilePart) -> Outcome<IntakeReport, anyhow::Error> {
        let dir = match self.create_request_dir() {
            Ok(dir) => dir,
            Err(e) => {
                return Outcome::Fatal(
                    anyhow::Error::new(e).context("Failed to create temporary directory"),
                );
            }
        };

        self.process(dir, upload).await
    }

    /// Stages `upload` inside `dir`, then releases `dir` whatever happened.
    async fn process(&self, dir: TempDir, upload: &FilePart) -> Outcome<IntakeReport, anyhow::Error> {
        let path = dir.path().join(sanitize_filename(&upload.filename));
        let staged = self.stage(&path, upload).await;

        if let Outcome::NonFatal(e) = release(dir, &path).await {
            warn!("Failed to remove temporary upload {}: {}", path.display(), e);
        }

        match staged {
            Ok(report) => Outcome::Success(report),
            Err(e) => Outcome::Fatal(e),
        }
    }

    async fn stage(&self, path: &Path, upload: &FilePart) -> anyhow::Result<IntakeReport> {
        tokio::fs::write(path, &upload.data)
            .await
            .with_context(|| format!("Failed to save upload to {}", path.display()))?;

        debug!("Staged '{}' at {}", upload.filename, path.display());

        self.inspect(path, upload).await
    }

    /// Reads back what was stored. Transcription of `path` belongs here once
    /// a model is wired in.
    async fn inspect(&self, path: &Path, upload: &FilePart) -> anyhow::Result<IntakeReport> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

        Ok(IntakeReport {
            field: upload.field.clone(),
            filename: upload.filename.clone(),
            content_type: upload.content_type.clone(),
            file_size: metadata.len(),
        })
    }

    fn create_request_dir(&self) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}

/// Removes the staged file and its directory.
async fn release(dir: TempDir, path: &Path) -> Outcome<(), io::Error> {
    let file = tokio::fs::remove_file(path).await;
    let dir_path = dir.path().to_path_buf();

    match (file, dir.close()) {
        (_, Err(e)) => Outcome::NonFatal(e),
        (Err(e), Ok(())) if e.kind() != io::ErrorKind::NotFound => {
            debug!("Removing {} failed ({}), directory removal covered it", path.display(), e);
            Outcome::Success(())
        }
        _ => {
            debug!("Removed temporary directory {}", dir_path.display());
            Outcome::Success(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn part(field: &str, filename: &str, data: &'static [u8]) -> FilePart {
        FilePart {
            field: field.to_string(),
            filename: filename.to_string(),
            content_type: Some("audio/wav".to_string()),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn test_select_prefers_canonical_field() {
        let files = vec![
            part("audio", "a.wav", b""),
            part("file", "first.wav", b""),
            part("file", "second.wav", b""),
        ];
        let selected = select_upload(files, "file").unwrap();
        assert_eq!(selected.filename, "first.wav");
    }

    #[test]
    fn test_select_falls_back_lexicographically() {
        let files = vec![
            part("voice", "v.wav", b""),
            part("audio", "a1.wav", b""),
            part("recording", "r.wav", b""),
            part("audio", "a2.wav", b""),
        ];
        let selected = select_upload(files, "file").unwrap();
        assert_eq!(selected.field, "audio");
        assert_eq!(selected.filename, "a1.wav");
    }

    #[test]
    fn test_select_nothing() {
        assert!(select_upload(vec![], "file").is_none());
    }

    #[tokio::test]
    async fn test_run_reports_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let pipeline = IntakePipeline::with_temp_root(root.path());

        let upload = part("file", "../../clip.wav", b"RIFF....WAVE");
        let report = pipeline.run(&upload).await.into_result().unwrap();

        assert_eq!(report.filename, "../../clip.wav");
        assert_eq!(report.file_size, 12);
        assert_eq!(report.content_type.as_deref(), Some("audio/wav"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_run_fails_without_temp_root() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");
        let pipeline = IntakePipeline::with_temp_root(&missing);

        let outcome = pipeline.run(&part("file", "clip.wav", b"abc")).await;
        assert!(outcome.is_fatal());
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn test_failed_write_still_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let pipeline = IntakePipeline::with_temp_root(root.path());

        let dir = pipeline.create_request_dir().unwrap();
        // A directory where the file should go makes the write fail.
        std::fs::create_dir(dir.path().join("clip.wav")).unwrap();

        let outcome = pipeline.process(dir, &part("file", "clip.wav", b"abc")).await;
        assert!(outcome.is_fatal());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_release_reports_dir_removal_failure() {
        let root = tempfile::tempdir().unwrap();
        let dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(root.path())
            .unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::remove_dir_all(dir.path()).unwrap();

        let outcome = release(dir, &path).await;
        assert!(matches!(outcome, Outcome::NonFatal(_)));
    }

    #[tokio::test]
    async fn test_release_removes_file_and_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(root.path())
            .unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"abc").unwrap();

        let outcome = release(dir, &path).await;
        assert!(matches!(outcome, Outcome::Success(())));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
