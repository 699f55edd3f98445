//! Write-once storage for generated documents.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct DocumentStore {
    output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub filename: String,
    pub path: PathBuf,
}

impl DocumentStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `bytes` under a fresh name. Never overwrites an existing file;
    /// a failed write leaves no partial document behind.
    pub async fn save(&self, bytes: &[u8]) -> Result<StoredDocument, AppError> {
        fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let filename = document_filename(Local::now().naive_local());
        let path = self.output_dir.join(&filename);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("creating {}", path.display()))?;

        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&path).await;
            return Err(anyhow::Error::from(e)
                .context(format!("writing {}", path.display()))
                .into());
        }

        info!(filename = %filename, bytes = bytes.len(), "Document saved");
        Ok(StoredDocument { filename, path })
    }

    /// Reads a previously saved document by its bare filename.
    pub async fn open(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        check_filename(filename)?;
        match fs::read(self.output_dir.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("document '{filename}'")))
            }
            Err(e) => Err(anyhow::Error::from(e)
                .context(format!("reading {filename}"))
                .into()),
        }
    }
}

/// `LOI_<YYYYmmdd_HHMMSS>_<8 hex>.docx`
pub fn document_filename(now: NaiveDateTime) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("LOI_{}_{}.docx", now.format("%Y%m%d_%H%M%S"), &id[..8])
}

fn check_filename(filename: &str) -> Result<(), AppError> {
    let allowed = filename
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if filename.is_empty() || !allowed || filename.starts_with('.') || filename.contains("..") {
        return Err(AppError::Input(format!("invalid document name '{filename}'")));
    }
    if !filename.ends_with(".docx") {
        return Err(AppError::Input("only .docx documents can be downloaded".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_filename_shape() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 4)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        let name = document_filename(now);
        assert!(name.starts_with("LOI_20260304_090507_"), "{name}");
        assert!(name.ends_with(".docx"));
        assert_eq!(name.len(), "LOI_20260304_090507_".len() + 8 + ".docx".len());
        assert!(check_filename(&name).is_ok());
    }

    #[test]
    fn test_filenames_are_unique() {
        let now = Local::now().naive_local();
        assert_ne!(document_filename(now), document_filename(now));
    }

    #[test]
    fn test_unsafe_names_rejected() {
        for name in ["", "../secret.docx", "a/b.docx", "..docx", ".hidden.docx", "LOI.txt", "a b.docx"] {
            assert!(
                matches!(check_filename(name), Err(AppError::Input(_))),
                "{name:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_save_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("generated"));

        let stored = store.save(b"docx bytes").await.unwrap();
        assert!(stored.path.exists());
        assert_eq!(store.open(&stored.filename).await.unwrap(), b"docx bytes");
    }

    #[tokio::test]
    async fn test_concurrent_saves_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let (a, b) = tokio::join!(store.save(b"a"), store.save(b"b"));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.filename, b.filename);
        assert_eq!(store.open(&a.filename).await.unwrap(), b"a");
        assert_eq!(store.open(&b.filename).await.unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_open_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        let err = store
            .open("LOI_20260101_000000_deadbeef.docx")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
