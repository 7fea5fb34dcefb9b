use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

const UPLOAD_DIR: &str = "uploads";
const MAX_NAME_LEN: usize = 100;

/// Uploaded files on local disk, addressed by paths relative to `root`.
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write the upload and return its relative path
    /// (`uploads/<uuid>_<name>`). The file only appears under its final
    /// name once fully written.
    pub async fn save_upload(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
        let dir = self.root.join(UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let id = Uuid::new_v4();
        let name = sanitize_file_name(original_name.unwrap_or_default());
        let rel = format!("{UPLOAD_DIR}/{id}_{name}");
        let tmp_path = dir.join(format!("tmp_{id}"));
        let final_path = self.root.join(&rel);

        tokio::fs::write(&tmp_path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e).with_context(|| format!("Failed to move upload to {}", final_path.display()));
        }

        Ok(rel)
    }

    /// Delete a stored file. Already-missing files are not an error.
    pub async fn remove(&self, rel: &str) -> Result<()> {
        let path = self.path_of(rel);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// Last path component of a client-supplied name, reduced to
/// `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    let clean = clean.trim_start_matches('.');
    if clean.is_empty() {
        "upload.csv".to_string()
    } else {
        clean.to_string()
    }
}
