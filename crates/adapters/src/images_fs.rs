//! Filesystem image store

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tweetbot_domain::{ImageFormat, ImageStore, ImageStoreError};
use uuid::Uuid;

/// Stores generated images as `<uuid>.<ext>` files in one directory
#[derive(Debug, Clone)]
pub struct FsImageStore {
    dir: PathBuf,
}

impl FsImageStore {
    /// Create the store, creating the directory if needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, ImageStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn map_io(path: &str, e: std::io::Error) -> ImageStoreError {
    if e.kind() == ErrorKind::NotFound {
        ImageStoreError::NotFound(path.to_string())
    } else {
        ImageStoreError::Io(e)
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, bytes: &[u8]) -> Result<String, ImageStoreError> {
        let format = ImageFormat::sniff(bytes);
        let file_name = format!("{}.{}", Uuid::new_v4(), format.extension());
        let path = self.dir.join(file_name);

        fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Saved image");

        Ok(path.to_string_lossy().into_owned())
    }

    async fn exists(&self, path: &str) -> bool {
        fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, ImageStoreError> {
        fs::read(path).await.map_err(|e| map_io(path, e))
    }

    async fn remove(&self, path: &str) -> Result<(), ImageStoreError> {
        fs::remove_file(path).await.map_err(|e| map_io(path, e))
    }
}
