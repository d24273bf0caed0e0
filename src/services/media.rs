use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::core::error::AppResult;

/// Where received photos end up.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persists `bytes` and returns the resulting path.
    async fn store(&self, bytes: &[u8]) -> AppResult<PathBuf>;
}

/// Keeps the last received photo as `<dir>/received_photo.jpg`.
pub struct FileMediaStore {
    dir: PathBuf,
}

impl FileMediaStore {
    pub const FILE_NAME: &'static str = "received_photo.jpg";

    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(Self::FILE_NAME)
    }
}

#[async_trait]
impl MediaStore for FileMediaStore {
    async fn store(&self, bytes: &[u8]) -> AppResult<PathBuf> {
        fs_err::tokio::create_dir_all(&self.dir).await?;
        let path = self.path();
        fs_err::tokio::write(&path, bytes).await?;
        log::info!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn overwrites_single_file() {
        let dir = TempDir::new().unwrap();
        let store = FileMediaStore::new(dir.path().join("img"));

        store.store(b"first").await.unwrap();
        let path = store.store(b"second").await.unwrap();

        assert_eq!(path, dir.path().join("img").join("received_photo.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
