//! Blob storage for generated and uploaded documents.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("invalid storage name: {0}")]
    InvalidName(String),
    #[error("storage I/O error for {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ObjectStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), StorageError>;
    async fn read_file(&self, filename: &str) -> Result<Vec<u8>, StorageError>;
    async fn delete_file(&self, filename: &str) -> Result<(), StorageError>;
}

/// Stores blobs as flat files under a root directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::Io {
                name: root.display().to_string(),
                source,
            })?;
        log::info!("Local storage ready at {}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        if filename.is_empty() || sanitize_filename::sanitize(filename) != filename {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }
}

fn io_error(filename: &str, source: std::io::Error) -> StorageError {
    if source.kind() == ErrorKind::NotFound {
        StorageError::NotFound(filename.to_string())
    } else {
        StorageError::Io {
            name: filename.to_string(),
            source,
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(filename)?;
        tokio::fs::write(&path, file_data)
            .await
            .map_err(|e| io_error(filename, e))?;
        log::debug!("Stored {} ({} bytes)", filename, file_data.len());
        Ok(())
    }

    async fn read_file(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(filename)?;
        tokio::fs::read(&path).await.map_err(|e| io_error(filename, e))
    }

    async fn delete_file(&self, filename: &str) -> Result<(), StorageError> {
        let path = self.path_for(filename)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| io_error(filename, e))
    }
}
