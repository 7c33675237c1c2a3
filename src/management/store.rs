use std::{fmt, io::Error, path::PathBuf};

use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug)]
pub enum StoreError {
    IoError(Error),
    SerdeError(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::IoError(e) => write!(f, "token file I/O failed: {e}"),
            StoreError::SerdeError(e) => write!(f, "token file is not valid JSON: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerdeError(err)
    }
}

/// Single-record JSON file. Every write replaces the whole record.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `Ok(None)` when nothing has been stored yet.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::IoError(e)),
        };
        let record = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    pub async fn persist<T: Serialize>(&self, record: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(record)?;

        // Concurrent writers each get their own staging file; the rename makes
        // the last one win without ever exposing a half-written record.
        let staging = self
            .path
            .with_extension(format!("{}.tmp", crate::utils::random_file_stem()));
        async_fs::write(&staging, json).await?;
        if let Err(e) = async_fs::rename(&staging, &self.path).await {
            let _ = async_fs::remove_file(&staging).await;
            return Err(StoreError::IoError(e));
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::IoError(e)),
        }
    }
}
