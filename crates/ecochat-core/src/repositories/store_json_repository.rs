use std::path::{Path, PathBuf};

use super::error::{RepositoryError, RepositoryResult};
use super::store_repository::{BoxFuture, StoreRepository};
use crate::models::Store;

pub const STORE_FILE_NAME: &str = "chat_threads.json";

/// JSON file-based repository for the thread store
/// Keeps the whole snapshot in ~/.config/ecochat/chat_threads.json
pub struct StoreJsonRepository {
    file_path: PathBuf,
}

impl StoreJsonRepository {
    /// Create repository with XDG-compliant path
    pub fn new() -> RepositoryResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepositoryError::InitializationError {
            message: "Could not determine config directory".to_string(),
        })?;

        Ok(Self {
            file_path: config_dir.join("ecochat").join(STORE_FILE_NAME),
        })
    }

    /// Create repository with custom path
    pub fn with_path(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl StoreRepository for StoreJsonRepository {
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Option<Store>>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            // First run: nothing persisted yet
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(None);
            }

            let contents = tokio::fs::read_to_string(&path).await?;
            let store: Store = serde_json::from_str(&contents)?;

            Ok(Some(store))
        })
    }

    fn save(&self, store: &Store) -> BoxFuture<'static, RepositoryResult<()>> {
        let path = self.file_path.clone();
        let json = serde_json::to_string_pretty(store);

        Box::pin(async move {
            let json = json?;

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            // Write atomically using temp file + rename
            let temp_path = path.with_extension(format!("json.{}.tmp", std::process::id()));
            tokio::fs::write(&temp_path, &json).await?;
            tokio::fs::rename(&temp_path, &path).await?;

            Ok(())
        })
    }
}
