use std::path::{Path, PathBuf};

use super::assistant_settings::AssistantSettings;
use super::settings_repository::SettingsRepository;
use crate::repositories::{BoxFuture, RepositoryError, RepositoryResult};

pub struct SettingsJsonRepository {
    file_path: PathBuf,
}

impl SettingsJsonRepository {
    /// Create repository with XDG-compliant path
    pub fn new() -> RepositoryResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepositoryError::InitializationError {
            message: "Cannot determine config directory".to_string(),
        })?;

        let app_dir = config_dir.join("ecochat");
        let file_path = app_dir.join("settings.json");

        Ok(Self { file_path })
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

impl SettingsRepository for SettingsJsonRepository {
    fn load(&self) -> BoxFuture<'static, RepositoryResult<AssistantSettings>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(AssistantSettings::default());
            }

            let contents = tokio::fs::read_to_string(&path).await?;
            let settings: AssistantSettings = serde_json::from_str(&contents)?;

            Ok(settings)
        })
    }

    fn save(&self, settings: AssistantSettings) -> BoxFuture<'static, RepositoryResult<()>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            let json = serde_json::to_string_pretty(&settings)?;

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
