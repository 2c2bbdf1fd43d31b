use super::assistant_settings::AssistantSettings;
use crate::repositories::{BoxFuture, RepositoryResult};

pub trait SettingsRepository: Send + Sync + 'static {
    /// Load assistant settings from storage
    fn load(&self) -> BoxFuture<'static, RepositoryResult<AssistantSettings>>;

    /// Save assistant settings to storage
    fn save(&self, settings: AssistantSettings) -> BoxFuture<'static, RepositoryResult<()>>;
}
