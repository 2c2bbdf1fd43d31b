pub mod assistant_settings;
pub mod settings_json_repository;
pub mod settings_repository;

pub use assistant_settings::AssistantSettings;
pub use settings_json_repository::SettingsJsonRepository;
pub use settings_repository::SettingsRepository;
