use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPLETION_URL: &str = "https://api.fireworks.ai/inference/v1/chat/completions";
pub const DEFAULT_COMPLETION_MODEL: &str = "accounts/fireworks/models/llama4-maverick-instruct-basic";
pub const DEFAULT_IMAGE_URL: &str = "https://api.fireworks.ai/inference/v1/workflows/accounts/fireworks/models/flux-1-schnell-fp8/text_to_image";

/// Environment variables consulted after the settings file, first match wins.
const API_KEY_VARS: [&str; 2] = ["ECOCHAT_API_KEY", "FIREWORKS_API_KEY"];
const COMPLETION_URL_VAR: &str = "ECOCHAT_COMPLETION_URL";
const MODEL_VAR: &str = "ECOCHAT_MODEL";
const IMAGE_URL_VAR: &str = "ECOCHAT_IMAGE_URL";

fn default_completion_url() -> String {
    DEFAULT_COMPLETION_URL.to_string()
}

fn default_completion_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

fn default_image_url() -> String {
    DEFAULT_IMAGE_URL.to_string()
}

/// Endpoints and credential for the completion and image collaborators.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_completion_url")]
    pub completion_url: String,
    #[serde(default = "default_completion_model")]
    pub completion_model: String,
    #[serde(default = "default_image_url")]
    pub image_url: String,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            completion_url: default_completion_url(),
            completion_model: default_completion_model(),
            image_url: default_image_url(),
        }
    }
}

impl std::fmt::Debug for AssistantSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("completion_url", &self.completion_url)
            .field("completion_model", &self.completion_model)
            .field("image_url", &self.image_url)
            .finish()
    }
}

impl AssistantSettings {
    /// Overlay values from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`; blank values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = API_KEY_VARS.into_iter().find_map(|name| get(name)) {
            self.api_key = Some(key);
        }
        if let Some(url) = get(COMPLETION_URL_VAR) {
            self.completion_url = url;
        }
        if let Some(model) = get(MODEL_VAR) {
            self.completion_model = model;
        }
        if let Some(url) = get(IMAGE_URL_VAR) {
            self.image_url = url;
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: AssistantSettings = serde_json::from_str(r#"{"api_key":"k"}"#).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(settings.completion_url, DEFAULT_COMPLETION_URL);
        assert_eq!(settings.completion_model, DEFAULT_COMPLETION_MODEL);
        assert_eq!(settings.image_url, DEFAULT_IMAGE_URL);
    }

    #[test]
    fn test_primary_key_var_wins_over_fallback() {
        let settings = AssistantSettings::default().with_overrides(env(&[
            ("ECOCHAT_API_KEY", "primary"),
            ("FIREWORKS_API_KEY", "fallback"),
        ]));
        assert_eq!(settings.api_key.as_deref(), Some("primary"));

        let settings =
            AssistantSettings::default().with_overrides(env(&[("FIREWORKS_API_KEY", "fallback")]));
        assert_eq!(settings.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let base = AssistantSettings {
            api_key: Some("from-file".into()),
            ..AssistantSettings::default()
        };
        let settings = base.with_overrides(env(&[("ECOCHAT_API_KEY", "  "), ("ECOCHAT_MODEL", "")]));

        assert_eq!(settings.api_key.as_deref(), Some("from-file"));
        assert_eq!(settings.completion_model, DEFAULT_COMPLETION_MODEL);
    }

    #[test]
    fn test_endpoint_overrides() {
        let settings = AssistantSettings::default().with_overrides(env(&[
            ("ECOCHAT_COMPLETION_URL", "http://localhost:9000/chat"),
            ("ECOCHAT_MODEL", "local-model"),
            ("ECOCHAT_IMAGE_URL", "http://localhost:9000/image"),
        ]));

        assert_eq!(settings.completion_url, "http://localhost:9000/chat");
        assert_eq!(settings.completion_model, "local-model");
        assert_eq!(settings.image_url, "http://localhost:9000/image");
        assert!(!settings.has_api_key());
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = AssistantSettings {
            api_key: Some("secret-value".into()),
            ..AssistantSettings::default()
        };
        assert!(!format!("{settings:?}").contains("secret-value"));
    }
}
