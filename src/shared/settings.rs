use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tokio::fs;
use ts_rs::TS;

use super::emit::EventBus;
use super::errors::SettingsError;
use super::events::PipelineEvent;
use super::types::TargetLanguage;

const KEYRING_SERVICE: &str = "message-translator";
const KEYRING_ACCOUNT: &str = "summarizer_api_key";

pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "settings.ts")]
pub struct PipelineSettings {
    pub provider: ProviderSettings,
    pub preferences: PipelinePreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "settings.ts")]
pub struct ProviderSettings {
    pub translate_endpoint: String,
    /// No endpoint means the environment has no summarizer
    pub summarize_endpoint: Option<String>,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "settings.ts")]
pub struct PipelinePreferences {
    pub default_target_lang: TargetLanguage,
    /// Only messages detected in this language are offered a summary
    pub summarizable_language: String,
    /// Summaries are offered strictly above this many characters
    pub summary_min_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            preferences: PipelinePreferences::default(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            summarize_endpoint: None,
            user_agent: "message-translator/pipeline".to_string(),
        }
    }
}

impl Default for PipelinePreferences {
    fn default() -> Self {
        Self {
            default_target_lang: TargetLanguage::English,
            summarizable_language: "en".to_string(),
            summary_min_chars: 150,
        }
    }
}

impl PipelineSettings {
    pub fn get_settings_path() -> Result<PathBuf, SettingsError> {
        ProjectDirs::from("com", "message-translator", "message-translator")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Load settings from the platform config dir, writing defaults on first run
    pub async fn load() -> Result<Self, SettingsError> {
        let path = Self::get_settings_path()?;
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !fs::try_exists(path).await? {
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Save settings to disk and emit update event
    pub async fn save(&self, events: &EventBus) -> Result<(), SettingsError> {
        let path = Self::get_settings_path()?;
        self.save_and_notify(&path, events).await
    }

    pub async fn save_and_notify(&self, path: &Path, events: &EventBus) -> Result<(), SettingsError> {
        self.save_to(path).await?;
        tracing::debug!(path = %path.display(), "settings saved");
        events.emit(PipelineEvent::SettingsUpdated(self.clone()));
        Ok(())
    }

    /// Apply `TRANSLATOR_ENDPOINT` / `SUMMARIZER_ENDPOINT` overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(endpoint) = non_blank_env("TRANSLATOR_ENDPOINT") {
            self.provider.translate_endpoint = endpoint;
        }
        if let Some(endpoint) = non_blank_env("SUMMARIZER_ENDPOINT") {
            self.provider.summarize_endpoint = Some(endpoint);
        }
        self
    }

    /// Summarizer key: `SUMMARIZER_API_KEY` first, then the OS keyring
    pub fn summarizer_api_key() -> Option<String> {
        if let Some(key) = non_blank_env("SUMMARIZER_API_KEY") {
            return Some(key);
        }

        let entry = match Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "keyring unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(key) if !key.trim().is_empty() => Some(key),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "no summarizer key in keyring");
                None
            }
        }
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("message-translator-{}", uuid::Uuid::new_v4()))
            .join("settings.json")
    }

    #[tokio::test]
    async fn test_load_writes_defaults_when_missing() {
        let path = scratch_path();

        let settings = PipelineSettings::load_from(&path).await.unwrap();
        assert_eq!(settings, PipelineSettings::default());
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let path = scratch_path();
        let mut settings = PipelineSettings::default();
        settings.preferences.default_target_lang = TargetLanguage::French;
        settings.preferences.summary_min_chars = 300;
        settings.provider.summarize_endpoint = Some("http://localhost:9000/summarize".to_string());

        settings.save_to(&path).await.unwrap();
        let loaded = PipelineSettings::load_from(&path).await.unwrap();
        assert_eq!(loaded, settings);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_save_emits_settings_updated() {
        let path = scratch_path();
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let mut settings = PipelineSettings::default();
        settings.preferences.default_target_lang = TargetLanguage::Turkish;

        settings.save_and_notify(&path, &events).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), PipelineEvent::SettingsUpdated(settings.clone()));
        let loaded = PipelineSettings::load_from(&path).await.unwrap();
        assert_eq!(loaded.preferences.default_target_lang, TargetLanguage::Turkish);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_parse_error() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let result = PipelineSettings::load_from(&path).await;
        assert!(matches!(result, Err(SettingsError::Parse(_))));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.preferences.summary_min_chars, 150);
        assert_eq!(settings.preferences.summarizable_language, "en");
        assert!(settings.provider.summarize_endpoint.is_none());
    }
}
