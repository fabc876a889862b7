use crate::errors::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";

/// Configuration for the coach agent and its external services
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoachConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub vision_model: Option<String>,
    pub usda_api_key: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub save_history: Option<bool>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            model: Some(DEFAULT_MODEL.to_string()),
            vision_model: Some(DEFAULT_VISION_MODEL.to_string()),
            usda_api_key: None,
            system_prompt: None,
            temperature: Some(0.7),
            save_history: Some(true),
        }
    }
}

impl CoachConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                CoreError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                CoreError::ConfigError(format!("Failed to parse config file: {}", e))
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> CoreResult<()> {
        let content = toml::to_string(self)
            .map_err(|e| CoreError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CoreError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content)
            .map_err(|e| CoreError::ConfigError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            base_url: other.base_url.clone().or_else(|| self.base_url.clone()),
            model: other.model.clone().or_else(|| self.model.clone()),
            vision_model: other
                .vision_model
                .clone()
                .or_else(|| self.vision_model.clone()),
            usda_api_key: other
                .usda_api_key
                .clone()
                .or_else(|| self.usda_api_key.clone()),
            system_prompt: other
                .system_prompt
                .clone()
                .or_else(|| self.system_prompt.clone()),
            temperature: other.temperature.or(self.temperature),
            save_history: other.save_history.or(self.save_history),
        }
    }

    /// Overlays environment variables onto the config. Environment wins.
    pub fn apply_env(mut self) -> Self {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(key) = env::var("USDA_API_KEY") {
            if !key.is_empty() {
                self.usda_api_key = Some(key);
            }
        }
        if let Ok(url) = env::var("FITCOACH_BASE_URL") {
            if !url.is_empty() {
                self.base_url = Some(url);
            }
        }
        if let Ok(model) = env::var("FITCOACH_MODEL") {
            if !model.is_empty() {
                self.model = Some(model);
            }
        }
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(DEFAULT_VISION_MODEL)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(0.7)
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> CoreResult<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| CoreError::ConfigError("Could not determine home directory".to_string()))?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> CoreResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_other_when_present() {
        let base = CoachConfig::default();
        let mut override_cfg = CoachConfig::default();
        override_cfg.api_key = Some("sk-test".to_string());
        override_cfg.model = Some("gpt-4o".to_string());
        override_cfg.base_url = None;

        let merged = base.merge(&override_cfg);
        assert_eq!(merged.api_key.as_deref(), Some("sk-test"));
        assert_eq!(merged.model(), "gpt-4o");
        // Falls back to base when the override is absent
        assert_eq!(merged.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn defaults_are_sensible() {
        let config = CoachConfig::default();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.vision_model(), DEFAULT_VISION_MODEL);
        assert!((config.temperature() - 0.7).abs() < f32::EPSILON);
        assert!(config.api_key.is_none());
    }
}
