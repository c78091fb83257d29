//! TOML-based application configuration.
//!
//! Ambient settings only -- everything session-shaped lives in the
//! [`crate::SessionState`] record. Stored at `data_dir()/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Text-generation API settings for blocklist refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Session tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_duration")]
    pub default_duration_min: u32,
    /// Inactive tabs idle beyond this are closed by the deep-work sweep.
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_min: u32,
}

/// Notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_endpoint() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_max_tokens() -> u32 {
    1500
}
fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}
fn default_duration() -> u32 {
    45
}
fn default_idle_threshold() -> u32 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_duration_min: default_duration(),
            idle_threshold_min: default_idle_threshold(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("."),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string())),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be
    /// parsed, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        self.save()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.session.default_duration_min, 45);
        assert_eq!(parsed.session.idle_threshold_min, 10);
        assert_eq!(parsed.api.max_tokens, 1500);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(
            cfg.get("session.default_duration_min").as_deref(),
            Some("45")
        );
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(
            cfg.get("api.endpoint").as_deref(),
            Some("https://api.anthropic.com/v1/messages")
        );
        assert!(cfg.get("api.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "session.idle_threshold_min", "15").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "session.idle_threshold_min").unwrap(),
            &serde_json::Value::Number(15.into())
        );
    }

    #[test]
    fn set_json_value_by_path_updates_nested_bool_and_string() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "notifications.enabled", "false").unwrap();
        Config::set_json_value_by_path(&mut json, "api.model", "claude-foo").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "notifications.enabled").unwrap(),
            &serde_json::Value::Bool(false)
        );
        assert_eq!(
            Config::get_json_value_by_path(&json, "api.model").unwrap(),
            &serde_json::Value::String("claude-foo".to_string())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key_and_bad_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(matches!(
            Config::set_json_value_by_path(&mut json, "api.nonexistent", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            Config::set_json_value_by_path(&mut json, "notifications.enabled", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
