//! TOML-based application configuration.
//!
//! Stores:
//! - Backend endpoints and keys (identity, token, document store, push)
//! - Exercise defaults
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/orthoptic/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, StorageError};

use super::data_dir;

/// Backend endpoints. Overridable so tests and staging environments can
/// point the clients elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_push_url")]
    pub push_url: String,
    #[serde(default)]
    pub push_server_key: String,
}

/// Exercise defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseConfig {
    /// Fallback duration in seconds when the cloud document has none.
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Recurring reminder interval in seconds.
    #[serde(default = "default_reminder_interval")]
    pub reminder_interval_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/orthoptic/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub exercise: ExerciseConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_identity_url() -> String {
    "https://identitytoolkit.googleapis.com".into()
}
fn default_token_url() -> String {
    "https://securetoken.googleapis.com".into()
}
fn default_database_url() -> String {
    "https://orthoptic-default-rtdb.firebaseio.com".into()
}
fn default_push_url() -> String {
    "https://fcm.googleapis.com".into()
}
fn default_duration_secs() -> u32 {
    180
}
fn default_reminder_interval() -> u64 {
    3600
}
fn default_true() -> bool {
    true
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            identity_url: default_identity_url(),
            token_url: default_token_url(),
            database_url: default_database_url(),
            push_url: default_push_url(),
            push_server_key: String::new(),
        }
    }
}

impl Default for ExerciseConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_interval_secs: default_reminder_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            exercise: ExerciseConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                CoreError::Storage(StorageError::ConfigLoad {
                    path,
                    message: e.to_string(),
                })
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| {
            CoreError::Storage(StorageError::ConfigSave {
                path: path.clone(),
                message: e.to_string(),
            })
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist. The new value
    /// must parse as the same JSON type the key currently holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be
    /// parsed, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        set_by_path(&mut json, key, value).map_err(|message| {
            CoreError::Storage(StorageError::ConfigKey {
                key: key.to_string(),
                message,
            })
        })?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }
}

fn set_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), String> {
    let mut parts = key.split('.').peekable();
    if parts.peek().is_none() {
        return Err("config key is empty".into());
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            let obj = current
                .as_object_mut()
                .ok_or_else(|| "unknown config key".to_string())?;
            let existing = obj.get(part).ok_or_else(|| "unknown config key".to_string())?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| e.to_string())?,
                ),
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("cannot parse '{value}' as number"))?
                        .into(),
                ),
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }
        current = current
            .get_mut(part)
            .ok_or_else(|| "unknown config key".to_string())?;
    }
    Err("unknown config key".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.exercise.default_duration_secs, 180);
        assert_eq!(parsed.notifications.reminder_interval_secs, 3600);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("exercise.default_duration_secs").as_deref(), Some("180"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("notifications.missing_key").is_none());
    }

    #[test]
    fn set_by_path_updates_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        set_by_path(&mut json, "exercise.default_duration_secs", "300").unwrap();
        let cfg: Config = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.exercise.default_duration_secs, 300);
    }

    #[test]
    fn set_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(set_by_path(&mut json, "exercise.nonexistent", "1").is_err());
    }

    #[test]
    fn set_by_path_rejects_wrong_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(set_by_path(&mut json, "notifications.enabled", "not_a_bool").is_err());
    }
}
