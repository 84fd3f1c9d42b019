//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Scheduling windows (notification horizon, next-shift search, preview length)
//! - Defaults applied to newly created alarms
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::data_dir;
use crate::alarm::{AlarmSettings, AlarmTone};
use crate::error::ConfigError;
use crate::scheduling::SchedulingConfig;

/// Settings copied into every new alarm unless overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmDefaults {
    #[serde(default = "default_true")]
    pub vibration: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub snooze_enabled: bool,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    #[serde(default = "default_max_snooze_count")]
    pub max_snooze_count: u32,
    #[serde(default)]
    pub tone: AlarmTone,
    /// 0.0 (silent) to 1.0.
    #[serde(default = "default_volume")]
    pub volume: f64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub alarm_defaults: AlarmDefaults,
}

fn default_true() -> bool {
    true
}
fn default_snooze_minutes() -> u32 {
    5
}
fn default_max_snooze_count() -> u32 {
    3
}
fn default_volume() -> f64 {
    0.8
}

impl Default for AlarmDefaults {
    fn default() -> Self {
        Self {
            vibration: true,
            sound_enabled: true,
            snooze_enabled: true,
            snooze_minutes: default_snooze_minutes(),
            max_snooze_count: default_max_snooze_count(),
            tone: AlarmTone::default(),
            volume: default_volume(),
        }
    }
}

impl AlarmDefaults {
    pub fn settings(&self) -> AlarmSettings {
        AlarmSettings {
            vibration: self.vibration,
            sound_enabled: self.sound_enabled,
            sound_path: None,
            snooze_enabled: self.snooze_enabled,
            snooze_minutes: self.snooze_minutes,
            max_snooze_count: self.max_snooze_count,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    Value::Bool(_) => Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    Value::Object(_) => return Err(invalid("cannot overwrite a whole section".into())),
                    _ => Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::flatten_into(&key, v, out);
                }
            }
            Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    /// Default location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                tracing::debug!(path = %path.display(), "config file missing, writing defaults");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Every leaf setting as `(dot.key, value)`, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::flatten_into("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Apply `key = value` in memory. The result must still validate.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value is unparseable or
    /// out of range.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if self.scheduling.next_shift_search_days == 0 {
            return Err(invalid("scheduling.next_shift_search_days", "must be at least 1".into()));
        }
        if self.scheduling.preview_days == 0 {
            return Err(invalid("scheduling.preview_days", "must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.alarm_defaults.volume) {
            return Err(invalid(
                "alarm_defaults.volume",
                format!("{} is outside 0.0..=1.0", self.alarm_defaults.volume),
            ));
        }
        self.alarm_defaults.settings().validate().map_err(|e| match e {
            crate::error::ValidationError::InvalidValue { field, message } => {
                invalid(&format!("alarm_defaults.{field}"), message)
            }
            other => invalid("alarm_defaults", other.to_string()),
        })
    }

    /// Settings for a new alarm built from the configured defaults.
    pub fn alarm_settings(&self) -> AlarmSettings {
        self.alarm_defaults.settings()
    }
}
