mod config;
pub mod database;
pub mod record;

pub use config::{AlarmDefaults, Config};
pub use database::AlarmDb;
pub use record::{BasicAlarmRecord, PatternRecord, ShiftAlarmRecord};

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::shift::ShiftPattern;

/// Returns the data directory, creating it if needed.
///
/// `SHIFTALARM_DATA_DIR` wins when set; otherwise `~/.config/shiftalarm`, or
/// `~/.config/shiftalarm-dev` when `SHIFTALARM_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SHIFTALARM_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SHIFTALARM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("shiftalarm-dev")
            } else {
                base_dir.join("shiftalarm")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Id lookup for shift patterns.
///
/// Alarms only hold a pattern id; a `None` here means the pattern was
/// deleted and the alarm is orphaned.
pub trait PatternRepository {
    fn get_pattern(&self, id: &str) -> Result<Option<ShiftPattern>>;
}

/// Patterns held in memory, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPatterns {
    patterns: HashMap<String, ShiftPattern>,
}

impl InMemoryPatterns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id.
    pub fn insert(&mut self, pattern: ShiftPattern) {
        self.patterns.insert(pattern.id().to_string(), pattern);
    }

    pub fn remove(&mut self, id: &str) -> Option<ShiftPattern> {
        self.patterns.remove(id)
    }
}

impl PatternRepository for InMemoryPatterns {
    fn get_pattern(&self, id: &str) -> Result<Option<ShiftPattern>> {
        Ok(self.patterns.get(id).cloned())
    }
}
