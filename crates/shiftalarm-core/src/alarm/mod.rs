//! Alarm definitions.
//!
//! Alarms are declarative: they say *when* and *how* to ring, and the
//! [`crate::notify`] planner turns them into concrete fire instants.

mod basic;
mod shift_alarm;

pub use basic::{weekday_from_number, weekday_number, BasicAlarm, DEFAULT_VOLUME};
pub use shift_alarm::{ShiftAlarm, ShiftAlarmUpdate, DEFAULT_MESSAGE, SHIFT_PLACEHOLDER};

use std::fmt;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::shift::ShiftType;

/// Lifecycle of an alarm or of one of its occurrences.
///
/// ```text
/// Inactive <-> ActivePending -> Fired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    Inactive,
    ActivePending,
    Fired,
}

/// Built-in ringtones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlarmTone {
    #[default]
    Classic,
    Gentle,
    Digital,
    Bell,
    Chime,
}

impl AlarmTone {
    pub const ALL: [AlarmTone; 5] = [
        AlarmTone::Classic,
        AlarmTone::Gentle,
        AlarmTone::Digital,
        AlarmTone::Bell,
        AlarmTone::Chime,
    ];

    pub fn code(self) -> &'static str {
        match self {
            AlarmTone::Classic => "classic",
            AlarmTone::Gentle => "gentle",
            AlarmTone::Digital => "digital",
            AlarmTone::Bell => "bell",
            AlarmTone::Chime => "chime",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AlarmTone::Classic => "Classic Alarm",
            AlarmTone::Gentle => "Gentle Wake",
            AlarmTone::Digital => "Digital Beep",
            AlarmTone::Bell => "Bell",
            AlarmTone::Chime => "Chime",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Unknown codes map to [`AlarmTone::Classic`].
    pub fn from_code_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            tracing::warn!(code, "unknown alarm tone, using default");
            Self::default()
        })
    }
}

impl fmt::Display for AlarmTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Classification tag carried by basic alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlarmKind {
    Day,
    Night,
    Off,
    #[default]
    Basic,
}

impl AlarmKind {
    pub fn code(self) -> &'static str {
        match self {
            AlarmKind::Day => "day",
            AlarmKind::Night => "night",
            AlarmKind::Off => "off",
            AlarmKind::Basic => "basic",
        }
    }

    /// Unknown codes map to [`AlarmKind::Basic`].
    pub fn from_code_or_default(code: &str) -> Self {
        match code {
            "day" => AlarmKind::Day,
            "night" => AlarmKind::Night,
            "off" => AlarmKind::Off,
            "basic" => AlarmKind::Basic,
            other => {
                tracing::warn!(code = other, "unknown alarm kind, using basic");
                AlarmKind::Basic
            }
        }
    }
}

impl From<ShiftType> for AlarmKind {
    fn from(shift: ShiftType) -> Self {
        match shift {
            ShiftType::Day => AlarmKind::Day,
            ShiftType::Night => AlarmKind::Night,
            ShiftType::Off => AlarmKind::Off,
        }
    }
}

/// Presentation settings shared by shift and basic alarms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSettings {
    pub vibration: bool,
    pub sound_enabled: bool,
    /// Custom sound file; the platform default is used when unset.
    pub sound_path: Option<String>,
    pub snooze_enabled: bool,
    pub snooze_minutes: u32,
    pub max_snooze_count: u32,
}

pub const MAX_SNOOZE_MINUTES: u32 = 60;
pub const MAX_SNOOZE_COUNT: u32 = 10;

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            vibration: true,
            sound_enabled: true,
            sound_path: None,
            snooze_enabled: true,
            snooze_minutes: 5,
            max_snooze_count: 3,
        }
    }
}

impl AlarmSettings {
    /// # Errors
    /// Returns an error if the snooze duration is outside `1..=60` minutes or
    /// the snooze count exceeds 10.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_SNOOZE_MINUTES).contains(&self.snooze_minutes) {
            return Err(ValidationError::InvalidValue {
                field: "snooze_minutes".into(),
                message: format!("{} is outside 1..={MAX_SNOOZE_MINUTES}", self.snooze_minutes),
            });
        }
        if self.max_snooze_count > MAX_SNOOZE_COUNT {
            return Err(ValidationError::InvalidValue {
                field: "max_snooze_count".into(),
                message: format!("{} exceeds {MAX_SNOOZE_COUNT}", self.max_snooze_count),
            });
        }
        Ok(())
    }

    /// When the alarm rings again if snoozed after `snoozes_so_far` earlier
    /// snoozes. `None` once snoozing is disabled or used up.
    pub fn snooze_at(&self, rang_at: NaiveDateTime, snoozes_so_far: u32) -> Option<NaiveDateTime> {
        if !self.snooze_enabled || snoozes_so_far >= self.max_snooze_count {
            return None;
        }
        Some(rang_at + Duration::minutes(i64::from(self.snooze_minutes)))
    }
}

/// Parse `HH:MM` (24h) into a time of day with zero seconds.
///
/// # Errors
/// Returns [`ValidationError::InvalidTime`] for anything else.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| ValidationError::InvalidTime(s.to_string()))
}
