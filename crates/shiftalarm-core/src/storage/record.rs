//! Flat persisted shapes for patterns and alarms.
//!
//! Keys are `_`-separated, nested settings are flattened with a `settings_`
//! prefix, dates and timestamps are epoch milliseconds (dates at UTC
//! midnight). Loading is lenient about codes: an unknown shift, tone or kind
//! code falls back to its documented default instead of failing the load.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmKind, AlarmSettings, AlarmTone, BasicAlarm, ShiftAlarm};
use crate::error::ValidationError;
use crate::shift::{ShiftPattern, ShiftType};

/// Drop sub-millisecond precision so timestamps survive the epoch-ms encoding.
pub(crate) fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

fn millis_to_timestamp(field: &str, ms: i64) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| ValidationError::InvalidValue {
        field: field.to_string(),
        message: format!("{ms} is not a valid epoch-millisecond timestamp"),
    })
}

fn millis_to_date(field: &str, ms: i64) -> Result<NaiveDate, ValidationError> {
    millis_to_timestamp(field, ms).map(|t| t.date_naive())
}

fn shift_code(shift: ShiftType) -> String {
    shift.short_code().to_string()
}

fn parse_shift_code(code: &str) -> ShiftType {
    match code.chars().next() {
        Some(c) if code.chars().count() == 1 => ShiftType::from_code_or_default(c),
        _ => {
            tracing::warn!(code, fallback = %ShiftType::FALLBACK, "malformed shift code");
            ShiftType::FALLBACK
        }
    }
}

fn time_of_day(hour: u32, minute: u32) -> Result<NaiveTime, ValidationError> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| ValidationError::InvalidTime(format!("{hour:02}:{minute:02}")))
}

// === Shift pattern ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub id: String,
    pub name: String,
    /// Single-character shift codes, position 0 first.
    pub cycle: Vec<String>,
    pub start_date: i64,
    pub is_active: bool,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl From<&ShiftPattern> for PatternRecord {
    fn from(pattern: &ShiftPattern) -> Self {
        Self {
            id: pattern.id().to_string(),
            name: pattern.name().to_string(),
            cycle: pattern.cycle().iter().map(|s| shift_code(*s)).collect(),
            start_date: date_to_millis(pattern.start_date()),
            is_active: pattern.is_active(),
            created_at: pattern.created_at().timestamp_millis(),
            updated_at: pattern.updated_at().map(|t| t.timestamp_millis()),
        }
    }
}

impl PatternRecord {
    /// # Errors
    /// Fails on an empty cycle or out-of-range timestamps.
    pub fn into_pattern(self) -> Result<ShiftPattern, ValidationError> {
        let cycle = self.cycle.iter().map(|c| parse_shift_code(c)).collect();
        let updated_at = self
            .updated_at
            .map(|ms| millis_to_timestamp("updated_at", ms))
            .transpose()?;
        ShiftPattern::from_parts(
            self.id,
            self.name,
            cycle,
            millis_to_date("start_date", self.start_date)?,
            self.is_active,
            millis_to_timestamp("created_at", self.created_at)?,
            updated_at,
        )
    }
}

// === Shift alarm ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftAlarmRecord {
    pub id: String,
    pub pattern_id: String,
    pub target_shifts: Vec<String>,
    pub time_hour: u32,
    pub time_minute: u32,
    pub title: String,
    pub message: String,
    pub is_active: bool,
    pub settings_vibration: bool,
    pub settings_sound_enabled: bool,
    #[serde(default)]
    pub settings_sound_path: Option<String>,
    pub settings_snooze_enabled: bool,
    pub settings_snooze_minutes: u32,
    pub settings_max_snooze_count: u32,
    pub created_at: i64,
}

impl From<&ShiftAlarm> for ShiftAlarmRecord {
    fn from(alarm: &ShiftAlarm) -> Self {
        let settings = alarm.settings();
        Self {
            id: alarm.id().to_string(),
            pattern_id: alarm.pattern_id().to_string(),
            target_shifts: alarm.target_shifts().iter().map(|s| shift_code(*s)).collect(),
            time_hour: alarm.time().hour(),
            time_minute: alarm.time().minute(),
            title: alarm.title().to_string(),
            message: alarm.message().to_string(),
            is_active: alarm.is_active(),
            settings_vibration: settings.vibration,
            settings_sound_enabled: settings.sound_enabled,
            settings_sound_path: settings.sound_path.clone(),
            settings_snooze_enabled: settings.snooze_enabled,
            settings_snooze_minutes: settings.snooze_minutes,
            settings_max_snooze_count: settings.max_snooze_count,
            created_at: alarm.created_at().timestamp_millis(),
        }
    }
}

impl ShiftAlarmRecord {
    /// # Errors
    /// Fails on an empty target list, invalid time, settings or timestamp.
    pub fn into_alarm(self) -> Result<ShiftAlarm, ValidationError> {
        let targets: BTreeSet<ShiftType> = self.target_shifts.iter().map(|c| parse_shift_code(c)).collect();
        ShiftAlarm::from_parts(
            self.id,
            self.pattern_id,
            targets,
            time_of_day(self.time_hour, self.time_minute)?,
            self.title,
            self.message,
            self.is_active,
            AlarmSettings {
                vibration: self.settings_vibration,
                sound_enabled: self.settings_sound_enabled,
                sound_path: self.settings_sound_path,
                snooze_enabled: self.settings_snooze_enabled,
                snooze_minutes: self.settings_snooze_minutes,
                max_snooze_count: self.settings_max_snooze_count,
            },
            millis_to_timestamp("created_at", self.created_at)?,
        )
    }
}

// === Basic alarm ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicAlarmRecord {
    pub id: String,
    pub label: String,
    pub time_hour: u32,
    pub time_minute: u32,
    /// 1 = Monday .. 7 = Sunday; empty for one-time alarms.
    pub repeat_days: Vec<u8>,
    pub is_active: bool,
    pub tone: String,
    pub volume: f32,
    pub created_at: i64,
    pub kind: String,
    #[serde(default)]
    pub scheduled_date: Option<i64>,
}

impl From<&BasicAlarm> for BasicAlarmRecord {
    fn from(alarm: &BasicAlarm) -> Self {
        Self {
            id: alarm.id().to_string(),
            label: alarm.label().to_string(),
            time_hour: alarm.time().hour(),
            time_minute: alarm.time().minute(),
            repeat_days: alarm.repeat_days().iter().copied().collect(),
            is_active: alarm.is_active(),
            tone: alarm.tone().code().to_string(),
            volume: alarm.volume(),
            created_at: alarm.created_at().timestamp_millis(),
            kind: alarm.kind().code().to_string(),
            scheduled_date: alarm.scheduled_date().map(date_to_millis),
        }
    }
}

impl BasicAlarmRecord {
    /// # Errors
    /// Fails on invalid weekdays, volume, time or timestamps.
    pub fn into_alarm(self) -> Result<BasicAlarm, ValidationError> {
        let scheduled_date = self
            .scheduled_date
            .map(|ms| millis_to_date("scheduled_date", ms))
            .transpose()?;
        BasicAlarm::from_parts(
            self.id,
            self.label,
            time_of_day(self.time_hour, self.time_minute)?,
            self.repeat_days.into_iter().collect(),
            self.is_active,
            AlarmTone::from_code_or_default(&self.tone),
            self.volume,
            millis_to_timestamp("created_at", self.created_at)?,
            AlarmKind::from_code_or_default(&self.kind),
            scheduled_date,
        )
    }
}
