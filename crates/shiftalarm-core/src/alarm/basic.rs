use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::Serialize;
use uuid::Uuid;

use super::shift_alarm::truncate_to_minute;
use super::{AlarmKind, AlarmState, AlarmTone, ShiftAlarm};
use crate::error::ValidationError;
use crate::shift::ShiftType;
use crate::storage::record::truncate_to_millis;

pub const DEFAULT_VOLUME: f32 = 0.8;

/// A classic alarm: one-time, or repeating on a set of weekdays.
///
/// Weekdays are numbered 1 (Monday) to 7 (Sunday). An empty set means the
/// alarm rings once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicAlarm {
    id: String,
    label: String,
    time: NaiveTime,
    repeat_days: BTreeSet<u8>,
    is_active: bool,
    tone: AlarmTone,
    volume: f32,
    created_at: DateTime<Utc>,
    kind: AlarmKind,
    /// Explicit day for one-time alarms generated from a shift match.
    scheduled_date: Option<NaiveDate>,
}

impl BasicAlarm {
    /// # Errors
    /// Fails on weekdays outside 1..=7 or volume outside 0.0..=1.0.
    pub fn new(
        label: impl Into<String>,
        time: NaiveTime,
        repeat_days: BTreeSet<u8>,
        tone: AlarmTone,
        volume: f32,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::from_parts(
            Uuid::new_v4().to_string(),
            label.into(),
            time,
            repeat_days,
            true,
            tone,
            volume,
            now,
            AlarmKind::Basic,
            None,
        )
    }

    /// # Errors
    /// Fails on weekdays outside 1..=7 or volume outside 0.0..=1.0.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: String,
        label: String,
        time: NaiveTime,
        repeat_days: BTreeSet<u8>,
        is_active: bool,
        tone: AlarmTone,
        volume: f32,
        created_at: DateTime<Utc>,
        kind: AlarmKind,
        scheduled_date: Option<NaiveDate>,
    ) -> Result<Self, ValidationError> {
        if let Some(bad) = repeat_days.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(ValidationError::InvalidWeekday(*bad));
        }
        if !(0.0..=1.0).contains(&volume) {
            return Err(ValidationError::InvalidVolume(volume));
        }
        Ok(Self {
            id,
            label,
            time: truncate_to_minute(time),
            repeat_days,
            is_active,
            tone,
            volume,
            created_at: truncate_to_millis(created_at),
            kind,
            scheduled_date,
        })
    }

    /// A one-time alarm for a single date matched by a shift alarm.
    pub fn from_shift_match(
        alarm: &ShiftAlarm,
        date: NaiveDate,
        shift: ShiftType,
        tone: AlarmTone,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: alarm.title().to_string(),
            time: alarm.time(),
            repeat_days: BTreeSet::new(),
            is_active: alarm.is_active(),
            tone,
            volume: DEFAULT_VOLUME,
            created_at: truncate_to_millis(now),
            kind: AlarmKind::from(shift),
            scheduled_date: Some(date),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn repeat_days(&self) -> &BTreeSet<u8> {
        &self.repeat_days
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn tone(&self) -> AlarmTone {
        self.tone
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn kind(&self) -> AlarmKind {
        self.kind
    }

    pub fn scheduled_date(&self) -> Option<NaiveDate> {
        self.scheduled_date
    }

    pub fn is_repeating(&self) -> bool {
        !self.repeat_days.is_empty()
    }

    pub fn repeat_weekdays(&self) -> Vec<Weekday> {
        self.repeat_days.iter().filter_map(|d| weekday_from_number(*d)).collect()
    }

    pub fn with_active(&self, is_active: bool) -> Self {
        Self {
            is_active,
            ..self.clone()
        }
    }

    /// The single instant a one-time alarm rings at; `None` for repeating ones.
    ///
    /// Undated alarms ring at the first `time` at or after their creation,
    /// read in local time.
    pub fn one_time_at(&self) -> Option<NaiveDateTime> {
        if self.is_repeating() {
            return None;
        }
        if let Some(date) = self.scheduled_date {
            return Some(date.and_time(self.time));
        }
        let created = self.created_at.with_timezone(&Local).naive_local();
        let first = created.date().and_time(self.time);
        Some(if first >= created { first } else { first + Duration::days(1) })
    }

    /// Next instant strictly after `now` at which this alarm rings.
    ///
    /// One-time alarms have a single instant and never ring again once it
    /// passed.
    pub fn next_occurrence(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if !self.is_active {
            return None;
        }
        if self.is_repeating() {
            let weekdays = self.repeat_weekdays();
            return now
                .date()
                .iter_days()
                .take(8)
                .map(|d| d.and_time(self.time))
                .find(|at| at > &now && weekdays.contains(&at.weekday()));
        }
        self.one_time_at().filter(|at| at > &now)
    }

    pub fn state(&self, now: NaiveDateTime) -> AlarmState {
        if !self.is_active {
            AlarmState::Inactive
        } else if self.next_occurrence(now).is_some() {
            AlarmState::ActivePending
        } else {
            AlarmState::Fired
        }
    }
}

/// 1 = Monday .. 7 = Sunday.
pub fn weekday_from_number(n: u8) -> Option<Weekday> {
    match n {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_number(day: Weekday) -> u8 {
    day.number_from_monday() as u8
}
