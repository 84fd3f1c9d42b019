use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{AlarmSettings, AlarmState};
use crate::error::ValidationError;
use crate::shift::ShiftType;
use crate::storage::record::truncate_to_millis;

/// Replaced by the matched shift's display name in alarm messages.
pub const SHIFT_PLACEHOLDER: &str = "{shift}";

pub const DEFAULT_MESSAGE: &str = "Your {shift} shift is coming up";

/// An alarm that rings at a fixed time of day on every date whose shift is
/// in its target set.
///
/// The pattern is referenced by id only; it is looked up through a
/// [`crate::storage::PatternRepository`] when occurrences are planned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftAlarm {
    id: String,
    pattern_id: String,
    target_shifts: BTreeSet<ShiftType>,
    time: NaiveTime,
    title: String,
    message: String,
    is_active: bool,
    settings: AlarmSettings,
    created_at: DateTime<Utc>,
}

/// Field overrides for [`ShiftAlarm::update`]. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ShiftAlarmUpdate {
    pub target_shifts: Option<BTreeSet<ShiftType>>,
    pub time: Option<NaiveTime>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub is_active: Option<bool>,
    pub settings: Option<AlarmSettings>,
}

impl ShiftAlarm {
    /// # Errors
    /// Fails if `target_shifts` is empty or `settings` are out of range.
    pub fn new(
        pattern_id: impl Into<String>,
        target_shifts: BTreeSet<ShiftType>,
        time: NaiveTime,
        title: impl Into<String>,
        message: Option<String>,
        settings: AlarmSettings,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::from_parts(
            Uuid::new_v4().to_string(),
            pattern_id.into(),
            target_shifts,
            time,
            title.into(),
            message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            true,
            settings,
            now,
        )
    }

    /// Rebuild an alarm from stored fields. Seconds are dropped from `time`.
    ///
    /// # Errors
    /// Fails if `target_shifts` is empty or `settings` are out of range.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: String,
        pattern_id: String,
        target_shifts: BTreeSet<ShiftType>,
        time: NaiveTime,
        title: String,
        message: String,
        is_active: bool,
        settings: AlarmSettings,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if target_shifts.is_empty() {
            return Err(ValidationError::EmptyTargetShifts);
        }
        settings.validate()?;
        Ok(Self {
            id,
            pattern_id,
            target_shifts,
            time: truncate_to_minute(time),
            title,
            message,
            is_active,
            settings,
            created_at: truncate_to_millis(created_at),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern_id(&self) -> &str {
        &self.pattern_id
    }

    pub fn target_shifts(&self) -> &BTreeSet<ShiftType> {
        &self.target_shifts
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Message template, possibly containing [`SHIFT_PLACEHOLDER`].
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn settings(&self) -> &AlarmSettings {
        &self.settings
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Alarm-level state. A shift alarm keeps ringing on every matching
    /// shift, so it never reaches [`AlarmState::Fired`] as a whole; each
    /// planned occurrence does, see `PlannedNotification::state`.
    pub fn state(&self) -> AlarmState {
        if self.is_active {
            AlarmState::ActivePending
        } else {
            AlarmState::Inactive
        }
    }

    pub fn fires_for(&self, shift: ShiftType) -> bool {
        self.target_shifts.contains(&shift)
    }

    pub fn fire_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.time)
    }

    pub fn render_message(&self, shift: ShiftType) -> String {
        self.message.replace(SHIFT_PLACEHOLDER, shift.display_name())
    }

    /// Copy-with-override; the id, pattern and creation time are kept.
    ///
    /// # Errors
    /// Fails if the result would have no target shifts or invalid settings.
    pub fn update(&self, changes: ShiftAlarmUpdate) -> Result<Self, ValidationError> {
        Self::from_parts(
            self.id.clone(),
            self.pattern_id.clone(),
            changes.target_shifts.unwrap_or_else(|| self.target_shifts.clone()),
            changes.time.unwrap_or(self.time),
            changes.title.unwrap_or_else(|| self.title.clone()),
            changes.message.unwrap_or_else(|| self.message.clone()),
            changes.is_active.unwrap_or(self.is_active),
            changes.settings.unwrap_or_else(|| self.settings.clone()),
            self.created_at,
        )
    }

    pub fn with_active(&self, is_active: bool) -> Self {
        Self {
            is_active,
            ..self.clone()
        }
    }
}

pub(crate) fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm(targets: &[ShiftType]) -> Result<ShiftAlarm, ValidationError> {
        ShiftAlarm::new(
            "pattern-1",
            targets.iter().copied().collect(),
            NaiveTime::from_hms_opt(5, 30, 42).unwrap(),
            "Wake up",
            None,
            AlarmSettings::default(),
            Utc::now(),
        )
    }

    #[test]
    fn requires_a_target_shift() {
        assert_eq!(alarm(&[]), Err(ValidationError::EmptyTargetShifts));
    }

    #[test]
    fn seconds_are_dropped() {
        let a = alarm(&[ShiftType::Day]).unwrap();
        assert_eq!(a.time(), NaiveTime::from_hms_opt(5, 30, 0).unwrap());
    }

    #[test]
    fn message_placeholder_is_filled() {
        let a = alarm(&[ShiftType::Night]).unwrap();
        assert_eq!(a.render_message(ShiftType::Night), "Your Night shift is coming up");
        assert!(a.fires_for(ShiftType::Night));
        assert!(!a.fires_for(ShiftType::Day));
    }

    #[test]
    fn toggling_changes_state_only() {
        let a = alarm(&[ShiftType::Day]).unwrap();
        assert_eq!(a.state(), AlarmState::ActivePending);
        let off = a.with_active(false);
        assert_eq!(off.state(), AlarmState::Inactive);
        assert_eq!(off.id(), a.id());
        assert_eq!(off.with_active(true), a);
    }

    #[test]
    fn update_keeps_identity() {
        let a = alarm(&[ShiftType::Day]).unwrap();
        let b = a
            .update(ShiftAlarmUpdate {
                target_shifts: Some(BTreeSet::from([ShiftType::Night, ShiftType::Off])),
                title: Some("Night prep".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(b.id(), a.id());
        assert_eq!(b.pattern_id(), a.pattern_id());
        assert_eq!(b.title(), "Night prep");
        assert_eq!(a.title(), "Wake up");
        assert!(a
            .update(ShiftAlarmUpdate {
                target_shifts: Some(BTreeSet::new()),
                ..Default::default()
            })
            .is_err());
    }
}
