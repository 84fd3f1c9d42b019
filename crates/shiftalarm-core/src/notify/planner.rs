use chrono::{Datelike, NaiveDateTime};

use super::PlannedNotification;
use crate::alarm::{weekday_number, AlarmSettings, BasicAlarm, ShiftAlarm};
use crate::error::ValidationError;
use crate::shift::ShiftPattern;

/// Occurrences of a shift alarm in `[today, today + horizon_days)` that are
/// still ahead of `now`.
///
/// Inactive alarms and inactive patterns plan nothing.
///
/// # Errors
/// Returns [`ValidationError::NegativeDays`] if `horizon_days` is negative.
pub fn plan_shift_alarm(
    alarm: &ShiftAlarm,
    pattern: &ShiftPattern,
    now: NaiveDateTime,
    horizon_days: i64,
) -> Result<Vec<PlannedNotification>, ValidationError> {
    let dates = pattern.upcoming_shifts(alarm.target_shifts(), now.date(), horizon_days)?;
    if !alarm.is_active() || !pattern.is_active() {
        return Ok(Vec::new());
    }

    Ok(dates
        .into_iter()
        .map(|date| (date, alarm.fire_at(date)))
        .filter(|(_, fire_at)| *fire_at > now)
        .map(|(date, fire_at)| {
            let shift = pattern.shift_for_date(date);
            PlannedNotification {
                notification_id: format!("{}:{}", alarm.id(), date),
                alarm_id: alarm.id().to_string(),
                fire_at,
                date,
                time: alarm.time(),
                title: alarm.title().to_string(),
                message: alarm.render_message(shift),
                settings: alarm.settings().clone(),
                shift: Some(shift),
                repeat_weekday: None,
                tone: None,
                volume: None,
            }
        })
        .collect())
}

/// A single entry for one-time alarms, or one weekly-repeating entry per
/// weekday for repeating alarms (the platform handles the repetition).
///
/// Basic alarms carry their own tone and volume; snooze, vibration and sound
/// come from `settings`, normally the configured alarm defaults.
pub fn plan_basic_alarm(
    alarm: &BasicAlarm,
    settings: &AlarmSettings,
    now: NaiveDateTime,
) -> Vec<PlannedNotification> {
    if !alarm.is_active() {
        return Vec::new();
    }

    let entry = |fire_at: NaiveDateTime, repeat_weekday: Option<u8>| {
        let suffix = match repeat_weekday {
            Some(day) => format!("w{day}"),
            None => fire_at.date().to_string(),
        };
        PlannedNotification {
            notification_id: format!("{}:{}", alarm.id(), suffix),
            alarm_id: alarm.id().to_string(),
            fire_at,
            date: fire_at.date(),
            time: alarm.time(),
            title: alarm.label().to_string(),
            message: alarm.label().to_string(),
            settings: settings.clone(),
            shift: None,
            repeat_weekday,
            tone: Some(alarm.tone()),
            volume: Some(alarm.volume()),
        }
    };

    if !alarm.is_repeating() {
        return alarm
            .next_occurrence(now)
            .map(|at| entry(at, None))
            .into_iter()
            .collect();
    }

    let mut planned: Vec<_> = alarm
        .repeat_weekdays()
        .into_iter()
        .filter_map(|weekday| {
            now.date()
                .iter_days()
                .take(8)
                .map(|d| d.and_time(alarm.time()))
                .find(|at| *at > now && at.weekday() == weekday)
                .map(|at| entry(at, Some(weekday_number(weekday))))
        })
        .collect();
    planned.sort_by_key(|n| n.fire_at);
    planned
}
