use chrono::NaiveDateTime;
use serde::Serialize;

use super::{plan_basic_alarm, plan_shift_alarm, Notifier};
use crate::alarm::{AlarmSettings, BasicAlarm, ShiftAlarm};
use crate::error::Result;
use crate::storage::PatternRepository;

/// What a sync pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub scheduled: usize,
    pub cancelled: usize,
    pub inactive_alarms: usize,
    /// Shift alarms whose pattern id resolved to nothing.
    pub missing_patterns: Vec<String>,
}

/// Bring `notifier` in line with the given alarms for the window
/// `[now, now + horizon_days)`.
///
/// Every alarm is cancelled first and, when active, rescheduled from a fresh
/// plan, so toggling an alarm off drops its notifications and toggling it on
/// regenerates them from `now`. Basic alarms are planned with
/// `basic_settings`.
///
/// # Errors
/// Fails if the horizon is negative, the repository lookup fails, or the
/// notifier rejects a request.
pub fn sync_notifications<N, R>(
    notifier: &mut N,
    patterns: &R,
    shift_alarms: &[ShiftAlarm],
    basic_alarms: &[BasicAlarm],
    basic_settings: &AlarmSettings,
    now: NaiveDateTime,
    horizon_days: i64,
) -> Result<SyncReport>
where
    N: Notifier + ?Sized,
    R: PatternRepository + ?Sized,
{
    let mut report = SyncReport::default();

    for alarm in shift_alarms {
        report.cancelled += notifier.cancel_alarm(alarm.id())?;
        if !alarm.is_active() {
            report.inactive_alarms += 1;
            continue;
        }
        let Some(pattern) = patterns.get_pattern(alarm.pattern_id())? else {
            tracing::warn!(
                alarm_id = alarm.id(),
                pattern_id = alarm.pattern_id(),
                "shift alarm references a missing pattern"
            );
            report.missing_patterns.push(alarm.id().to_string());
            continue;
        };
        let plan = plan_shift_alarm(alarm, &pattern, now, horizon_days)?;
        tracing::debug!(alarm_id = alarm.id(), count = plan.len(), "scheduling shift alarm");
        for notification in &plan {
            notifier.schedule(notification)?;
        }
        report.scheduled += plan.len();
    }

    for alarm in basic_alarms {
        report.cancelled += notifier.cancel_alarm(alarm.id())?;
        if !alarm.is_active() {
            report.inactive_alarms += 1;
            continue;
        }
        let plan = plan_basic_alarm(alarm, basic_settings, now);
        tracing::debug!(alarm_id = alarm.id(), count = plan.len(), "scheduling basic alarm");
        for notification in &plan {
            notifier.schedule(notification)?;
        }
        report.scheduled += plan.len();
    }

    Ok(report)
}
