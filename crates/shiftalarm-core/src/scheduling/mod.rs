//! Clock-aware orchestration over the shift engine.
//!
//! [`SchedulingService`] answers "what is my shift today", builds day-by-day
//! previews and drives notification planning. Each operation samples its
//! [`Clock`] once at entry and passes that snapshot down.

mod preview;

pub use preview::{build_preview, weekday_name, DayPreview};

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmSettings, BasicAlarm, ShiftAlarm};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, ValidationError};
use crate::notify::{self, Notifier, PlannedNotification, SyncReport};
use crate::shift::{ShiftPattern, ShiftType, DEFAULT_SEARCH_HORIZON_DAYS};
use crate::storage::PatternRepository;

/// Day windows used by [`SchedulingService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Rolling window kept scheduled with the notifier.
    #[serde(default = "default_notification_horizon_days")]
    pub notification_horizon_days: u32,
    /// How far `next_shift_date` looks before giving up.
    #[serde(default = "default_next_shift_search_days")]
    pub next_shift_search_days: u32,
    #[serde(default = "default_preview_days")]
    pub preview_days: u32,
}

fn default_notification_horizon_days() -> u32 {
    30
}
fn default_next_shift_search_days() -> u32 {
    DEFAULT_SEARCH_HORIZON_DAYS
}
fn default_preview_days() -> u32 {
    7
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            notification_horizon_days: default_notification_horizon_days(),
            next_shift_search_days: default_next_shift_search_days(),
            preview_days: default_preview_days(),
        }
    }
}

pub struct SchedulingService<C: Clock = SystemClock> {
    clock: C,
    config: SchedulingConfig,
    /// Presentation used for basic alarm notifications.
    alarm_defaults: AlarmSettings,
}

impl Default for SchedulingService<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> SchedulingService<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            config: SchedulingConfig::default(),
            alarm_defaults: AlarmSettings::default(),
        }
    }

    pub fn with_config(mut self, config: SchedulingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_alarm_defaults(mut self, settings: AlarmSettings) -> Self {
        self.alarm_defaults = settings;
        self
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Local calendar date, sampled now.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn current_shift(&self, pattern: &ShiftPattern) -> ShiftType {
        pattern.shift_for_date(self.today())
    }

    /// One [`DayPreview`] per day in `[today, today + days_ahead)`.
    ///
    /// # Errors
    /// Returns [`ValidationError::NegativeDays`] if `days_ahead` is negative.
    pub fn upcoming_shifts(
        &self,
        pattern: &ShiftPattern,
        days_ahead: i64,
    ) -> Result<Vec<DayPreview>, ValidationError> {
        build_preview(pattern, self.today(), days_ahead)
    }

    /// [`Self::upcoming_shifts`] over the configured `preview_days`.
    pub fn preview(&self, pattern: &ShiftPattern) -> Vec<DayPreview> {
        build_preview(pattern, self.today(), i64::from(self.config.preview_days)).unwrap_or_default()
    }

    /// Dates from today whose shift is in `targets`.
    ///
    /// # Errors
    /// Returns [`ValidationError::NegativeDays`] if `days_ahead` is negative.
    pub fn upcoming_dates(
        &self,
        pattern: &ShiftPattern,
        targets: &BTreeSet<ShiftType>,
        days_ahead: i64,
    ) -> Result<Vec<NaiveDate>, ValidationError> {
        pattern.upcoming_shifts(targets, self.today(), days_ahead)
    }

    /// Next date from today (inclusive) with the `target` shift, searching
    /// the configured `next_shift_search_days`.
    pub fn next_shift_date(&self, pattern: &ShiftPattern, target: ShiftType) -> Option<NaiveDate> {
        pattern.next_shift_date(target, self.today(), self.config.next_shift_search_days)
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now_local()
    }

    fn horizon(&self) -> i64 {
        i64::from(self.config.notification_horizon_days)
    }

    pub fn plan_shift_alarm(&self, alarm: &ShiftAlarm, pattern: &ShiftPattern) -> Vec<PlannedNotification> {
        notify::plan_shift_alarm(alarm, pattern, self.now(), self.horizon()).unwrap_or_default()
    }

    pub fn plan_basic_alarm(&self, alarm: &BasicAlarm) -> Vec<PlannedNotification> {
        notify::plan_basic_alarm(alarm, &self.alarm_defaults, self.now())
    }

    /// Re-apply the rolling notification horizon for every alarm.
    ///
    /// # Errors
    /// Fails if a pattern lookup fails or the notifier rejects a request.
    pub fn sync<N, R>(
        &self,
        notifier: &mut N,
        patterns: &R,
        shift_alarms: &[ShiftAlarm],
        basic_alarms: &[BasicAlarm],
    ) -> Result<SyncReport>
    where
        N: Notifier + ?Sized,
        R: PatternRepository + ?Sized,
    {
        notify::sync_notifications(
            notifier,
            patterns,
            shift_alarms,
            basic_alarms,
            &self.alarm_defaults,
            self.now(),
            self.horizon(),
        )
    }
}
