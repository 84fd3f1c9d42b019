//! Turning alarms into concrete notifications.
//!
//! The platform side (permission prompts, exact timers, rendering) lives
//! behind the [`Notifier`] trait. This module only computes *what* should be
//! pending and keeps a notifier in line with it over a rolling horizon.
//!
//! ## Sync model
//!
//! ```text
//! for each alarm:
//!     cancel everything pending for alarm.id
//!     if active: schedule plan(alarm, now, horizon)
//! ```
//!
//! Plans only contain instants after `now`, so occurrences that already
//! passed are never scheduled again and re-running a sync is idempotent.

mod planner;
mod sync;

pub use planner::{plan_basic_alarm, plan_shift_alarm};
pub use sync::{sync_notifications, SyncReport};

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::alarm::{AlarmSettings, AlarmState, AlarmTone};
use crate::error::{CoreError, Result};
use crate::shift::ShiftType;

/// One occurrence the platform should ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedNotification {
    /// Stable per occurrence, so re-planning yields the same ids.
    pub notification_id: String,
    pub alarm_id: String,
    pub fire_at: NaiveDateTime,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub title: String,
    pub message: String,
    pub settings: AlarmSettings,
    /// Matched shift, for shift alarms.
    pub shift: Option<ShiftType>,
    /// Set when the platform should repeat weekly on this weekday (1 = Monday).
    pub repeat_weekday: Option<u8>,
    pub tone: Option<AlarmTone>,
    pub volume: Option<f32>,
}

impl PlannedNotification {
    /// State of this one occurrence at `now`.
    ///
    /// Shift alarms have no single instant, so whether a shift alarm "fired"
    /// is answered per occurrence here. Weekly entries never expire.
    pub fn state(&self, now: NaiveDateTime) -> AlarmState {
        if self.repeat_weekday.is_some() || self.fire_at > now {
            AlarmState::ActivePending
        } else {
            AlarmState::Fired
        }
    }
}

/// Platform notification scheduler.
pub trait Notifier {
    /// Register one notification, replacing any with the same id.
    fn schedule(&mut self, notification: &PlannedNotification) -> Result<()>;

    /// Drop every pending notification belonging to `alarm_id` and return
    /// how many were removed.
    fn cancel_alarm(&mut self, alarm_id: &str) -> Result<usize>;

    /// Pending notifications for `alarm_id`, ordered by fire time.
    fn pending(&self, alarm_id: &str) -> Vec<PlannedNotification>;
}

/// Keeps notifications in memory, keyed by notification id.
///
/// An optional cap mirrors platforms that only keep a bounded number of
/// pending notifications per app.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotifier {
    pending: BTreeMap<String, PlannedNotification>,
    limit: Option<usize>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse new notifications once `limit` are pending.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            limit: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Everything pending, ordered by fire time.
    pub fn all(&self) -> Vec<PlannedNotification> {
        let mut all: Vec<_> = self.pending.values().cloned().collect();
        all.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.notification_id.cmp(&b.notification_id)));
        all
    }
}

impl Notifier for InMemoryNotifier {
    fn schedule(&mut self, notification: &PlannedNotification) -> Result<()> {
        let is_new = !self.pending.contains_key(&notification.notification_id);
        if let Some(limit) = self.limit.filter(|limit| is_new && self.pending.len() >= *limit) {
            return Err(CoreError::Notify {
                alarm_id: notification.alarm_id.clone(),
                message: format!("pending limit of {limit} reached"),
            });
        }
        self.pending
            .insert(notification.notification_id.clone(), notification.clone());
        Ok(())
    }

    fn cancel_alarm(&mut self, alarm_id: &str) -> Result<usize> {
        let before = self.pending.len();
        self.pending.retain(|_, n| n.alarm_id != alarm_id);
        Ok(before - self.pending.len())
    }

    fn pending(&self, alarm_id: &str) -> Vec<PlannedNotification> {
        let mut pending: Vec<_> = self
            .pending
            .values()
            .filter(|n| n.alarm_id == alarm_id)
            .cloned()
            .collect();
        pending.sort_by_key(|n| n.fire_at);
        pending
    }
}
