//! # Shift Alarm Core Library
//!
//! This library provides the core logic for Shift Alarm, an alarm clock for
//! people working rotating shifts. Alarm timing is derived from an N-day
//! repeating cycle anchored to a start date rather than from fixed weekdays.
//! All operations are also available through the `shiftalarm-cli` binary.
//!
//! ## Architecture
//!
//! - **Shift engine**: pure date arithmetic mapping any calendar date to a
//!   shift, finding the next occurrence of a shift and listing upcoming ones
//! - **Alarms**: declarative shift alarms and classic weekday alarms
//! - **Scheduling**: clock-aware service producing today's shift and
//!   day-by-day previews
//! - **Notifications**: planning concrete fire instants and keeping a
//!   platform notifier in sync over a rolling horizon
//! - **Storage**: flat persisted records, SQLite store and TOML configuration
//!
//! ## Key Components
//!
//! - [`ShiftPattern`]: The cycle engine
//! - [`SchedulingService`]: Today's shift, previews, notification sync
//! - [`AlarmDb`]: Pattern and alarm persistence
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod clock;
pub mod error;
pub mod notify;
pub mod scheduling;
pub mod shift;
pub mod storage;

pub use alarm::{AlarmKind, AlarmSettings, AlarmState, AlarmTone, BasicAlarm, ShiftAlarm, ShiftAlarmUpdate};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use notify::{InMemoryNotifier, Notifier, PlannedNotification, SyncReport};
pub use scheduling::{DayPreview, SchedulingConfig, SchedulingService};
pub use shift::{PatternPreset, PatternUpdate, ShiftPattern, ShiftType};
pub use storage::{AlarmDb, Config, InMemoryPatterns, PatternRepository};
