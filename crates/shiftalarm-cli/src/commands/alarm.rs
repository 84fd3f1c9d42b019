//! Alarm management commands for CLI.

use chrono::NaiveDateTime;
use clap::Subcommand;
use serde::Serialize;
use shiftalarm_core::alarm::parse_time_of_day;
use shiftalarm_core::{AlarmDb, AlarmState, AlarmTone, BasicAlarm, Clock, Config, ShiftAlarm, SystemClock};

use super::{parse_targets, print_json, resolve_pattern, CliResult};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Add an alarm that rings on every day with one of the given shifts
    AddShift {
        /// Shift codes to ring for, e.g. "DN"
        targets: String,
        /// Time of day (HH:MM, 24h)
        time: String,
        #[arg(long)]
        title: Option<String>,
        /// Message; "{shift}" is replaced by the shift name
        #[arg(long)]
        message: Option<String>,
        /// Pattern id, defaults to the active pattern
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        snooze_minutes: Option<u32>,
        #[arg(long)]
        no_snooze: bool,
        /// Custom sound file
        #[arg(long)]
        sound: Option<String>,
    },
    /// Add a one-time or weekday-repeating alarm
    AddBasic {
        label: String,
        /// Time of day (HH:MM, 24h)
        time: String,
        /// Repeat weekdays, 1 = Monday .. 7 = Sunday, e.g. "1,2,3"
        #[arg(long, value_delimiter = ',')]
        days: Vec<u8>,
        /// Tone code (classic, gentle, digital, bell, chime)
        #[arg(long)]
        tone: Option<String>,
        /// 0.0 to 1.0
        #[arg(long)]
        volume: Option<f32>,
    },
    /// List all alarms
    List,
    /// Flip an alarm between active and inactive
    Toggle {
        id: String,
    },
    /// Delete an alarm
    Delete {
        id: String,
    },
}

#[derive(Serialize)]
struct ShiftAlarmView<'a> {
    #[serde(flatten)]
    alarm: &'a ShiftAlarm,
    state: AlarmState,
}

#[derive(Serialize)]
struct BasicAlarmView<'a> {
    #[serde(flatten)]
    alarm: &'a BasicAlarm,
    state: AlarmState,
    next: Option<NaiveDateTime>,
}

fn basic_view(alarm: &BasicAlarm, now: NaiveDateTime) -> BasicAlarmView<'_> {
    BasicAlarmView {
        alarm,
        state: alarm.state(now),
        next: alarm.next_occurrence(now),
    }
}

fn shift_view(alarm: &ShiftAlarm) -> ShiftAlarmView<'_> {
    ShiftAlarmView {
        alarm,
        state: alarm.state(),
    }
}

pub fn run(action: AlarmAction) -> CliResult {
    let db = AlarmDb::open()?;
    let config = Config::load()?;
    let clock = SystemClock;
    let created_at = clock.now_utc();
    let now = clock.now_local();

    match action {
        AlarmAction::AddShift {
            targets,
            time,
            title,
            message,
            pattern,
            snooze_minutes,
            no_snooze,
            sound,
        } => {
            let pattern = resolve_pattern(&db, pattern.as_deref())?;
            let targets = parse_targets(&targets)?;
            let mut settings = config.alarm_settings();
            if let Some(minutes) = snooze_minutes {
                settings.snooze_minutes = minutes;
            }
            if no_snooze {
                settings.snooze_enabled = false;
            }
            settings.sound_path = sound;

            let title = title.unwrap_or_else(|| {
                let names: Vec<&str> = targets.iter().map(|s| s.display_name()).collect();
                format!("{} shift", names.join("/"))
            });
            let alarm = ShiftAlarm::new(
                pattern.id(),
                targets,
                parse_time_of_day(&time)?,
                title,
                message,
                settings,
                created_at,
            )?;
            db.save_shift_alarm(&alarm)?;
            print_json(&shift_view(&alarm))?;
        }
        AlarmAction::AddBasic {
            label,
            time,
            days,
            tone,
            volume,
        } => {
            let tone = match tone {
                Some(code) => AlarmTone::from_code(&code).ok_or_else(|| format!("unknown tone: {code}"))?,
                None => config.alarm_defaults.tone,
            };
            let volume = volume.unwrap_or(config.alarm_defaults.volume as f32);
            let alarm = BasicAlarm::new(
                label,
                parse_time_of_day(&time)?,
                days.into_iter().collect(),
                tone,
                volume,
                created_at,
            )?;
            db.save_basic_alarm(&alarm)?;
            print_json(&basic_view(&alarm, now))?;
        }
        AlarmAction::List => {
            let shift_alarms = db.list_shift_alarms()?;
            let basic_alarms = db.list_basic_alarms()?;
            print_json(&serde_json::json!({
                "shift_alarms": shift_alarms.iter().map(shift_view).collect::<Vec<_>>(),
                "basic_alarms": basic_alarms.iter().map(|a| basic_view(a, now)).collect::<Vec<_>>(),
            }))?;
        }
        AlarmAction::Toggle { id } => {
            if let Some(alarm) = db.get_shift_alarm(&id)? {
                let toggled = alarm.with_active(!alarm.is_active());
                db.save_shift_alarm(&toggled)?;
                print_json(&shift_view(&toggled))?;
            } else if let Some(alarm) = db.get_basic_alarm(&id)? {
                let toggled = alarm.with_active(!alarm.is_active());
                db.save_basic_alarm(&toggled)?;
                print_json(&basic_view(&toggled, now))?;
            } else {
                return Err(format!("alarm not found: {id}").into());
            }
        }
        AlarmAction::Delete { id } => {
            if !db.delete_shift_alarm(&id)? && !db.delete_basic_alarm(&id)? {
                return Err(format!("alarm not found: {id}").into());
            }
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
    }
    Ok(())
}
