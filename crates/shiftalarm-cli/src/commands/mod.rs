pub mod alarm;
pub mod config;
pub mod notify;
pub mod pattern;
pub mod preview;
pub mod shift;

use std::collections::BTreeSet;
use std::error::Error;

use chrono::NaiveDate;
use serde::Serialize;
use shiftalarm_core::shift::parse_cycle;
use shiftalarm_core::{
    AlarmDb, Clock, Config, SchedulingService, ShiftPattern, ShiftType, SystemClock, ValidationError,
};

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn service(config: &Config) -> SchedulingService {
    service_with(config, SystemClock)
}

pub fn service_with<C: Clock>(config: &Config, clock: C) -> SchedulingService<C> {
    SchedulingService::new(clock)
        .with_config(config.scheduling.clone())
        .with_alarm_defaults(config.alarm_settings())
}

/// The pattern named by `id`, or the active one when `id` is `None`.
pub fn resolve_pattern(db: &AlarmDb, id: Option<&str>) -> CliResult<ShiftPattern> {
    let id = match id {
        Some(id) => id.to_string(),
        None => db
            .active_pattern_id()?
            .ok_or("no active pattern; run `pattern seed` or `pattern create`")?,
    };
    db.get_pattern(&id)?
        .ok_or_else(|| format!("pattern not found: {id}").into())
}

pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// Accepts a short code (`N`) or a name (`night`).
pub fn parse_shift(s: &str) -> Result<ShiftType, ValidationError> {
    let s = s.trim();
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return ShiftType::from_code(c).ok_or_else(|| ValidationError::UnknownShiftCode(s.to_string()));
    }
    ShiftType::ALL
        .into_iter()
        .find(|shift| shift.display_name().eq_ignore_ascii_case(s))
        .ok_or_else(|| ValidationError::UnknownShiftCode(s.to_string()))
}

/// A set of shift codes such as `DN` or `D,N`.
pub fn parse_targets(s: &str) -> Result<BTreeSet<ShiftType>, ValidationError> {
    let targets: BTreeSet<ShiftType> = parse_cycle(s)?.into_iter().collect();
    if targets.is_empty() {
        return Err(ValidationError::EmptyTargetShifts);
    }
    Ok(targets)
}
