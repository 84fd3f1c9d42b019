//! Shift lookups for CLI.

use clap::Subcommand;
use shiftalarm_core::{AlarmDb, Config};

use super::{parse_date, parse_shift, parse_targets, print_json, resolve_pattern, service, CliResult};

#[derive(Subcommand)]
pub enum ShiftAction {
    /// Today's shift
    Today {
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Shift on a given date (YYYY-MM-DD)
    On {
        date: String,
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Next date with the given shift, from today
    Next {
        /// Shift code or name, e.g. "N" or "night"
        shift: String,
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Dates in the coming days whose shift is one of the given codes
    Upcoming {
        /// Shift codes, e.g. "DN"
        codes: String,
        /// Number of days to scan, starting today
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
        #[arg(long)]
        pattern: Option<String>,
    },
}

pub fn run(action: ShiftAction) -> CliResult {
    let db = AlarmDb::open()?;
    let config = Config::load()?;
    let service = service(&config);

    match action {
        ShiftAction::Today { pattern } => {
            let pattern = resolve_pattern(&db, pattern.as_deref())?;
            let today = service.today();
            let shift = pattern.shift_for_date(today);
            print_json(&serde_json::json!({
                "pattern_id": pattern.id(),
                "date": today,
                "shift": shift,
                "code": shift.short_code().to_string(),
                "cycle_position": pattern.cycle_position(today),
            }))?;
        }
        ShiftAction::On { date, pattern } => {
            let pattern = resolve_pattern(&db, pattern.as_deref())?;
            let date = parse_date(&date)?;
            let shift = pattern.shift_for_date(date);
            print_json(&serde_json::json!({
                "pattern_id": pattern.id(),
                "date": date,
                "shift": shift,
                "code": shift.short_code().to_string(),
                "cycle_position": pattern.cycle_position(date),
            }))?;
        }
        ShiftAction::Next { shift, pattern } => {
            let pattern = resolve_pattern(&db, pattern.as_deref())?;
            let target = parse_shift(&shift)?;
            let today = service.today();
            let horizon = service.config().next_shift_search_days;
            let found = pattern.next_shift_date(target, today, horizon);
            if found.is_none() {
                eprintln!("no {target} shift within {horizon} days");
            }
            print_json(&serde_json::json!({
                "pattern_id": pattern.id(),
                "shift": target,
                "from": today,
                "date": found,
                "horizon_days": horizon,
            }))?;
        }
        ShiftAction::Upcoming {
            codes,
            days,
            pattern,
        } => {
            let pattern = resolve_pattern(&db, pattern.as_deref())?;
            let targets = parse_targets(&codes)?;
            let days = days.unwrap_or_else(|| i64::from(config.scheduling.preview_days));
            let dates = service.upcoming_dates(&pattern, &targets, days)?;
            print_json(&dates)?;
        }
    }
    Ok(())
}
