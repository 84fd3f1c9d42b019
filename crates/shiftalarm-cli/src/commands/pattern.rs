//! Shift pattern management commands for CLI.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use serde::Serialize;
use shiftalarm_core::shift::{format_cycle, parse_cycle};
use shiftalarm_core::{AlarmDb, Clock, PatternPreset, PatternUpdate, ShiftPattern, ShiftType, SystemClock};

use super::{parse_date, print_json, resolve_pattern, CliResult};

#[derive(Subcommand)]
pub enum PatternAction {
    /// Create a new pattern from shift codes or a preset
    Create {
        /// Pattern name
        name: String,
        /// Cycle as shift codes, e.g. "DDNNOO"
        #[arg(long, conflicts_with = "preset", required_unless_present = "preset")]
        codes: Option<String>,
        /// Preset key (see `pattern presets`)
        #[arg(long)]
        preset: Option<String>,
        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<String>,
        /// Make this the active pattern
        #[arg(long)]
        activate: bool,
    },
    /// List all patterns
    List,
    /// Show one pattern (the active one by default)
    Show {
        id: Option<String>,
    },
    /// Update fields of a pattern
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        codes: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a pattern and the shift alarms bound to it
    Delete {
        id: String,
    },
    /// Make a pattern the active one
    Use {
        id: String,
    },
    /// List built-in presets
    Presets,
    /// Create the sample pattern if no pattern exists yet
    Seed,
}

#[derive(Serialize)]
struct PatternView<'a> {
    #[serde(flatten)]
    pattern: &'a ShiftPattern,
    codes: String,
    is_current: bool,
    shift_counts: BTreeMap<ShiftType, usize>,
    today: ShiftType,
}

#[derive(Serialize)]
struct PresetView {
    key: PatternPreset,
    name: &'static str,
    codes: &'static str,
    days: usize,
}

fn view<'a>(pattern: &'a ShiftPattern, active_id: Option<&str>, today: NaiveDate) -> PatternView<'a> {
    PatternView {
        pattern,
        codes: format_cycle(pattern.cycle()),
        is_current: active_id == Some(pattern.id()),
        shift_counts: pattern.shift_counts(),
        today: pattern.shift_for_date(today),
    }
}

pub fn run(action: PatternAction) -> CliResult {
    let db = AlarmDb::open()?;
    let today = SystemClock.today();

    match action {
        PatternAction::Create {
            name,
            codes,
            preset,
            start,
            activate,
        } => {
            let cycle = match (codes, preset) {
                (Some(codes), _) => parse_cycle(&codes)?,
                (None, Some(key)) => PatternPreset::from_key(&key)
                    .ok_or_else(|| format!("unknown preset: {key}"))?
                    .cycle(),
                (None, None) => return Err("either --codes or --preset is required".into()),
            };
            let start = match start {
                Some(s) => parse_date(&s)?,
                None => today,
            };
            let pattern = ShiftPattern::new(name, cycle, start, Utc::now())?;
            db.save_pattern(&pattern)?;
            if activate || db.active_pattern_id()?.is_none() {
                db.set_active_pattern_id(Some(pattern.id()))?;
            }
            let active = db.active_pattern_id()?;
            print_json(&view(&pattern, active.as_deref(), today))?;
        }
        PatternAction::List => {
            let active = db.active_pattern_id()?;
            let patterns = db.list_patterns()?;
            let views: Vec<_> = patterns.iter().map(|p| view(p, active.as_deref(), today)).collect();
            print_json(&views)?;
        }
        PatternAction::Show { id } => {
            let pattern = resolve_pattern(&db, id.as_deref())?;
            let active = db.active_pattern_id()?;
            print_json(&view(&pattern, active.as_deref(), today))?;
        }
        PatternAction::Update {
            id,
            name,
            codes,
            start,
            active,
        } => {
            let pattern = resolve_pattern(&db, Some(&id))?;
            let changes = PatternUpdate {
                name,
                cycle: codes.as_deref().map(parse_cycle).transpose()?,
                start_date: start.as_deref().map(parse_date).transpose()?,
                is_active: active,
            };
            let updated = pattern.update(changes, Utc::now())?;
            db.save_pattern(&updated)?;
            let active_id = db.active_pattern_id()?;
            print_json(&view(&updated, active_id.as_deref(), today))?;
        }
        PatternAction::Delete { id } => {
            let removed = db
                .delete_pattern(&id)?
                .ok_or_else(|| format!("pattern not found: {id}"))?;
            print_json(&serde_json::json!({ "deleted": id, "alarms_removed": removed }))?;
        }
        PatternAction::Use { id } => {
            let pattern = resolve_pattern(&db, Some(&id))?;
            db.set_active_pattern_id(Some(pattern.id()))?;
            print_json(&view(&pattern, Some(pattern.id()), today))?;
        }
        PatternAction::Presets => {
            let presets: Vec<PresetView> = PatternPreset::ALL
                .into_iter()
                .map(|key| PresetView {
                    key,
                    name: key.name(),
                    codes: key.codes(),
                    days: key.codes().len(),
                })
                .collect();
            print_json(&presets)?;
        }
        PatternAction::Seed => {
            if let Some(existing) = db.list_patterns()?.into_iter().next() {
                eprintln!("patterns already exist; nothing seeded");
                let active = db.active_pattern_id()?;
                print_json(&view(&existing, active.as_deref(), today))?;
                return Ok(());
            }
            let pattern = ShiftPattern::sample(today, Utc::now());
            db.save_pattern(&pattern)?;
            db.set_active_pattern_id(Some(pattern.id()))?;
            print_json(&view(&pattern, Some(pattern.id()), today))?;
        }
    }
    Ok(())
}
