use clap::Args;
use shiftalarm_core::{AlarmDb, Config};

use super::{print_json, resolve_pattern, service, CliResult};

#[derive(Args)]
pub struct PreviewArgs {
    /// Pattern id, defaults to the active pattern
    #[arg(long)]
    pattern: Option<String>,
    /// Number of days, defaults to `scheduling.preview_days`
    #[arg(long, allow_negative_numbers = true)]
    days: Option<i64>,
}

pub fn run(args: PreviewArgs) -> CliResult {
    let db = AlarmDb::open()?;
    let config = Config::load()?;
    let service = service(&config);
    let pattern = resolve_pattern(&db, args.pattern.as_deref())?;

    let rows = match args.days {
        Some(days) => service.upcoming_shifts(&pattern, days)?,
        None => service.preview(&pattern),
    };
    print_json(&rows)
}
