use clap::Subcommand;
use serde::Serialize;
use shiftalarm_core::{
    AlarmDb, AlarmState, Clock, Config, FixedClock, InMemoryNotifier, PlannedNotification, SystemClock,
};

use super::{print_json, service_with, CliResult};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Show every notification that should be pending right now
    Plan {
        /// Rolling window in days, defaults to `scheduling.notification_horizon_days`
        #[arg(long)]
        horizon: Option<u32>,
    },
}

#[derive(Serialize)]
struct NotificationView {
    #[serde(flatten)]
    notification: PlannedNotification,
    state: AlarmState,
}

pub fn run(action: NotifyAction) -> CliResult {
    let db = AlarmDb::open()?;
    let mut config = Config::load()?;

    match action {
        NotifyAction::Plan { horizon } => {
            if let Some(days) = horizon {
                config.scheduling.notification_horizon_days = days;
            }
            // Frozen so the plan and the reported states share one instant.
            let service = service_with(&config, FixedClock::new(SystemClock.now_local()));
            let shift_alarms = db.list_shift_alarms()?;
            let basic_alarms = db.list_basic_alarms()?;

            let mut notifier = InMemoryNotifier::new();
            let report = service.sync(&mut notifier, &db, &shift_alarms, &basic_alarms)?;
            let now = service.clock().now_local();
            let notifications: Vec<NotificationView> = notifier
                .all()
                .into_iter()
                .map(|notification| NotificationView {
                    state: notification.state(now),
                    notification,
                })
                .collect();
            for alarm_id in &report.missing_patterns {
                eprintln!("warning: alarm {alarm_id} references a deleted pattern");
            }
            print_json(&serde_json::json!({
                "horizon_days": config.scheduling.notification_horizon_days,
                "report": report,
                "notifications": notifications,
            }))?;
        }
    }
    Ok(())
}
