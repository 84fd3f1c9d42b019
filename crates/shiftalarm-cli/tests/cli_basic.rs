//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify the JSON it prints.

use std::process::Command;

use serde_json::Value;

struct TestCli {
    data_dir: tempfile::TempDir,
}

impl TestCli {
    fn new() -> Self {
        Self {
            data_dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Run a CLI command and return (exit code, stdout, stderr).
    fn run(&self, args: &[&str]) -> (i32, String, String) {
        let output = Command::new(env!("CARGO_BIN_EXE_shiftalarm-cli"))
            .args(args)
            .env("SHIFTALARM_DATA_DIR", self.data_dir.path())
            .env("RUST_LOG", "warn")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);

        (code, stdout, stderr)
    }

    fn json(&self, args: &[&str]) -> Value {
        let (code, stdout, stderr) = self.run(args);
        assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
        serde_json::from_str(&stdout).expect("Failed to parse JSON output")
    }

    fn create_reference_pattern(&self) -> String {
        let created = self.json(&[
            "pattern", "create", "Crew A", "--codes", "DDNNOO", "--start", "2024-01-01",
        ]);
        created["id"].as_str().unwrap().to_string()
    }
}

#[test]
fn test_presets() {
    let cli = TestCli::new();
    let presets = cli.json(&["pattern", "presets"]);
    let presets = presets.as_array().unwrap();
    assert_eq!(presets.len(), 5);
    assert!(presets
        .iter()
        .any(|p| p["key"] == "panama" && p["codes"] == "DDOODDDOODDOOO" && p["days"] == 14));
}

#[test]
fn test_pattern_create_and_lookup() {
    let cli = TestCli::new();
    let id = cli.create_reference_pattern();

    let shown = cli.json(&["pattern", "show"]);
    assert_eq!(shown["id"], id.as_str());
    assert_eq!(shown["codes"], "DDNNOO");
    assert_eq!(shown["is_current"], true);
    assert_eq!(shown["shift_counts"]["night"], 2);

    let jan9 = cli.json(&["shift", "on", "2024-01-09"]);
    assert_eq!(jan9["shift"], "night");
    assert_eq!(jan9["code"], "N");
    assert_eq!(jan9["cycle_position"], 2);

    let before = cli.json(&["shift", "on", "2023-12-31"]);
    assert_eq!(before["shift"], "off");
}

#[test]
fn test_dates_before_start_via_preset() {
    let cli = TestCli::new();
    cli.json(&[
        "pattern", "create", "Rotating", "--preset", "day_night_off", "--start", "2024-01-05",
    ]);
    assert_eq!(cli.json(&["shift", "on", "2024-01-04"])["shift"], "off");
    assert_eq!(cli.json(&["shift", "on", "2024-01-03"])["shift"], "night");
    assert_eq!(cli.json(&["shift", "on", "2024-01-02"])["shift"], "day");
}

#[test]
fn test_preview_and_upcoming() {
    let cli = TestCli::new();
    cli.create_reference_pattern();

    let rows = cli.json(&["preview", "--days", "7"]);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["is_today"], true);
    assert!(rows[1..].iter().all(|r| r["is_today"] == false));

    let default_rows = cli.json(&["preview"]);
    assert_eq!(default_rows.as_array().unwrap().len(), 7);

    // Every six-day window holds exactly two night shifts.
    let nights = cli.json(&["shift", "upcoming", "N", "--days", "6"]);
    assert_eq!(nights.as_array().unwrap().len(), 2);

    let next = cli.json(&["shift", "next", "night"]);
    assert!(next["date"].is_string());
    assert!(next["date"].as_str().unwrap() >= next["from"].as_str().unwrap());
    assert_eq!(next["horizon_days"], 60);
}

#[test]
fn test_negative_days_rejected() {
    let cli = TestCli::new();
    cli.create_reference_pattern();
    let (code, _, stderr) = cli.run(&["preview", "--days", "-1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");
}

#[test]
fn test_shift_requires_a_pattern() {
    let cli = TestCli::new();
    let (code, _, stderr) = cli.run(&["shift", "today"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no active pattern"), "{stderr}");
}

#[test]
fn test_alarm_lifecycle_and_notification_plan() {
    let cli = TestCli::new();
    cli.create_reference_pattern();

    let alarm = cli.json(&["alarm", "add-shift", "N", "17:30", "--message", "{shift} tonight"]);
    let alarm_id = alarm["id"].as_str().unwrap().to_string();
    assert_eq!(alarm["title"], "Night shift");
    assert_eq!(alarm["state"], "active_pending");

    let basic = cli.json(&["alarm", "add-basic", "Gym", "07:00", "--days", "6,7", "--tone", "bell"]);
    assert_eq!(basic["tone"], "bell");

    let plan = cli.json(&["notify", "plan", "--horizon", "30"]);
    let notifications = plan["notifications"].as_array().unwrap();
    let night: Vec<&Value> = notifications
        .iter()
        .filter(|n| n["alarm_id"] == alarm_id.as_str())
        .collect();
    // Ten nights in any 30-day window; tonight may already have passed.
    assert!((9..=10).contains(&night.len()), "{}", night.len());
    assert!(night.iter().all(|n| n["message"] == "Night tonight"));
    assert_eq!(
        notifications.iter().filter(|n| !n["repeat_weekday"].is_null()).count(),
        2
    );
    assert!(notifications.iter().all(|n| n["state"] == "active_pending"));

    let toggled = cli.json(&["alarm", "toggle", &alarm_id]);
    assert_eq!(toggled["is_active"], false);
    let plan = cli.json(&["notify", "plan"]);
    assert_eq!(plan["report"]["inactive_alarms"], 1);
    assert!(plan["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .all(|n| n["alarm_id"] != alarm_id.as_str()));

    cli.json(&["alarm", "delete", &alarm_id]);
    let (code, _, _) = cli.run(&["alarm", "delete", &alarm_id]);
    assert_eq!(code, 1);
}

#[test]
fn test_pattern_delete_cascades() {
    let cli = TestCli::new();
    let id = cli.create_reference_pattern();
    cli.json(&["alarm", "add-shift", "DN", "05:00"]);

    let deleted = cli.json(&["pattern", "delete", &id]);
    assert_eq!(deleted["alarms_removed"], 1);
    let alarms = cli.json(&["alarm", "list"]);
    assert!(alarms["shift_alarms"].as_array().unwrap().is_empty());
    assert!(cli.json(&["pattern", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn test_seed_is_idempotent() {
    let cli = TestCli::new();
    let seeded = cli.json(&["pattern", "seed"]);
    assert_eq!(seeded["name"], "Sample Rotation");
    assert_eq!(seeded["codes"], "DDNNOO");
    assert_eq!(seeded["today"], "day");
    assert_eq!(cli.json(&["shift", "today"])["shift"], "day");

    cli.json(&["pattern", "seed"]);
    assert_eq!(cli.json(&["pattern", "list"]).as_array().unwrap().len(), 1);
}

#[test]
fn test_config_get_set() {
    let cli = TestCli::new();
    let (code, stdout, _) = cli.run(&["config", "get", "scheduling.notification_horizon_days"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");

    let (code, _, _) = cli.run(&["config", "set", "scheduling.preview_days", "10"]);
    assert_eq!(code, 0);
    let list = cli.json(&["config", "list"]);
    assert_eq!(list["scheduling.preview_days"], "10");

    let (code, _, stderr) = cli.run(&["config", "set", "scheduling.bogus", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (code, _, _) = cli.run(&["config", "set", "alarm_defaults.tone", "airhorn"]);
    assert_eq!(code, 1);
}

#[test]
fn test_basic_alarm_notifications_use_configured_defaults() {
    let cli = TestCli::new();
    let (code, _, _) = cli.run(&["config", "set", "alarm_defaults.snooze_minutes", "12"]);
    assert_eq!(code, 0);

    let once = cli.json(&["alarm", "add-basic", "Dentist", "09:30"]);
    let once_id = once["id"].as_str().unwrap().to_string();
    assert_eq!(once["state"], "active_pending");

    let plan = cli.json(&["notify", "plan"]);
    let entries: Vec<&Value> = plan["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["alarm_id"] == once_id.as_str())
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["settings"]["snooze_minutes"], 12);
    assert_eq!(entries[0]["fire_at"], once["next"]);
}
