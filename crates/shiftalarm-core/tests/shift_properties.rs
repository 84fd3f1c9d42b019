//! Property tests for the shift engine and the persisted record shapes.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;
use shiftalarm_core::storage::{PatternRecord, ShiftAlarmRecord};
use shiftalarm_core::{AlarmSettings, ShiftAlarm, ShiftPattern, ShiftType};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
}

fn shift_strategy() -> impl Strategy<Value = ShiftType> {
    prop_oneof![Just(ShiftType::Day), Just(ShiftType::Night), Just(ShiftType::Off)]
}

fn cycle_strategy() -> impl Strategy<Value = Vec<ShiftType>> {
    prop::collection::vec(shift_strategy(), 1..40)
}

fn pattern(cycle: Vec<ShiftType>, start_offset: i64) -> ShiftPattern {
    ShiftPattern::new(
        "prop",
        cycle,
        base_date() + Duration::days(start_offset),
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn shift_is_periodic(
        cycle in cycle_strategy(),
        start in -20_000i64..20_000,
        offset in -20_000i64..20_000,
        k in -40i64..40,
    ) {
        let p = pattern(cycle, start);
        let date = base_date() + Duration::days(offset);
        let shifted = date + Duration::days(k * p.cycle_duration() as i64);
        prop_assert_eq!(p.shift_for_date(date), p.shift_for_date(shifted));
    }

    #[test]
    fn shift_is_deterministic_and_position_in_range(
        cycle in cycle_strategy(),
        start in -20_000i64..20_000,
        offset in -20_000i64..20_000,
    ) {
        let p = pattern(cycle, start);
        let date = base_date() + Duration::days(offset);
        let pos = p.cycle_position(date);
        prop_assert!(pos < p.cycle_duration());
        prop_assert_eq!(p.shift_for_date(date), p.cycle()[pos]);
        prop_assert_eq!(p.shift_for_date(date), p.shift_for_date(date));
    }

    #[test]
    fn start_date_is_position_zero(cycle in cycle_strategy(), start in -20_000i64..20_000) {
        let p = pattern(cycle, start);
        prop_assert_eq!(p.cycle_position(p.start_date()), 0);
        prop_assert_eq!(p.shift_for_date(p.start_date()), p.cycle()[0]);
    }

    #[test]
    fn next_shift_date_finds_first_match(
        cycle in cycle_strategy(),
        target in shift_strategy(),
        offset in -500i64..500,
    ) {
        let p = pattern(cycle, 0);
        let from = base_date() + Duration::days(offset);
        match p.next_shift_date_default(target, from) {
            Some(found) => {
                prop_assert_eq!(p.shift_for_date(found), target);
                prop_assert!(found >= from);
                let mut day = from;
                while day < found {
                    prop_assert_ne!(p.shift_for_date(day), target);
                    day = day.succ_opt().unwrap();
                }
            }
            // Cycles shorter than the horizon contain every shift they will ever have.
            None => prop_assert!(!p.cycle().contains(&target)),
        }
    }

    #[test]
    fn upcoming_shifts_are_ascending_and_match(
        cycle in cycle_strategy(),
        targets in prop::collection::btree_set(shift_strategy(), 1..=3),
        days in 0i64..120,
    ) {
        let p = pattern(cycle, 0);
        let from = base_date();
        let dates = p.upcoming_shifts(&targets, from, days).unwrap();
        prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(dates.iter().all(|d| targets.contains(&p.shift_for_date(*d))));
        let expected = (0..days)
            .filter(|i| targets.contains(&p.shift_for_date(from + Duration::days(*i))))
            .count();
        prop_assert_eq!(dates.len(), expected);
    }

    #[test]
    fn pattern_record_round_trips(
        cycle in cycle_strategy(),
        start in -20_000i64..20_000,
        active in any::<bool>(),
        created_ms in 0i64..4_000_000_000_000,
        updated_ms in prop::option::of(0i64..4_000_000_000_000),
        name in "\\PC{0,24}",
    ) {
        let original = ShiftPattern::from_parts(
            "pattern-id".into(),
            name,
            cycle,
            base_date() + Duration::days(start),
            active,
            DateTime::from_timestamp_millis(created_ms).unwrap(),
            updated_ms.map(|ms| DateTime::from_timestamp_millis(ms).unwrap()),
        )
        .unwrap();
        let json = serde_json::to_string(&PatternRecord::from(&original)).unwrap();
        let record: PatternRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(record.into_pattern().unwrap(), original);
    }

    #[test]
    fn shift_alarm_record_round_trips(
        targets in prop::collection::btree_set(shift_strategy(), 1..=3),
        hour in 0u32..24,
        minute in 0u32..60,
        active in any::<bool>(),
        vibration in any::<bool>(),
        sound_enabled in any::<bool>(),
        sound_path in prop::option::of("[a-z/]{1,16}\\.mp3"),
        snooze_enabled in any::<bool>(),
        snooze_minutes in 1u32..=60,
        max_snooze_count in 0u32..=10,
        title in "\\PC{0,24}",
        created_ms in 0i64..4_000_000_000_000,
    ) {
        let original = ShiftAlarm::from_parts(
            "alarm-id".into(),
            "pattern-id".into(),
            targets,
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            title,
            "Your {shift} shift".into(),
            active,
            AlarmSettings {
                vibration,
                sound_enabled,
                sound_path,
                snooze_enabled,
                snooze_minutes,
                max_snooze_count,
            },
            DateTime::from_timestamp_millis(created_ms).unwrap(),
        )
        .unwrap();
        let json = serde_json::to_string(&ShiftAlarmRecord::from(&original)).unwrap();
        let record: ShiftAlarmRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(record.into_alarm().unwrap(), original);
    }
}

#[test]
fn single_day_cycle_is_constant() {
    let p = pattern(vec![ShiftType::Night], 0);
    let every: BTreeSet<ShiftType> = (-400..400)
        .map(|i| p.shift_for_date(base_date() + Duration::days(i)))
        .collect();
    assert_eq!(every, BTreeSet::from([ShiftType::Night]));
}
