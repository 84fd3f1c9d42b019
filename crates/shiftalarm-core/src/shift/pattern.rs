//! The shift-cycle engine.
//!
//! Every query is a pure function of `(start_date, cycle, date)`. Dates are
//! [`NaiveDate`]s, so time-of-day and timezone offsets never enter the
//! arithmetic; callers holding a timestamp use [`ShiftPattern::shift_at`].
//!
//! ```text
//! start 2024-01-01, cycle D D N N O O
//!
//!   Dec 30  Dec 31 | Jan 1  Jan 2  Jan 3  Jan 4  Jan 5  Jan 6 | Jan 7
//!     O       O    |   D      D      N      N      O      O   |   D
//!    -2      -1    |   0      1      2      3      4      5   |   0
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{PatternPreset, ShiftType};
use crate::error::ValidationError;
use crate::storage::record::truncate_to_millis;

/// Forward search window of [`ShiftPattern::next_shift_date_default`].
pub const DEFAULT_SEARCH_HORIZON_DAYS: u32 = 60;

/// A fixed-length shift cycle anchored to a start date.
///
/// Values are immutable once built. [`ShiftPattern::update`] returns a new
/// version carrying the same id, so alarms holding the id stay valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftPattern {
    id: String,
    name: String,
    cycle: Vec<ShiftType>,
    start_date: NaiveDate,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

/// Field overrides for [`ShiftPattern::update`]. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct PatternUpdate {
    pub name: Option<String>,
    pub cycle: Option<Vec<ShiftType>>,
    pub start_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl ShiftPattern {
    /// Create an active pattern with a fresh id.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyCycle`] if `cycle` is empty.
    pub fn new(
        name: impl Into<String>,
        cycle: Vec<ShiftType>,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::from_parts(
            Uuid::new_v4().to_string(),
            name.into(),
            cycle,
            start_date,
            true,
            now,
            None,
        )
    }

    /// Rebuild a pattern from stored fields.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyCycle`] if `cycle` is empty.
    pub fn from_parts(
        id: String,
        name: String,
        cycle: Vec<ShiftType>,
        start_date: NaiveDate,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if cycle.is_empty() {
            return Err(ValidationError::EmptyCycle);
        }
        Ok(Self {
            id,
            name,
            cycle,
            start_date,
            is_active,
            created_at: truncate_to_millis(created_at),
            updated_at: updated_at.map(truncate_to_millis),
        })
    }

    pub fn from_preset(
        preset: PatternPreset,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: preset.name().to_string(),
            cycle: preset.cycle(),
            start_date,
            is_active: true,
            created_at: truncate_to_millis(now),
            updated_at: None,
        }
    }

    /// The pattern seeded on first run: two days, two nights, two off,
    /// starting today.
    pub fn sample(today: NaiveDate, now: DateTime<Utc>) -> Self {
        let mut pattern = Self::from_preset(PatternPreset::TwoDaysTwoNightsTwoOff, today, now);
        pattern.name = "Sample Rotation".to_string();
        tracing::info!(id = %pattern.id, start = %today, "seeded sample shift pattern");
        pattern
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cycle(&self) -> &[ShiftType] {
        &self.cycle
    }

    /// Number of days before the cycle repeats. Always at least 1.
    pub fn cycle_duration(&self) -> usize {
        self.cycle.len()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// How many days of each shift type one cycle contains.
    pub fn shift_counts(&self) -> BTreeMap<ShiftType, usize> {
        let mut counts = BTreeMap::new();
        for shift in &self.cycle {
            *counts.entry(*shift).or_insert(0) += 1;
        }
        counts
    }

    // ── Copy-with-override ───────────────────────────────────────────

    /// Return a new version with the given overrides applied and
    /// `updated_at` set to `now`. `self` is left untouched.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyCycle`] if the override empties the cycle.
    pub fn update(&self, changes: PatternUpdate, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Self::from_parts(
            self.id.clone(),
            changes.name.unwrap_or_else(|| self.name.clone()),
            changes.cycle.unwrap_or_else(|| self.cycle.clone()),
            changes.start_date.unwrap_or(self.start_date),
            changes.is_active.unwrap_or(self.is_active),
            self.created_at,
            Some(now),
        )
    }

    // ── Cycle arithmetic ─────────────────────────────────────────────

    /// Zero-based index into the cycle for `date`.
    ///
    /// Dates before the start date count backwards; `rem_euclid` keeps the
    /// result in `0..cycle_duration` for negative offsets.
    pub fn cycle_position(&self, date: NaiveDate) -> usize {
        let days_since_start = date.signed_duration_since(self.start_date).num_days();
        let len = self.cycle.len() as i64;
        days_since_start.rem_euclid(len) as usize
    }

    pub fn shift_for_date(&self, date: NaiveDate) -> ShiftType {
        self.cycle[self.cycle_position(date)]
    }

    /// Shift for the calendar day `at` falls on in its own timezone.
    pub fn shift_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> ShiftType {
        self.shift_for_date(at.date_naive())
    }

    /// First date on or after `from` whose shift is `target`, looking at most
    /// `horizon_days` days ahead (`from` included). `None` when nothing
    /// matches inside the window.
    pub fn next_shift_date(
        &self,
        target: ShiftType,
        from: NaiveDate,
        horizon_days: u32,
    ) -> Option<NaiveDate> {
        from.iter_days()
            .take(horizon_days as usize)
            .find(|date| self.shift_for_date(*date) == target)
    }

    /// [`Self::next_shift_date`] over [`DEFAULT_SEARCH_HORIZON_DAYS`].
    pub fn next_shift_date_default(&self, target: ShiftType, from: NaiveDate) -> Option<NaiveDate> {
        self.next_shift_date(target, from, DEFAULT_SEARCH_HORIZON_DAYS)
    }

    /// Every date in `[from, from + days_ahead)` whose shift is in `targets`,
    /// ascending.
    ///
    /// # Errors
    /// Returns [`ValidationError::NegativeDays`] if `days_ahead` is negative.
    pub fn upcoming_shifts(
        &self,
        targets: &BTreeSet<ShiftType>,
        from: NaiveDate,
        days_ahead: i64,
    ) -> Result<Vec<NaiveDate>, ValidationError> {
        if days_ahead < 0 {
            return Err(ValidationError::NegativeDays {
                field: "days_ahead",
                value: days_ahead,
            });
        }
        Ok(from
            .iter_days()
            .take(days_ahead as usize)
            .filter(|date| targets.contains(&self.shift_for_date(*date)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::parse_cycle;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pattern(codes: &str, start: NaiveDate) -> ShiftPattern {
        ShiftPattern::new("test", parse_cycle(codes).unwrap(), start, Utc::now()).unwrap()
    }

    #[test]
    fn empty_cycle_is_rejected() {
        let result = ShiftPattern::new("empty", vec![], date(2024, 1, 1), Utc::now());
        assert_eq!(result, Err(ValidationError::EmptyCycle));
    }

    #[test]
    fn reference_rotation() {
        let p = pattern("DDNNOO", date(2024, 1, 1));
        let got: Vec<_> = (1..=6).map(|d| p.shift_for_date(date(2024, 1, d))).collect();
        use ShiftType::*;
        assert_eq!(got, vec![Day, Day, Night, Night, Off, Off]);
        assert_eq!(p.shift_for_date(date(2024, 1, 7)), Day);
        assert_eq!(p.shift_for_date(date(2024, 1, 9)), Night);
    }

    #[test]
    fn dates_before_start_wrap_backwards() {
        let p = pattern("DNO", date(2024, 1, 5));
        assert_eq!(p.shift_for_date(date(2024, 1, 4)), ShiftType::Off);
        assert_eq!(p.shift_for_date(date(2024, 1, 3)), ShiftType::Night);
        assert_eq!(p.shift_for_date(date(2024, 1, 2)), ShiftType::Day);
        assert_eq!(p.cycle_position(date(2023, 1, 5)), 2);
    }

    #[test]
    fn leap_day_is_counted() {
        let p = pattern("DO", date(2024, 2, 28));
        assert_eq!(p.shift_for_date(date(2024, 2, 28)), ShiftType::Day);
        assert_eq!(p.shift_for_date(date(2024, 2, 29)), ShiftType::Off);
        assert_eq!(p.shift_for_date(date(2024, 3, 1)), ShiftType::Day);
    }

    #[test]
    fn year_boundary_is_continuous() {
        let p = pattern("DN", date(2023, 12, 31));
        assert_eq!(p.shift_for_date(date(2023, 12, 31)), ShiftType::Day);
        assert_eq!(p.shift_for_date(date(2024, 1, 1)), ShiftType::Night);
        assert_eq!(p.shift_for_date(date(2024, 1, 2)), ShiftType::Day);
    }

    #[test]
    fn single_day_cycle_is_constant() {
        let p = pattern("N", date(2024, 6, 1));
        for offset in -400..400 {
            let d = date(2024, 6, 1) + chrono::Duration::days(offset);
            assert_eq!(p.shift_for_date(d), ShiftType::Night);
        }
    }

    #[test]
    fn shift_at_ignores_time_of_day() {
        let p = pattern("DNO", date(2024, 1, 1));
        let morning = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 1).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap();
        assert_eq!(p.shift_at(&morning), ShiftType::Night);
        assert_eq!(p.shift_at(&evening), ShiftType::Night);
    }

    #[test]
    fn next_shift_date_includes_from() {
        let p = pattern("DDNNOO", date(2024, 1, 1));
        assert_eq!(
            p.next_shift_date_default(ShiftType::Day, date(2024, 1, 1)),
            Some(date(2024, 1, 1))
        );
        assert_eq!(
            p.next_shift_date_default(ShiftType::Off, date(2024, 1, 1)),
            Some(date(2024, 1, 5))
        );
    }

    #[test]
    fn next_shift_date_is_none_when_absent() {
        let p = pattern("DN", date(2024, 1, 1));
        assert_eq!(p.next_shift_date_default(ShiftType::Off, date(2024, 1, 1)), None);
    }

    #[test]
    fn next_shift_date_respects_horizon() {
        let mut cycle = vec![ShiftType::Day; 90];
        cycle.push(ShiftType::Night);
        let p = ShiftPattern::new("long", cycle, date(2024, 1, 1), Utc::now()).unwrap();
        assert_eq!(p.next_shift_date_default(ShiftType::Night, date(2024, 1, 1)), None);
        assert_eq!(
            p.next_shift_date(ShiftType::Night, date(2024, 1, 1), 120),
            Some(date(2024, 3, 31))
        );
        assert_eq!(p.next_shift_date(ShiftType::Day, date(2024, 1, 1), 0), None);
    }

    #[test]
    fn upcoming_shifts_window() {
        let p = pattern("DDNNOO", date(2024, 1, 1));
        let days = BTreeSet::from([ShiftType::Day]);
        assert_eq!(
            p.upcoming_shifts(&days, date(2024, 1, 1), 6).unwrap(),
            vec![date(2024, 1, 1), date(2024, 1, 2)]
        );
        let worked = BTreeSet::from([ShiftType::Day, ShiftType::Night]);
        assert_eq!(p.upcoming_shifts(&worked, date(2024, 1, 1), 6).unwrap().len(), 4);
        assert!(p.upcoming_shifts(&worked, date(2024, 1, 1), 0).unwrap().is_empty());
    }

    #[test]
    fn upcoming_shifts_rejects_negative() {
        let p = pattern("DDNNOO", date(2024, 1, 1));
        let err = p
            .upcoming_shifts(&BTreeSet::from([ShiftType::Day]), date(2024, 1, 1), -1)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NegativeDays {
                field: "days_ahead",
                value: -1
            }
        );
    }

    #[test]
    fn update_returns_new_version() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        let original =
            ShiftPattern::new("Crew A", parse_cycle("DNO").unwrap(), date(2024, 1, 1), created).unwrap();
        let renamed = original
            .update(
                PatternUpdate {
                    name: Some("Crew B".into()),
                    ..Default::default()
                },
                later,
            )
            .unwrap();

        assert_eq!(original.name(), "Crew A");
        assert_eq!(original.updated_at(), None);
        assert_eq!(renamed.id(), original.id());
        assert_eq!(renamed.name(), "Crew B");
        assert_eq!(renamed.cycle(), original.cycle());
        assert_eq!(renamed.created_at(), created);
        assert_eq!(renamed.updated_at(), Some(later));

        let emptied = original.update(
            PatternUpdate {
                cycle: Some(vec![]),
                ..Default::default()
            },
            later,
        );
        assert_eq!(emptied, Err(ValidationError::EmptyCycle));
    }

    #[test]
    fn shift_counts_per_cycle() {
        let p = pattern("DDNNNO", date(2024, 1, 1));
        let counts = p.shift_counts();
        assert_eq!(counts[&ShiftType::Day], 2);
        assert_eq!(counts[&ShiftType::Night], 3);
        assert_eq!(counts[&ShiftType::Off], 1);
    }

    #[test]
    fn sample_pattern_starts_today() {
        let today = date(2025, 3, 10);
        let p = ShiftPattern::sample(today, Utc::now());
        assert_eq!(p.start_date(), today);
        assert_eq!(p.shift_for_date(today), ShiftType::Day);
        assert_eq!(p.cycle_duration(), 6);
        assert!(p.is_active());
    }
}
