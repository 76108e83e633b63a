use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Nominal sprint length used to extrapolate sprints missing from the table.
pub const DAYS_PER_SPRINT: i64 = 21;

/// Sprint end dates of the reference project as `(sprint, year, month, day)`.
pub const REFERENCE_CALENDAR: &[(i64, i32, u32, u32)] = &[
    (28, 2025, 8, 8),
    (29, 2025, 8, 29),
    (30, 2025, 9, 19),
    (31, 2025, 10, 10),
    (32, 2025, 10, 31),
    (33, 2025, 11, 21),
    (34, 2025, 12, 12),
    (35, 2026, 1, 23),
    (36, 2026, 2, 13),
];

/// Maps sprint numbers to sprint end dates.
///
/// Tabled entries are authoritative. Any other sprint is extrapolated
/// linearly from the highest-numbered entry (the reference sprint) using a
/// fixed sprint length, in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintCalendar {
    entries: BTreeMap<i64, NaiveDate>,
    sprint_length_days: i64,
}

/// Resolved boundaries of one sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SprintWindow {
    pub sprint: i64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// End date plus the one-day grace tolerance.
    pub end_tol: Option<NaiveDate>,
}

impl SprintCalendar {
    /// Build a calendar from explicit entries. Validation of the entries is
    /// the caller's job (see [`crate::config::KpiConfig::from_toml_str`]);
    /// an empty table simply resolves nothing outside of it.
    pub fn new(entries: BTreeMap<i64, NaiveDate>, sprint_length_days: i64) -> Self {
        Self {
            entries,
            sprint_length_days,
        }
    }

    pub fn entries(&self) -> &BTreeMap<i64, NaiveDate> {
        &self.entries
    }

    pub fn sprint_length_days(&self) -> i64 {
        self.sprint_length_days
    }

    /// The highest-numbered entry, anchoring the extrapolation.
    pub fn reference(&self) -> Option<(i64, NaiveDate)> {
        self.entries
            .last_key_value()
            .map(|(sprint, date)| (*sprint, *date))
    }

    /// End date of `sprint`: the tabled date, or
    /// `reference_date - (reference_sprint - sprint) * sprint_length` days.
    ///
    /// Returns `None` only when the table is empty or the result falls
    /// outside the representable date range.
    pub fn resolve_end_date(&self, sprint: i64) -> Option<NaiveDate> {
        if let Some(date) = self.entries.get(&sprint) {
            return Some(*date);
        }

        let (reference_sprint, reference_date) = self.reference()?;
        let days = reference_sprint
            .checked_sub(sprint)?
            .checked_mul(self.sprint_length_days)?;
        reference_date.checked_sub_signed(Duration::try_days(days)?)
    }

    /// Start date of `sprint`: the day after the previous sprint ends.
    pub fn resolve_start_date(&self, sprint: i64) -> Option<NaiveDate> {
        self.resolve_end_date(sprint.checked_sub(1)?)?.succ_opt()
    }

    pub fn resolve(&self, sprint: i64) -> SprintWindow {
        let end = self.resolve_end_date(sprint);
        SprintWindow {
            sprint,
            start: self.resolve_start_date(sprint),
            end,
            end_tol: end.and_then(|date| date.succ_opt()),
        }
    }
}

impl Default for SprintCalendar {
    fn default() -> Self {
        let entries = REFERENCE_CALENDAR
            .iter()
            .filter_map(|&(sprint, year, month, day)| {
                NaiveDate::from_ymd_opt(year, month, day).map(|date| (sprint, date))
            })
            .collect();
        Self::new(entries, DAYS_PER_SPRINT)
    }
}
