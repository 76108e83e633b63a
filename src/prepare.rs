//! Dataset preparation: typed dates and per-item sprint boundaries.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::calendar::SprintCalendar;
use crate::config::KpiConfig;
use crate::models::{ColumnPresence, Dataset, PreparedDataset, PreparedWorkItem, WorkItemRecord};

static SPRINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Sprint (\d+)").expect("sprint pattern is valid"));

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Format of normalized timestamps written back into prepared records.
pub const NORMALIZED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const SPRINT_NUM_COLUMN: &str = "sprint_num";
pub const SPRINT_START_COLUMN: &str = "sprint_start";
pub const SPRINT_END_COLUMN: &str = "sprint_end";
pub const SPRINT_END_TOL_COLUMN: &str = "sprint_end_tol";

/// Sprint number from an iteration label, e.g. `Team\Sprint 34` -> 34.
///
/// Only the first `Sprint <digits>` run counts; the match is case-sensitive.
pub fn extract_sprint_number(label: &str) -> Option<i64> {
    SPRINT_RE
        .captures(label)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Parse a timestamp cell into a naive UTC instant.
///
/// Offsets are converted to UTC and dropped; values without an offset are
/// taken as UTC already. Anything unparseable is `None`.
pub fn parse_instant(value: &Value) -> Option<NaiveDateTime> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(text, format) {
            return Some(instant.naive_utc());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(instant) = NaiveDateTime::parse_from_str(text, format) {
            return Some(instant);
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Normalize dates and attach sprint boundaries to every row.
///
/// Date columns missing from the whole dataset are left alone. When the
/// iteration column is missing no sprint columns are added at all.
pub fn prepare_dataset(dataset: &Dataset, config: &KpiConfig) -> PreparedDataset {
    let fields = &config.fields;
    let columns = ColumnPresence {
        item_type: dataset.has_column(&fields.item_type),
        iteration: dataset.has_column(&fields.iteration),
        solution_type: dataset.has_column(&fields.solution_type),
        created: dataset.has_column(&fields.created),
        closed: dataset.has_column(&fields.closed),
        activated: dataset.has_column(&fields.activated),
        prospect: dataset.has_column(&fields.prospect),
        analysis: dataset.has_column(&fields.analysis),
    };

    let date_columns: Vec<&str> = fields
        .date_fields()
        .into_iter()
        .filter(|column| dataset.has_column(column))
        .collect();

    let items: Vec<PreparedWorkItem> = dataset
        .rows()
        .iter()
        .map(|row| prepare_row(row, config, &columns, &date_columns))
        .collect();

    debug!(
        rows = items.len(),
        date_columns = date_columns.len(),
        with_sprint = items.iter().filter(|item| item.sprint_num.is_some()).count(),
        "prepared dataset"
    );

    PreparedDataset { items, columns }
}

fn prepare_row(
    row: &WorkItemRecord,
    config: &KpiConfig,
    columns: &ColumnPresence,
    date_columns: &[&str],
) -> PreparedWorkItem {
    let fields = &config.fields;
    let mut record = row.clone();

    for column in date_columns {
        let normalized = row.get(column).and_then(parse_instant);
        record.set(column, format_instant(normalized));
    }

    let instant = |column: &str| row.get(column).and_then(parse_instant);

    let mut item = PreparedWorkItem {
        record,
        item_type: row.text_lossy(&fields.item_type),
        solution_type: row.text_lossy(&fields.solution_type),
        created: instant(&fields.created),
        closed: instant(&fields.closed),
        activated: instant(&fields.activated),
        prospect: instant(&fields.prospect),
        analysis: instant(&fields.analysis),
        sprint_num: None,
        sprint_start: None,
        sprint_end: None,
        sprint_end_tol: None,
    };

    if columns.iteration {
        attach_sprint(&mut item, row.text(&fields.iteration), &config.calendar);
    }

    item
}

fn attach_sprint(item: &mut PreparedWorkItem, label: Option<&str>, calendar: &SprintCalendar) {
    let sprint_num = label.and_then(extract_sprint_number);
    let window = sprint_num.map(|sprint| calendar.resolve(sprint));

    item.sprint_num = sprint_num;
    item.sprint_start = window.and_then(|window| window.start);
    item.sprint_end = window.and_then(|window| window.end);
    item.sprint_end_tol = window.and_then(|window| window.end_tol);

    item.record.set(
        SPRINT_NUM_COLUMN,
        sprint_num.map_or(Value::Null, Value::from),
    );
    item.record.set(SPRINT_START_COLUMN, format_date(item.sprint_start));
    item.record.set(SPRINT_END_COLUMN, format_date(item.sprint_end));
    item.record.set(SPRINT_END_TOL_COLUMN, format_date(item.sprint_end_tol));
}

fn format_instant(instant: Option<NaiveDateTime>) -> Value {
    instant.map_or(Value::Null, |instant| {
        Value::String(instant.format(NORMALIZED_FORMAT).to_string())
    })
}

fn format_date(date: Option<NaiveDate>) -> Value {
    date.map_or(Value::Null, |date| {
        Value::String(date.format(DATE_FORMAT).to_string())
    })
}
