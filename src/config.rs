use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{SprintCalendar, DAYS_PER_SPRINT};
use crate::error::ConfigError;

pub const PROSPECT_FIELD: &str = "Custom.d583d2dc-0ad4-47a8-b36e-14c73ce0bb26";
pub const ANALYSIS_FIELD: &str = "Custom.53fe01b9-fe2d-4e69-9cb7-a53b6e748c0e";

/// Column names of the work-item export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub item_type: String,
    pub iteration: String,
    pub state: String,
    pub solution_type: String,
    pub created: String,
    pub closed: String,
    pub activated: String,
    pub prospect: String,
    pub analysis: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            item_type: "type".to_string(),
            iteration: "iteration".to_string(),
            state: "state".to_string(),
            solution_type: "tipoSolucao".to_string(),
            created: "createdDate".to_string(),
            closed: "closedDate".to_string(),
            activated: "activatedDate".to_string(),
            prospect: PROSPECT_FIELD.to_string(),
            analysis: ANALYSIS_FIELD.to_string(),
        }
    }
}

impl FieldMap {
    /// Columns holding timestamps, normalized during preparation.
    pub fn date_fields(&self) -> [&str; 5] {
        [
            self.closed.as_str(),
            self.activated.as_str(),
            self.created.as_str(),
            self.prospect.as_str(),
            self.analysis.as_str(),
        ]
    }
}

/// Everything the preparer and calculators need besides the data itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KpiConfig {
    pub calendar: SprintCalendar,
    pub fields: FieldMap,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    sprint_length_days: Option<i64>,
    calendar: Option<BTreeMap<String, String>>,
    fields: FieldMap,
}

impl KpiConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a TOML config. Missing sections fall back to the defaults; a
    /// `[calendar]` section, when present, replaces the reference table.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        let sprint_length_days = raw.sprint_length_days.unwrap_or(DAYS_PER_SPRINT);
        if sprint_length_days <= 0 {
            return Err(ConfigError::InvalidSprintLength(sprint_length_days));
        }

        let calendar = match raw.calendar {
            Some(table) => SprintCalendar::new(parse_calendar(table)?, sprint_length_days),
            None => SprintCalendar::new(
                SprintCalendar::default().entries().clone(),
                sprint_length_days,
            ),
        };

        Ok(Self {
            calendar,
            fields: raw.fields,
        })
    }
}

fn parse_calendar(table: BTreeMap<String, String>) -> Result<BTreeMap<i64, NaiveDate>, ConfigError> {
    if table.is_empty() {
        return Err(ConfigError::EmptyCalendar);
    }

    let mut entries = BTreeMap::new();
    for (key, value) in table {
        let sprint: i64 = key
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidSprint(key.clone()))?;
        let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| ConfigError::InvalidDate { sprint, value })?;
        entries.insert(sprint, date);
    }
    Ok(entries)
}
