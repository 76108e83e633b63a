use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a work-item export, addressed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemRecord {
    fields: Map<String, Value>,
}

impl WorkItemRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builder-style setter.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.fields.insert(column.to_string(), value.into());
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// The cell under `column`; JSON `null` reads as absent.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column).filter(|value| !value.is_null())
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Cell rendered as text: strings as-is, numbers and booleans formatted.
    pub fn text_lossy(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }
}

/// An ordered collection of work-item records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<WorkItemRecord>,
}

impl Dataset {
    pub fn new(rows: Vec<WorkItemRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[WorkItemRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A column exists when at least one row carries it.
    pub fn has_column(&self, column: &str) -> bool {
        self.rows.iter().any(|row| row.has_column(column))
    }
}

impl FromIterator<WorkItemRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = WorkItemRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Which logical columns the prepared dataset was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnPresence {
    pub item_type: bool,
    pub iteration: bool,
    pub solution_type: bool,
    pub created: bool,
    pub closed: bool,
    pub activated: bool,
    pub prospect: bool,
    pub analysis: bool,
}

/// A record with typed dates and its sprint boundaries attached.
///
/// When `sprint_num` is `None` the three boundary dates are `None` too.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedWorkItem {
    /// The source row with dates normalized and derived sprint columns added.
    pub record: WorkItemRecord,
    pub item_type: Option<String>,
    pub solution_type: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub closed: Option<NaiveDateTime>,
    pub activated: Option<NaiveDateTime>,
    pub prospect: Option<NaiveDateTime>,
    pub analysis: Option<NaiveDateTime>,
    pub sprint_num: Option<i64>,
    pub sprint_start: Option<NaiveDate>,
    pub sprint_end: Option<NaiveDate>,
    pub sprint_end_tol: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedDataset {
    pub items: Vec<PreparedWorkItem>,
    pub columns: ColumnPresence,
}

impl PreparedDataset {
    /// Back to a plain dataset, keeping the normalized and derived columns.
    pub fn into_dataset(self) -> Dataset {
        self.items.into_iter().map(|item| item.record).collect()
    }
}

/// Classification tier attached to a KPI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Good.
    Normal,
    /// Neutral or borderline.
    Off,
    /// Concerning.
    Inverse,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Normal => "normal",
            Tier::Off => "off",
            Tier::Inverse => "inverse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl KpiResult {
    pub const NO_DATA: &'static str = "No data";

    /// Degenerate result for a KPI with nothing to aggregate.
    pub fn no_data() -> Self {
        Self {
            value: 0.0,
            message: Some(Self::NO_DATA.to_string()),
            unit: None,
            classification: None,
            tier: Some(Tier::Off),
            help: None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.message.as_deref() == Some(Self::NO_DATA)
    }
}

/// The four tactical delivery KPIs, serialized under their result keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    pub tempo_medio: KpiResult,
    pub implantacao: KpiResult,
    pub cronograma: KpiResult,
    pub desvio: KpiResult,
}

impl KpiReport {
    pub fn entries(&self) -> [(&'static str, &KpiResult); 4] {
        [
            ("tempo_medio", &self.tempo_medio),
            ("implantacao", &self.implantacao),
            ("cronograma", &self.cronograma),
            ("desvio", &self.desvio),
        ]
    }
}
