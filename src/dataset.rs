//! Loading work-item exports and narrowing them before preparation.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::FieldMap;
use crate::error::LoadError;
use crate::models::{Dataset, WorkItemRecord};
use crate::prepare::extract_sprint_number;

impl Dataset {
    /// Rows whose iteration label names sprint `sprint`.
    pub fn filter_by_sprint(&self, fields: &FieldMap, sprint: i64) -> Dataset {
        self.rows()
            .iter()
            .filter(|row| {
                row.text(&fields.iteration).and_then(extract_sprint_number) == Some(sprint)
            })
            .cloned()
            .collect()
    }

    /// Rows whose work-item type is one of `types`. An empty list keeps all.
    pub fn filter_by_types(&self, fields: &FieldMap, types: &[String]) -> Dataset {
        if types.is_empty() {
            return self.clone();
        }
        self.rows()
            .iter()
            .filter(|row| {
                row.text(&fields.item_type)
                    .is_some_and(|item_type| types.iter().any(|wanted| wanted == item_type))
            })
            .cloned()
            .collect()
    }

    pub fn filter_by_state(&self, fields: &FieldMap, state: &str) -> Dataset {
        self.rows()
            .iter()
            .filter(|row| row.text(&fields.state) == Some(state))
            .cloned()
            .collect()
    }

    /// Distinct sprint numbers named by iteration labels, newest first.
    pub fn available_sprints(&self, fields: &FieldMap) -> Vec<i64> {
        let sprints: BTreeSet<i64> = self
            .rows()
            .iter()
            .filter_map(|row| row.text(&fields.iteration).and_then(extract_sprint_number))
            .collect();
        sprints.into_iter().rev().collect()
    }
}

/// Load an export, picking the format from the file extension.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let dataset = if is_csv {
        load_csv(path)?
    } else {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        dataset_from_json(&text)?
    };

    debug!(path = %path.display(), rows = dataset.len(), "loaded export");
    Ok(dataset)
}

/// Parse a JSON array of work-item objects. Non-object entries are skipped.
pub fn dataset_from_json(text: &str) -> Result<Dataset, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(entries) = value else {
        return Err(LoadError::NotAnArray);
    };

    let mut rows = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(fields) => rows.push(WorkItemRecord::from_fields(fields)),
            other => warn!(index, kind = json_kind(&other), "skipping non-object work item"),
        }
    }
    Ok(Dataset::new(rows))
}

/// Read a CSV export. The header names the columns; empty cells are null.
pub fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        let mut fields = Map::new();
        for (column, cell) in headers.iter().zip(record.iter()) {
            let value = if cell.trim().is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            fields.insert(column.to_string(), value);
        }
        rows.push(WorkItemRecord::from_fields(fields));
    }

    Ok(Dataset::new(rows))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
