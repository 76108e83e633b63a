//! Tactical delivery KPIs computed from a work-item export and a sprint
//! calendar: analysis lead time, deployment mix, schedule adherence and
//! scope drift.

pub mod calendar;
pub mod config;
pub mod dataset;
pub mod error;
pub mod kpi;
pub mod models;
pub mod prepare;

pub use calendar::{SprintCalendar, SprintWindow};
pub use config::{FieldMap, KpiConfig};
pub use error::{ConfigError, LoadError};
pub use kpi::calculate_kpis;
pub use models::{Dataset, KpiReport, KpiResult, PreparedDataset, Tier, WorkItemRecord};
pub use prepare::prepare_dataset;

/// Prepare `dataset` and compute all four KPIs.
pub fn compute(dataset: &Dataset, config: &KpiConfig) -> KpiReport {
    calculate_kpis(&prepare_dataset(dataset, config))
}
