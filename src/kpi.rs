use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::models::{KpiReport, KpiResult, PreparedDataset, Tier};

pub const EPIC_TYPE: &str = "Epic";
pub const DEPLOYMENT_LABEL: &str = "Implantação";
pub const DEVELOPMENT_LABEL: &str = "Desenvolvimento";

const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub fn calculate_kpis(dataset: &PreparedDataset) -> KpiReport {
    let report = KpiReport {
        tempo_medio: average_analysis_time(dataset),
        implantacao: deployment_rate(dataset),
        cronograma: schedule_adherence(dataset),
        desvio: scope_drift(dataset),
    };

    for (name, result) in report.entries() {
        debug!(kpi = name, value = result.value, tier = ?result.tier, "computed kpi");
    }

    report
}

/// Mean absolute gap, in fractional days, between the prospect and analysis
/// dates of items that carry both.
pub fn average_analysis_time(dataset: &PreparedDataset) -> KpiResult {
    let gaps: Vec<f64> = if dataset.columns.prospect && dataset.columns.analysis {
        dataset
            .items
            .iter()
            .filter_map(|item| Some((item.prospect?, item.analysis?)))
            .map(|(prospect, analysis)| {
                (prospect - analysis).num_milliseconds().abs() as f64 / MILLIS_PER_DAY
            })
            .collect()
    } else {
        Vec::new()
    };

    let (value, message) = if gaps.is_empty() {
        (0.0, KpiResult::NO_DATA.to_string())
    } else {
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        (mean, format!("{} items", gaps.len()))
    };

    KpiResult {
        value,
        message: Some(message),
        unit: Some("days".to_string()),
        classification: None,
        tier: None,
        help: Some("Mean absolute difference between the prospect and analysis dates.".to_string()),
    }
}

/// Share of deployment epics among deployment and development epics.
pub fn deployment_rate(dataset: &PreparedDataset) -> KpiResult {
    if !dataset.columns.item_type || !dataset.columns.solution_type {
        return KpiResult::no_data();
    }

    let epics: Vec<_> = dataset
        .items
        .iter()
        .filter(|item| item.item_type.as_deref() == Some(EPIC_TYPE))
        .collect();
    if epics.is_empty() {
        return KpiResult::no_data();
    }

    let mut qtd_impl = 0usize;
    let mut qtd_dev = 0usize;
    for solution in epics
        .iter()
        .filter_map(|item| item.solution_type.as_deref())
        .map(normalize_solution_type)
    {
        if solution == DEPLOYMENT_LABEL {
            qtd_impl += 1;
        } else if solution == DEVELOPMENT_LABEL {
            qtd_dev += 1;
        }
    }

    let value = percentage(qtd_impl, qtd_impl + qtd_dev);
    let (tier, label) = classify_deployment(value);

    KpiResult {
        value,
        message: Some(format!("{qtd_impl} Impl. | {qtd_dev} Dev.")),
        unit: Some("%".to_string()),
        classification: Some(label.to_string()),
        tier: Some(tier),
        help: Some("Deployment epics / (deployment + development epics).".to_string()),
    }
}

/// Share of closed sprint items delivered by the end of the tolerance day.
pub fn schedule_adherence(dataset: &PreparedDataset) -> KpiResult {
    let delivered: Vec<_> = dataset
        .items
        .iter()
        .filter(|item| item.closed.is_some() && item.sprint_num.is_some())
        .collect();
    if delivered.is_empty() {
        return KpiResult::no_data();
    }

    let total = delivered.len();
    let on_time = delivered
        .iter()
        .filter(|item| !is_late(item.closed, item.sprint_end_tol))
        .count();

    let value = percentage(on_time, total);
    let (tier, label) = classify_schedule(value);

    KpiResult {
        value,
        message: Some(format!("{label} ({on_time}/{total})")),
        unit: Some("%".to_string()),
        classification: Some(label.to_string()),
        tier: Some(tier),
        help: Some("On-time deliveries / total closed in the sprint.".to_string()),
    }
}

/// Items added after sprint start relative to items planned before it.
pub fn scope_drift(dataset: &PreparedDataset) -> KpiResult {
    let scoped: Vec<_> = dataset
        .items
        .iter()
        .filter_map(|item| {
            item.sprint_num?;
            Some((item.created?, item.sprint_start?))
        })
        .collect();
    if scoped.is_empty() {
        return KpiResult::no_data();
    }

    let qtd_planned = scoped
        .iter()
        .filter(|(created, start)| *created < midnight(*start))
        .count();
    let qtd_unplanned = scoped.len() - qtd_planned;

    let value = percentage(qtd_unplanned, qtd_planned);
    let (tier, label) = classify_drift(value);

    KpiResult {
        value,
        message: Some(format!("{label} ({qtd_unplanned}/{qtd_planned})")),
        unit: Some("%".to_string()),
        classification: Some(label.to_string()),
        tier: Some(tier),
        help: Some("New items / planned items.".to_string()),
    }
}

/// Above 60 favors delivery, below 40 favors development; 40 and 60
/// themselves are balanced.
pub fn classify_deployment(value: f64) -> (Tier, &'static str) {
    if value > 60.0 {
        (Tier::Normal, "Focus on Delivery")
    } else if value < 40.0 {
        (Tier::Inverse, "Focus on Development")
    } else {
        (Tier::Off, "Balance")
    }
}

pub fn classify_schedule(value: f64) -> (Tier, &'static str) {
    if value >= 90.0 {
        (Tier::Normal, "Excellent")
    } else if value >= 70.0 {
        (Tier::Off, "Reasonable")
    } else {
        (Tier::Inverse, "Low Compliance")
    }
}

pub fn classify_drift(value: f64) -> (Tier, &'static str) {
    if value <= 10.0 {
        (Tier::Normal, "Excellent")
    } else if value <= 30.0 {
        (Tier::Off, "Natural Adjustments")
    } else {
        (Tier::Inverse, "High Drift")
    }
}

/// Trim and title-case a solution-type label: `" implantação"` -> `"Implantação"`.
pub fn normalize_solution_type(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut in_word = false;
    for ch in raw.trim().chars() {
        if ch.is_alphabetic() {
            if in_word {
                normalized.extend(ch.to_lowercase());
            } else {
                normalized.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            normalized.push(ch);
            in_word = false;
        }
    }
    normalized
}

fn is_late(closed: Option<NaiveDateTime>, end_tol: Option<NaiveDate>) -> bool {
    match (closed, end_tol) {
        (Some(closed), Some(end_tol)) => closed > midnight(end_tol),
        _ => false,
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
