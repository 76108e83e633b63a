//! End-to-end KPI scenarios through the public API: raw export rows in,
//! KPI report out.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use delivery_kpis::config::{ANALYSIS_FIELD, PROSPECT_FIELD};
use delivery_kpis::dataset::dataset_from_json;
use delivery_kpis::{compute, prepare_dataset, Dataset, KpiConfig, Tier, WorkItemRecord};

fn story(iteration: &str, created: &str, closed: &str) -> WorkItemRecord {
    WorkItemRecord::new()
        .with("type", "User Story")
        .with("iteration", iteration)
        .with("createdDate", created)
        .with("closedDate", closed)
}

#[test]
fn single_lowercase_deployment_epic_is_full_delivery() {
    let dataset = Dataset::new(vec![WorkItemRecord::new()
        .with("type", "Epic")
        .with("tipoSolucao", "implantação ")]);

    let report = compute(&dataset, &KpiConfig::default());

    assert_eq!(report.implantacao.value, 100.0);
    assert_eq!(report.implantacao.tier, Some(Tier::Normal));
    assert_eq!(report.implantacao.message.as_deref(), Some("1 Impl. | 0 Dev."));
}

#[test]
fn empty_export_reports_no_data_for_every_kpi() {
    let report = compute(&Dataset::default(), &KpiConfig::default());

    for (name, result) in report.entries() {
        assert_eq!(result.value, 0.0, "{name}");
        assert!(result.is_no_data(), "{name}");
    }
}

#[test]
fn sprint_34_boundaries_come_from_the_calendar() {
    let config = KpiConfig::default();
    let dataset = Dataset::new(vec![WorkItemRecord::new().with("iteration", "Team\\Sprint 34")]);

    let prepared = prepare_dataset(&dataset, &config);
    let item = &prepared.items[0];

    assert_eq!(item.sprint_end, NaiveDate::from_ymd_opt(2025, 12, 12));
    assert_eq!(item.sprint_end_tol, NaiveDate::from_ymd_opt(2025, 12, 13));
    assert_eq!(
        item.sprint_start,
        config
            .calendar
            .resolve_end_date(33)
            .map(|end| end + Duration::days(1))
    );
}

#[test]
fn closing_a_day_after_tolerance_is_late() {
    let dataset = Dataset::new(vec![story(
        "Team\\Sprint 34",
        "2025-11-01T09:00:00Z",
        "2025-12-14T00:00:00Z",
    )]);

    let report = compute(&dataset, &KpiConfig::default());

    assert_eq!(report.cronograma.value, 0.0);
    assert_eq!(report.cronograma.tier, Some(Tier::Inverse));
    assert_eq!(report.cronograma.message.as_deref(), Some("Low Compliance (0/1)"));
}

#[test]
fn closing_exactly_at_tolerance_is_on_time() {
    let dataset = Dataset::new(vec![
        story("Team\\Sprint 34", "2025-11-01T09:00:00Z", "2025-12-13T00:00:00Z"),
        story("Team\\Sprint 36", "2026-01-01T09:00:00Z", "2026-02-14T00:00:00Z"),
    ]);

    let report = compute(&dataset, &KpiConfig::default());

    assert_eq!(report.cronograma.value, 100.0);
    assert_eq!(report.cronograma.tier, Some(Tier::Normal));
}

#[test]
fn offsets_are_normalized_before_comparing() {
    // 2025-12-12T22:00-03:00 is 2025-12-13T01:00 UTC, past the tolerance instant
    let dataset = Dataset::new(vec![story(
        "Team\\Sprint 34",
        "2025-11-01T09:00:00Z",
        "2025-12-12T22:00:00-03:00",
    )]);

    let report = compute(&dataset, &KpiConfig::default());
    assert_eq!(report.cronograma.value, 0.0);
}

#[test]
fn tracker_export_computes_all_kpis() {
    let export = format!(
        r#"[
            {{
                "id": 1, "type": "Feature", "state": "Closed",
                "iteration": "Orquestra\\Sprint 36",
                "createdDate": "2026-02-01T10:00:00Z",
                "closedDate": "2026-02-10T10:00:00Z",
                "{prospect}": "2026-02-01T10:00:00Z",
                "{analysis}": "2026-02-03T10:00:00Z",
                "tipoSolucao": "Implantação"
            }},
            {{
                "id": 2, "type": "Epic", "state": "Closed",
                "iteration": "Orquestra\\Sprint 36",
                "createdDate": "2026-02-05T10:00:00Z",
                "closedDate": "2026-02-20T10:00:00Z",
                "{prospect}": "2026-02-05T10:00:00Z",
                "{analysis}": "2026-02-06T10:00:00Z",
                "tipoSolucao": "Desenvolvimento"
            }},
            {{
                "id": 3, "type": "Task", "state": "Active",
                "iteration": "Orquestra\\Sprint 36",
                "createdDate": "2026-01-10T10:00:00Z"
            }}
        ]"#,
        prospect = PROSPECT_FIELD,
        analysis = ANALYSIS_FIELD,
    );
    let dataset = dataset_from_json(&export).unwrap();

    let report = compute(&dataset, &KpiConfig::default());

    assert!((report.tempo_medio.value - 1.5).abs() < 1e-9);

    assert_eq!(report.implantacao.value, 0.0);
    assert_eq!(report.implantacao.message.as_deref(), Some("0 Impl. | 1 Dev."));
    assert_eq!(report.implantacao.tier, Some(Tier::Inverse));

    assert_eq!(report.cronograma.value, 50.0);
    assert_eq!(report.cronograma.message.as_deref(), Some("Low Compliance (1/2)"));

    // sprint 36 starts 2026-01-24: one planned item, two added later
    assert_eq!(report.desvio.value, 200.0);
    assert_eq!(report.desvio.message.as_deref(), Some("High Drift (2/1)"));
}

#[test]
fn message_counts_match_the_value() {
    let dataset = Dataset::new(vec![
        story("Team\\Sprint 35", "2025-12-01T09:00:00Z", "2026-01-20T09:00:00Z"),
        story("Team\\Sprint 35", "2025-12-02T09:00:00Z", "2026-01-22T09:00:00Z"),
        story("Team\\Sprint 35", "2025-12-03T09:00:00Z", "2026-01-30T09:00:00Z"),
        story("Team\\Sprint 35", "2025-12-04T09:00:00Z", "2026-01-19T09:00:00Z"),
        story("Team\\Sprint 35", "2025-12-20T09:00:00Z", "2026-01-21T09:00:00Z"),
    ]);

    let report = compute(&dataset, &KpiConfig::default());

    // sprint 35 runs 2025-12-13 to 2026-01-23
    assert_eq!(report.cronograma.message.as_deref(), Some("Reasonable (4/5)"));
    assert_eq!(report.cronograma.value, 80.0);
    assert_eq!(report.desvio.message.as_deref(), Some("Natural Adjustments (1/4)"));
    assert_eq!(report.desvio.value, 25.0);
}

#[test]
fn missing_columns_degrade_to_no_data() {
    let dataset = Dataset::new(vec![
        WorkItemRecord::new().with("title", "Orphan"),
        WorkItemRecord::new().with("closedDate", "2026-01-01T00:00:00Z"),
    ]);

    let report = compute(&dataset, &KpiConfig::default());

    assert!(report.tempo_medio.is_no_data());
    assert!(report.implantacao.is_no_data());
    assert!(report.cronograma.is_no_data());
    assert!(report.desvio.is_no_data());
}

#[test]
fn custom_field_names_and_calendar_are_honored() {
    let config = KpiConfig::from_toml_str(
        r#"
        [calendar]
        "1" = "2024-01-19"
        "2" = "2024-02-09"

        [fields]
        iteration = "IterationPath"
        closed = "ClosedOn"
        "#,
    )
    .unwrap();
    let dataset = Dataset::new(vec![
        WorkItemRecord::new()
            .with("IterationPath", "Board\\Sprint 2")
            .with("ClosedOn", "2024-02-10"),
        WorkItemRecord::new()
            .with("IterationPath", "Board\\Sprint 3")
            .with("ClosedOn", "2024-03-02T12:00:00Z"),
    ]);

    let report = compute(&dataset, &config);

    // sprint 3 extrapolates to 2024-03-01, tolerance 2024-03-02 00:00
    assert_eq!(report.cronograma.value, 50.0);
}

fn arb_instant() -> impl Strategy<Value = Option<String>> {
    prop::option::of((0i64..2_000, 0u32..86_400).prop_map(|(days, secs)| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap();
        (base + Duration::days(days) + Duration::seconds(i64::from(secs)))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    }))
}

fn analysis_row(prospect: &Option<String>, analysis: &Option<String>) -> WorkItemRecord {
    let mut row = WorkItemRecord::new();
    row.set(PROSPECT_FIELD, prospect.clone());
    row.set(ANALYSIS_FIELD, analysis.clone());
    row
}

proptest! {
    #[test]
    fn analysis_time_ignores_field_order(
        pairs in prop::collection::vec((arb_instant(), arb_instant()), 0..20)
    ) {
        let forward: Dataset = pairs.iter().map(|(p, a)| analysis_row(p, a)).collect();
        let swapped: Dataset = pairs.iter().map(|(p, a)| analysis_row(a, p)).collect();
        let config = KpiConfig::default();

        let lhs = compute(&forward, &config).tempo_medio;
        let rhs = compute(&swapped, &config).tempo_medio;

        prop_assert!((lhs.value - rhs.value).abs() < 1e-9);
        prop_assert!(lhs.value >= 0.0);
        prop_assert_eq!(lhs.message, rhs.message);
    }
}
