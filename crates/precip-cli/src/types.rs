use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use precip_model::{ColumnNames, PipelineConfig};
use serde::Serialize;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// Every scenario produced its output.
    Succeeded,
    /// At least one scenario was skipped.
    Partial,
    /// A configuration error stopped the run.
    Aborted,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Succeeded => 0,
            Self::Partial => 1,
            Self::Aborted => 2,
        }
    }
}

/// Output column with its display label.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDescription {
    pub name: String,
    pub label: String,
}

/// Result of a successful scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub scenario: String,
    /// Name of the change table in the output store.
    pub output: String,
    pub input_rows: usize,
    pub years: usize,
    pub regions: usize,
    pub rows: usize,
    pub unmatched_rows: usize,
    pub unmatched_regions: Vec<i64>,
    pub duplicate_regions: Vec<i64>,
    /// Intermediate tables written alongside the output.
    pub intermediates: Vec<String>,
    /// False for dry runs.
    pub written: bool,
}

/// A scenario that failed without stopping the run.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedScenario {
    pub scenario: String,
    pub reason: String,
}

/// The configuration error that stopped the run.
#[derive(Debug, Clone, Serialize)]
pub struct AbortedRun {
    /// Scenario being processed, if the error came from one.
    pub scenario: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input: String,
    pub output: String,
    pub dry_run: bool,
    pub config: PipelineConfig,
    pub columns: Vec<ColumnDescription>,
    pub scenarios: Vec<ScenarioSummary>,
    pub skipped: Vec<SkippedScenario>,
    pub aborted: Option<AbortedRun>,
}

impl RunReport {
    pub fn new(config: &PipelineConfig, input: String, output: String, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            input,
            output,
            dry_run,
            config: config.clone(),
            columns: describe_columns(&config.columns),
            scenarios: Vec::new(),
            skipped: Vec::new(),
            aborted: None,
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.aborted.is_some() {
            RunStatus::Aborted
        } else if self.skipped.is_empty() {
            RunStatus::Succeeded
        } else {
            RunStatus::Partial
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.status().exit_code()
    }

    /// Scenarios in which some rows found no baseline value.
    pub fn miscoverage_warnings(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|summary| summary.unmatched_rows > 0)
            .count()
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize run report")?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))
    }
}

fn describe_columns(columns: &ColumnNames) -> Vec<ColumnDescription> {
    vec![
        ColumnDescription {
            name: columns.fips.clone(),
            label: "FIPS".to_string(),
        },
        ColumnDescription {
            name: columns.year.clone(),
            label: "Year".to_string(),
        },
        ColumnDescription {
            name: columns.value.clone(),
            label: "Summer Precip".to_string(),
        },
        ColumnDescription {
            name: columns.baseline(),
            label: columns.baseline_label.clone(),
        },
        ColumnDescription {
            name: columns.change.clone(),
            label: columns.change_label.clone(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport::new(
            &PipelineConfig::default(),
            "in".to_string(),
            "out".to_string(),
            false,
        )
    }

    #[test]
    fn status_follows_skips_and_aborts() {
        let mut report = report();
        assert_eq!(report.status(), RunStatus::Succeeded);
        assert_eq!(report.exit_code(), 0);

        report.skipped.push(SkippedScenario {
            scenario: "pr_bad".to_string(),
            reason: "unreadable".to_string(),
        });
        assert_eq!(report.exit_code(), 1);

        report.aborted = Some(AbortedRun {
            scenario: None,
            reason: "reference year 2015 is absent from the data".to_string(),
        });
        assert_eq!(report.status(), RunStatus::Aborted);
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn column_labels_come_from_configuration() {
        let labels: Vec<(String, String)> = report()
            .columns
            .into_iter()
            .map(|column| (column.name, column.label))
            .collect();
        assert!(labels.contains(&(
            "SummerPrecip_1".to_string(),
            "Summer Precip Base".to_string()
        )));
        assert!(labels.contains(&(
            "ChangeSummerPrecip".to_string(),
            "Change in Summer Precip".to_string()
        )));
    }

    #[test]
    fn json_report_carries_status_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/run.json");
        report().write_json(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["dry_run"], serde_json::json!(false));
        assert_eq!(value["config"]["baseline"]["reference_year"], serde_json::json!(2015));
        assert!(value["started_at"].is_string());
        assert!(value["aborted"].is_null());
    }
}
