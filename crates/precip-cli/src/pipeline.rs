//! Run driver: discovers scenario tables, transforms each, writes results.
//!
//! Failures are classified per scenario. Configuration errors stop the run
//! because every remaining scenario would fail the same way; anything else
//! skips the scenario and moves on. Outputs are only written after every
//! stage of a scenario has succeeded.

use std::io::{self, IsTerminal};
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use precip_ingest::TableStore;
use precip_model::PipelineConfig;
use precip_transform::{NamedFrame, ScenarioOutput, ScenarioPipeline};
use tracing::{debug, error, info, info_span, warn};

use crate::types::{AbortedRun, RunReport, ScenarioSummary, SkippedScenario};

/// Per-run switches that are not part of the shared configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Run every stage but write nothing.
    pub dry_run: bool,
    /// Draw a progress bar on stderr when it is a terminal.
    pub show_progress: bool,
}

/// Process every scenario matching the configured pattern.
///
/// Returns an error only when the run cannot start: invalid configuration or
/// a failed listing of the input store. Per-scenario outcomes are recorded in
/// the report.
pub fn run_pipeline(
    config: &PipelineConfig,
    input: &dyn TableStore,
    output: &dyn TableStore,
    options: RunOptions,
) -> Result<RunReport> {
    config.validate().context("invalid configuration")?;
    let run_span = info_span!("run", pattern = %config.io.pattern);
    let _run_guard = run_span.enter();
    let run_start = Instant::now();

    let mut report = RunReport::new(
        config,
        input.locate(&config.io.pattern),
        output.locate(&config.output_name("*")),
        options.dry_run,
    );
    let scenarios: Vec<String> = input
        .list(&config.io.pattern)
        .with_context(|| format!("list scenarios matching {}", config.io.pattern))?
        .into_iter()
        .filter(|name| {
            let derived = is_derived_name(config, name);
            if derived {
                debug!(table = %name, "skipping previously written output");
            }
            !derived
        })
        .collect();
    info!(scenarios = scenarios.len(), "discovered scenarios");
    if scenarios.is_empty() {
        warn!(pattern = %config.io.pattern, "no scenario tables matched");
    }

    let pipeline = ScenarioPipeline::new(config);
    let progress = progress_bar(scenarios.len(), options.show_progress);
    for name in &scenarios {
        progress.set_message(name.clone());
        let outcome = process_scenario(&pipeline, name, input, output, options);
        progress.inc(1);
        match outcome {
            Outcome::Done(summary) => report.scenarios.push(summary),
            Outcome::Skipped(reason) => {
                report.skipped.push(SkippedScenario {
                    scenario: name.clone(),
                    reason,
                });
            }
            Outcome::Abort(reason) => {
                report.aborted = Some(AbortedRun {
                    scenario: Some(name.clone()),
                    reason,
                });
                break;
            }
        }
    }
    progress.finish_and_clear();

    report.finished_at = chrono::Utc::now();
    info!(
        succeeded = report.scenarios.len(),
        skipped = report.skipped.len(),
        aborted = report.aborted.is_some(),
        duration_ms = run_start.elapsed().as_millis(),
        "run finished"
    );
    Ok(report)
}

enum Outcome {
    Done(ScenarioSummary),
    Skipped(String),
    Abort(String),
}

fn process_scenario(
    pipeline: &ScenarioPipeline,
    name: &str,
    input: &dyn TableStore,
    output: &dyn TableStore,
    options: RunOptions,
) -> Outcome {
    let span = info_span!("scenario", name = %name);
    let _guard = span.enter();
    let config = pipeline.config();

    let monthly = match input.read(name) {
        Ok(df) => df,
        Err(err) => {
            error!(source = %input.locate(name), error = %err, "skipping unreadable scenario");
            return Outcome::Skipped(format!("read failed: {err}"));
        }
    };

    let result = match pipeline.run(name, &monthly) {
        Ok(result) => result,
        Err(err) if err.is_fatal() => {
            error!(error = %err, "configuration error; aborting run");
            return Outcome::Abort(err.to_string());
        }
        Err(err) => {
            error!(error = %err, "skipping scenario");
            return Outcome::Skipped(err.to_string());
        }
    };

    let output_name = config.output_name(name);
    let intermediates = if config.io.keep_intermediate {
        result.intermediates(name, config.baseline.reference_year)
    } else {
        Vec::new()
    };
    if !options.dry_run {
        // Intermediates first: the final table only appears once everything
        // else for the scenario is in place.
        let final_table = NamedFrame::new(output_name.clone(), result.table.clone());
        let tables: Vec<&NamedFrame> = intermediates
            .iter()
            .chain(std::iter::once(&final_table))
            .collect();
        if let Err(reason) = write_all(output, &tables) {
            return Outcome::Skipped(reason);
        }
        info!(
            output = %output.locate(&output_name),
            rows = result.table.height(),
            "wrote scenario output"
        );
    }
    Outcome::Done(summarize(name, output_name, &result, &intermediates, !options.dry_run))
}

/// Write every table or none: on the first failure the tables already written
/// for this scenario are removed again.
fn write_all(output: &dyn TableStore, tables: &[&NamedFrame]) -> Result<(), String> {
    for (index, table) in tables.iter().enumerate() {
        let Err(err) = output.write(&table.data, &table.name) else {
            continue;
        };
        error!(
            target_table = %output.locate(&table.name),
            error = %err,
            "skipping scenario with unwritable output"
        );
        for written in tables[..index].iter().rev() {
            if let Err(remove_err) = output.remove(&written.name) {
                error!(
                    target_table = %output.locate(&written.name),
                    error = %remove_err,
                    "failed to remove partial output"
                );
            }
        }
        return Err(format!("write failed: {err}"));
    }
    Ok(())
}

fn summarize(
    name: &str,
    output: String,
    result: &ScenarioOutput,
    intermediates: &[NamedFrame],
    written: bool,
) -> ScenarioSummary {
    let stats = &result.stats;
    ScenarioSummary {
        scenario: name.to_string(),
        output,
        input_rows: stats.input_rows,
        years: stats.years,
        regions: stats.regions,
        rows: stats.output_rows,
        unmatched_rows: stats.coverage.unmatched_rows,
        unmatched_regions: stats.coverage.unmatched_regions.iter().copied().collect(),
        duplicate_regions: stats.coverage.duplicate_regions.iter().copied().collect(),
        intermediates: intermediates.iter().map(|table| table.name.clone()).collect(),
        written,
    }
}

/// True for tables this pipeline writes, so reruns into the input store do
/// not treat earlier outputs as scenarios.
pub fn is_derived_name(config: &PipelineConfig, name: &str) -> bool {
    let suffix = config.io.output_suffix.as_str();
    if !suffix.is_empty() && name.ends_with(suffix) {
        return true;
    }
    let base = format!("_S_Tx_Base{}", config.baseline.reference_year);
    name.ends_with("_S") || name.ends_with("_S_Tx") || name.ends_with(&base)
}

fn progress_bar(len: usize, show: bool) -> ProgressBar {
    if !show || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    bar.set_style(style);
    bar
}
