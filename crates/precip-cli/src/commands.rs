use anyhow::{Context, Result};
use precip_cli::pipeline::{RunOptions, run_pipeline};
use precip_cli::types::RunReport;
use precip_ingest::{CsvTableStore, ReadOptions};
use precip_model::{PipelineConfig, SeasonWindow, load_config};
use tracing::{info, info_span};

use crate::cli::{ConfigArgs, RunArgs};

/// Load the configuration file (or defaults), apply CLI overrides, validate.
pub fn effective_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    apply_overrides(&mut config, args);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut PipelineConfig, args: &ConfigArgs) {
    let window = &mut config.season.window;
    *window = SeasonWindow {
        start_month: args.season_start.unwrap_or(window.start_month),
        end_month: args.season_end.unwrap_or(window.end_month),
    };
    if let Some(year) = args.reference_year {
        config.baseline.reference_year = year;
    }
    if let Some(policy) = args.null_policy {
        config.season.null_policy = policy.into();
    }
    if let Some(policy) = args.duplicate_policy {
        config.baseline.duplicate_policy = policy.into();
    }
    if let Some(pattern) = &args.pattern {
        config.io.pattern.clone_from(pattern);
    }
    if let Some(dir) = &args.output_dir {
        config.io.output_dir = Some(dir.clone());
    }
}

pub fn run(args: &RunArgs) -> Result<RunReport> {
    let mut config = effective_config(&args.config)?;
    if args.keep_intermediate {
        config.io.keep_intermediate = true;
    }
    let span = info_span!("summer_precip", input_dir = %args.input_dir.display());
    let _guard = span.enter();

    let columns = &config.columns;
    let read_options = ReadOptions::new(
        [columns.year.clone(), columns.month.clone()],
        [columns.date.clone()],
    );
    let input = CsvTableStore::new(&args.input_dir).with_read_options(read_options);
    let output_dir = config
        .io
        .output_dir
        .clone()
        .unwrap_or_else(|| args.input_dir.clone());
    let output = CsvTableStore::new(output_dir);
    info!(
        input = %input.root().display(),
        output = %output.root().display(),
        dry_run = args.dry_run,
        "starting run"
    );

    let options = RunOptions {
        dry_run: args.dry_run,
        show_progress: !args.no_progress,
    };
    let report = run_pipeline(&config, &input, &output, options)?;
    if let Some(path) = &args.report {
        report
            .write_json(path)
            .with_context(|| format!("write run report {}", path.display()))?;
    }
    Ok(report)
}

pub fn show_config(args: &ConfigArgs) -> Result<()> {
    let config = effective_config(args)?;
    let text = config.to_toml().context("render configuration")?;
    print!("{text}");
    Ok(())
}
