//! Per-scenario composition of the stages.
//!
//! Stages run in a fixed order, each producing a new table from the previous
//! one:
//!
//! 1. [`RecordFilter`] drops rows without a date
//! 2. [`SeasonAggregator`] totals the season per year
//! 3. [`Reshaper`] turns region columns into rows
//! 4. [`BaselineJoiner`] attaches the reference-year value
//! 5. [`FieldCoercer`] selects and retypes the output columns
//! 6. [`DeltaCalculator`] appends the change column
//!
//! Nothing is written here; the caller decides what to persist once the whole
//! scenario has succeeded.

use std::time::Instant;

use polars::prelude::DataFrame;
use precip_model::PipelineConfig;
use tracing::{info, info_span};

use crate::baseline::{BaselineJoin, BaselineJoiner, JoinCoverage};
use crate::coerce::FieldCoercer;
use crate::delta::DeltaCalculator;
use crate::error::Result;
use crate::filter::RecordFilter;
use crate::frame::{NamedFrame, column_names};
use crate::reshape::Reshaper;
use crate::season::SeasonAggregator;

/// Row counts and join coverage for one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioStats {
    pub input_rows: usize,
    pub filtered_rows: usize,
    /// Distinct years with at least one row in the season window.
    pub years: usize,
    pub regions: usize,
    pub output_rows: usize,
    pub coverage: JoinCoverage,
}

/// Everything one scenario produced.
#[derive(Debug, Clone)]
pub struct ScenarioOutput {
    /// The change table.
    pub table: DataFrame,
    /// Seasonal totals (`_S`).
    pub seasonal: DataFrame,
    /// Long table before the join (`_S_Tx`).
    pub transposed: DataFrame,
    /// Reference-year rows of the long table (`_S_Tx_Base<year>`).
    pub baseline_slice: DataFrame,
    pub stats: ScenarioStats,
}

impl ScenarioOutput {
    /// Intermediate tables under their conventional names.
    pub fn intermediates(&self, scenario: &str, reference_year: i64) -> Vec<NamedFrame> {
        vec![
            NamedFrame::new(format!("{scenario}_S"), self.seasonal.clone()),
            NamedFrame::new(format!("{scenario}_S_Tx"), self.transposed.clone()),
            NamedFrame::new(
                format!("{scenario}_S_Tx_Base{reference_year}"),
                self.baseline_slice.clone(),
            ),
        ]
    }
}

/// The configured stages for a run.
#[derive(Debug, Clone)]
pub struct ScenarioPipeline {
    config: PipelineConfig,
    filter: RecordFilter,
    season: SeasonAggregator,
    joiner: BaselineJoiner,
    coercer: FieldCoercer,
    delta: DeltaCalculator,
}

impl ScenarioPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        let columns = &config.columns;
        Self {
            config: config.clone(),
            filter: RecordFilter::new(columns.date.as_str()),
            season: SeasonAggregator::new(config.season, columns.clone()),
            joiner: BaselineJoiner::new(
                config.baseline,
                columns.fips.as_str(),
                columns.year.as_str(),
                columns.value.as_str(),
                columns.baseline(),
            ),
            coercer: FieldCoercer::new(config.field_mapping()),
            delta: DeltaCalculator::new(
                columns.value.as_str(),
                columns.baseline(),
                columns.change.as_str(),
            ),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over one scenario's monthly table.
    pub fn run(&self, scenario: &str, monthly: &DataFrame) -> Result<ScenarioOutput> {
        let span = info_span!("transform", scenario = %scenario);
        let _guard = span.enter();
        let start = Instant::now();

        let filtered = info_span!("filter").in_scope(|| -> Result<DataFrame> {
            let start = Instant::now();
            let filtered = self.filter.apply(monthly)?;
            info!(
                input_rows = monthly.height(),
                output_rows = filtered.height(),
                duration_ms = start.elapsed().as_millis(),
                "filter complete"
            );
            Ok(filtered)
        })?;

        let seasonal = info_span!("season").in_scope(|| -> Result<DataFrame> {
            let start = Instant::now();
            let seasonal = self.season.apply(&filtered)?;
            info!(
                years = seasonal.height(),
                duration_ms = start.elapsed().as_millis(),
                "season totals complete"
            );
            Ok(seasonal)
        })?;

        let columns = &self.config.columns;
        let names = column_names(&seasonal);
        let reshaper = Reshaper::new(
            columns.summed_regions(names.iter().map(String::as_str)),
            columns.summed_prefix_len(),
            columns.fips.as_str(),
            columns.value.as_str(),
        );
        let transposed = info_span!("reshape").in_scope(|| -> Result<DataFrame> {
            let start = Instant::now();
            let transposed = reshaper.apply(&seasonal)?;
            info!(
                regions = reshaper.region_columns().len(),
                output_rows = transposed.height(),
                duration_ms = start.elapsed().as_millis(),
                "reshape complete"
            );
            Ok(transposed)
        })?;

        let BaselineJoin {
            joined,
            slice,
            coverage,
        } = info_span!("baseline").in_scope(|| -> Result<BaselineJoin> {
            let start = Instant::now();
            let join = self.joiner.apply(&transposed)?;
            info!(
                reference_year = self.config.baseline.reference_year,
                baseline_rows = join.slice.height(),
                unmatched_rows = join.coverage.unmatched_rows,
                duration_ms = start.elapsed().as_millis(),
                "baseline join complete"
            );
            Ok(join)
        })?;

        let coerced = info_span!("coerce").in_scope(|| -> Result<DataFrame> {
            let start = Instant::now();
            let coerced = self.coercer.apply(&joined)?;
            info!(
                columns = coerced.width(),
                duration_ms = start.elapsed().as_millis(),
                "coercion complete"
            );
            Ok(coerced)
        })?;

        let table = info_span!("delta").in_scope(|| -> Result<DataFrame> {
            let start = Instant::now();
            let table = self.delta.apply(&coerced)?;
            info!(
                output_rows = table.height(),
                duration_ms = start.elapsed().as_millis(),
                "change computed"
            );
            Ok(table)
        })?;

        let stats = ScenarioStats {
            input_rows: monthly.height(),
            filtered_rows: filtered.height(),
            years: seasonal.height(),
            regions: reshaper.region_columns().len(),
            output_rows: table.height(),
            coverage,
        };
        info!(
            output_rows = stats.output_rows,
            duration_ms = start.elapsed().as_millis(),
            "scenario transformed"
        );
        Ok(ScenarioOutput {
            table,
            seasonal,
            transposed,
            baseline_slice: slice,
            stats,
        })
    }
}
