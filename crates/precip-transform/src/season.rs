//! Growing-season totals per year.
//!
//! Rows inside the month window are grouped by year; each raw region column is
//! summed into an aggregated column (`F1001` becomes `Sum_F1001`) and the
//! number of contributing rows is recorded as the frequency. Years without a
//! single row in the window do not appear in the output.
//!
//! Region values are read strictly: blank cells are missing readings and go
//! through the null policy, anything else that is not a number fails the
//! scenario.

use polars::prelude::{
    DataFrame, DataType, Expr, IntoLazy, NULL, SortMultipleOptions, col, lit, when,
};
use precip_model::{ColumnNames, FieldType, NullPolicy, SeasonOptions};
use tracing::debug;

use crate::coerce::coerce_column;
use crate::error::Result;
use crate::frame::{column_names, require_columns};
use crate::predicate::{Predicate, all_of, check_fields, describe};

const STAGE: &str = "season";

/// Sums region columns over the season window, one row per year.
#[derive(Debug, Clone)]
pub struct SeasonAggregator {
    options: SeasonOptions,
    columns: ColumnNames,
}

impl SeasonAggregator {
    pub fn new(options: SeasonOptions, columns: ColumnNames) -> Self {
        Self { options, columns }
    }

    /// Row selection for the season: month inside the window, year present.
    pub fn predicates(&self) -> Vec<Predicate> {
        let window = self.options.window;
        vec![
            Predicate::ge(self.columns.month.as_str(), window.start_month),
            Predicate::le(self.columns.month.as_str(), window.end_month),
            Predicate::is_not_null(self.columns.year.as_str()),
        ]
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        self.options.window.validate()?;
        let year = self.columns.year.as_str();
        require_columns(df, STAGE, [year, self.columns.month.as_str()])?;
        let predicates = self.predicates();
        check_fields(df, &predicates, STAGE)?;

        let names = column_names(df);
        let regions = self.columns.raw_regions(names.iter().map(String::as_str));
        let mut typed = df.clone();
        for region in &regions {
            let values = coerce_column(typed.column(region)?, FieldType::Float64)?;
            typed.with_column(values)?;
        }

        let mut aggregations: Vec<Expr> = Vec::with_capacity(regions.len() + 1);
        aggregations.push(
            col(year)
                .count()
                .cast(DataType::Int64)
                .alias(self.columns.frequency.as_str()),
        );
        aggregations.extend(regions.iter().map(|region| self.region_total(region)));

        let mut lazy = typed.lazy();
        if let Some(selection) = all_of(&predicates) {
            lazy = lazy.filter(selection);
        }
        let totals = lazy
            .group_by([col(year)])
            .agg(aggregations)
            .sort([year], SortMultipleOptions::default())
            .collect()?;

        debug!(
            window = %describe(&predicates),
            regions = regions.len(),
            years = totals.height(),
            null_policy = ?self.options.null_policy,
            "aggregated season totals"
        );
        Ok(totals)
    }

    fn region_total(&self, region: &str) -> Expr {
        let values = col(region);
        let total = match self.options.null_policy {
            NullPolicy::TreatAsZero => values.fill_null(lit(0.0)).sum(),
            // A plain sum of an all-null group is 0.0; keep it null instead.
            NullPolicy::Exclude => when(values.clone().count().gt(lit(0)))
                .then(values.sum())
                .otherwise(lit(NULL).cast(DataType::Float64)),
        };
        total.alias(self.columns.summed(region))
    }
}
