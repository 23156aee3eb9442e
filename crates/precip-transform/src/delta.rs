//! Change-from-baseline column.

use polars::prelude::{DataFrame, DataType, IntoLazy, col};

use crate::error::Result;
use crate::frame::require_columns;

const STAGE: &str = "delta";

/// Appends `change = value - baseline`. A null on either side gives a null
/// change; missing baselines are never read as zero.
#[derive(Debug, Clone)]
pub struct DeltaCalculator {
    value_column: String,
    baseline_column: String,
    change_column: String,
}

impl DeltaCalculator {
    pub fn new(
        value_column: impl Into<String>,
        baseline_column: impl Into<String>,
        change_column: impl Into<String>,
    ) -> Self {
        Self {
            value_column: value_column.into(),
            baseline_column: baseline_column.into(),
            change_column: change_column.into(),
        }
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        require_columns(
            df,
            STAGE,
            [self.value_column.as_str(), self.baseline_column.as_str()],
        )?;
        let change = col(self.value_column.as_str()).cast(DataType::Float64)
            - col(self.baseline_column.as_str()).cast(DataType::Float64);
        Ok(df
            .clone()
            .lazy()
            .with_column(change.alias(self.change_column.as_str()))
            .collect()?)
    }
}
