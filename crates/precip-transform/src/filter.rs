//! Removal of incomplete monthly records.

use polars::prelude::DataFrame;
use tracing::debug;

use crate::error::Result;
use crate::predicate::{Predicate, select_rows};

const STAGE: &str = "filter";

/// Drops rows whose date is missing. Schema is unchanged.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    date_column: String,
}

impl RecordFilter {
    pub fn new(date_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
        }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate::is_not_null(self.date_column.as_str())
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let kept = select_rows(df, &[self.predicate()], STAGE)?;
        debug!(
            input_rows = df.height(),
            kept_rows = kept.height(),
            predicate = %self.predicate(),
            "filtered incomplete records"
        );
        Ok(kept)
    }
}
