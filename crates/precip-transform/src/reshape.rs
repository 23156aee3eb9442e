//! Wide-to-long reshape of seasonal totals.
//!
//! Each listed region column of each input row becomes its own output row
//! carrying the region code (parsed from the column name), the row's other
//! columns, and the region's value.

use std::collections::BTreeSet;

use polars::prelude::{
    Column, DataFrame, DataType, IdxCa, IdxSize, NamedFrom, PolarsResult, Series,
};
use precip_model::ConfigurationError;
use tracing::debug;

use crate::error::{DataError, Result};
use crate::frame::require_columns;

const STAGE: &str = "reshape";

/// Flattens region columns into `(code, attributes..., value)` rows.
#[derive(Debug, Clone)]
pub struct Reshaper {
    region_columns: Vec<String>,
    prefix_len: usize,
    code_column: String,
    value_column: String,
}

impl Reshaper {
    /// `prefix_len` characters are stripped from each region column name; the
    /// remainder must parse as an integer code.
    pub fn new(
        region_columns: Vec<String>,
        prefix_len: usize,
        code_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            region_columns,
            prefix_len,
            code_column: code_column.into(),
            value_column: value_column.into(),
        }
    }

    pub fn region_columns(&self) -> &[String] {
        &self.region_columns
    }

    /// Region code encoded in a column name, e.g. `Sum_F1001` -> `1001`.
    ///
    /// A name without a code after the prefix is a configuration error. A
    /// code made of digits that does not fit an `i64` is a problem with this
    /// table's columns only.
    pub fn region_code(&self, column: &str) -> Result<i64> {
        let invalid = |reason: String| ConfigurationError::InvalidRegionColumn {
            column: column.to_string(),
            reason,
        };
        let code = column.get(self.prefix_len..).ok_or_else(|| {
            invalid(format!("name is shorter than the {}-character prefix", self.prefix_len))
        })?;
        if code.is_empty() {
            return Err(invalid("no region code after the prefix".to_string()).into());
        }
        match code.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) if code.bytes().all(|b| b.is_ascii_digit()) => Err(DataError::RegionCode {
                column: column.to_string(),
                code: code.to_string(),
            }
            .into()),
            Err(_) => Err(invalid(format!("'{code}' is not an integer region code")).into()),
        }
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        // Everything is validated before a single output row is built.
        require_columns(df, STAGE, self.region_columns.iter().map(String::as_str))?;
        let codes = self
            .region_columns
            .iter()
            .map(|column| self.region_code(column))
            .collect::<Result<Vec<_>>>()?;

        let listed: BTreeSet<&str> = self.region_columns.iter().map(String::as_str).collect();
        let attributes: Vec<&Column> = df
            .get_columns()
            .iter()
            .filter(|column| !listed.contains(column.name().as_str()))
            .collect();
        for output in [&self.code_column, &self.value_column] {
            if attributes.iter().any(|column| column.name().as_str() == output) {
                return Err(ConfigurationError::InvalidConfig {
                    reason: format!("reshape output column '{output}' already exists in the input"),
                }
                .into());
            }
        }

        let values: Vec<Column> = self
            .region_columns
            .iter()
            .map(|name| df.column(name)?.cast(&DataType::Float64))
            .collect::<PolarsResult<_>>()?;
        let values = values
            .iter()
            .map(Column::f64)
            .collect::<PolarsResult<Vec<_>>>()?;

        let total = df.height() * codes.len();
        let mut source_rows: Vec<IdxSize> = Vec::with_capacity(total);
        let mut out_codes: Vec<i64> = Vec::with_capacity(total);
        let mut out_values: Vec<Option<f64>> = Vec::with_capacity(total);
        for row in 0..df.height() {
            for (code, column) in codes.iter().zip(&values) {
                source_rows.push(row as IdxSize);
                out_codes.push(*code);
                out_values.push(column.get(row));
            }
        }

        let take = IdxCa::from_vec("row".into(), source_rows);
        let mut columns: Vec<Column> = Vec::with_capacity(attributes.len() + 2);
        columns.push(Series::new(self.code_column.as_str().into(), out_codes).into());
        for attribute in attributes {
            columns.push(attribute.take(&take)?);
        }
        columns.push(Series::new(self.value_column.as_str().into(), out_values).into());
        let long = DataFrame::new(columns)?;

        debug!(
            input_rows = df.height(),
            regions = codes.len(),
            output_rows = long.height(),
            "reshaped regions to rows"
        );
        Ok(long)
    }
}
