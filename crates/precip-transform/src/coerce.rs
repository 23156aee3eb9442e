//! Declarative column selection and retyping.

use polars::prelude::{AnyValue, Column, DataFrame, DataType, NamedFrom, Series};
use precip_ingest::{any_to_f64, any_to_i64, any_to_string};
use precip_model::{FieldMapping, FieldType};
use tracing::debug;

use crate::error::{DataError, Result};
use crate::frame::require_columns;

const STAGE: &str = "coerce";

/// Applies a [`FieldMapping`] to a table.
///
/// Output columns are the kept rules in declared order followed by every input
/// column no rule mentions, in input order. Applying the same mapping to its
/// own output changes nothing.
#[derive(Debug, Clone)]
pub struct FieldCoercer {
    mapping: FieldMapping,
}

impl FieldCoercer {
    pub fn new(mapping: FieldMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        self.mapping.validate()?;
        require_columns(df, STAGE, self.mapping.kept().map(|rule| rule.name.as_str()))?;

        let named = self.mapping.names();
        let mut columns: Vec<Column> = Vec::with_capacity(df.width());
        for rule in self.mapping.kept() {
            let column = df.column(&rule.name)?;
            columns.push(match rule.target {
                Some(target) => coerce_column(column, target)?,
                None => column.clone(),
            });
        }
        let mut passed_through = 0usize;
        for column in df.get_columns() {
            if !named.contains(column.name().as_str()) {
                columns.push(column.clone());
                passed_through += 1;
            }
        }
        let kept = self.mapping.kept().count();
        let dropped = df.width().saturating_sub(kept + passed_through);
        let out = DataFrame::new(columns)?;
        debug!(
            kept,
            passed_through,
            dropped,
            "applied field mapping"
        );
        Ok(out)
    }
}

fn target_dtype(target: FieldType) -> DataType {
    match target {
        FieldType::Int64 => DataType::Int64,
        FieldType::Float64 => DataType::Float64,
        FieldType::Text => DataType::String,
    }
}

/// Retype one column. Text and numeric sources are converted value by value;
/// a value that does not convert is a [`DataError::Coercion`].
pub fn coerce_column(column: &Column, target: FieldType) -> Result<Column> {
    let dtype = target_dtype(target);
    if column.dtype() == &dtype {
        return Ok(column.clone());
    }

    let name = column.name().clone();
    let failed = |row: usize, value: AnyValue<'_>| DataError::Coercion {
        column: name.to_string(),
        row,
        value: any_to_string(value),
        target,
    };
    let series = match target {
        FieldType::Int64 => {
            let mut values: Vec<Option<i64>> = Vec::with_capacity(column.len());
            for row in 0..column.len() {
                let value = column.get(row)?;
                if is_blank(&value) {
                    values.push(None);
                    continue;
                }
                values.push(Some(any_to_i64(value.clone()).ok_or_else(|| failed(row, value))?));
            }
            Series::new(name.clone(), values)
        }
        FieldType::Float64 => {
            let mut values: Vec<Option<f64>> = Vec::with_capacity(column.len());
            for row in 0..column.len() {
                let value = column.get(row)?;
                if is_blank(&value) {
                    values.push(None);
                    continue;
                }
                values.push(Some(any_to_f64(value.clone()).ok_or_else(|| failed(row, value))?));
            }
            Series::new(name.clone(), values)
        }
        FieldType::Text => return Ok(column.cast(&dtype)?),
    };
    Ok(series.into())
}

fn is_blank(value: &AnyValue<'_>) -> bool {
    match value {
        AnyValue::Null => true,
        AnyValue::String(text) => text.trim().is_empty(),
        AnyValue::StringOwned(text) => text.trim().is_empty(),
        _ => false,
    }
}
