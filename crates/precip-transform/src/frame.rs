//! Named tables and schema checks shared by the stages.

use polars::prelude::DataFrame;
use precip_model::ConfigurationError;

/// A table paired with the name it is written under.
#[derive(Debug, Clone)]
pub struct NamedFrame {
    pub name: String,
    pub data: DataFrame,
}

impl NamedFrame {
    pub fn new(name: impl Into<String>, data: DataFrame) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Returns the number of rows in the table.
    pub fn row_count(&self) -> usize {
        self.data.height()
    }
}

/// Column names of `df`, in schema order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Fail with `MissingColumn` for the first of `columns` that `df` lacks.
pub fn require_columns<'a, I>(
    df: &DataFrame,
    stage: &'static str,
    columns: I,
) -> Result<(), ConfigurationError>
where
    I: IntoIterator<Item = &'a str>,
{
    for column in columns {
        if df.column(column).is_err() {
            return Err(ConfigurationError::MissingColumn {
                stage,
                column: column.to_string(),
            });
        }
    }
    Ok(())
}
