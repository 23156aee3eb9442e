//! Error types for the transformation stages.

use polars::prelude::PolarsError;
use precip_model::{ConfigurationError, FieldType};
use thiserror::Error;

/// Problems with the values of one scenario's data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A value could not be converted to the column's target type.
    #[error("column '{column}', row {row}: cannot coerce '{value}' to {target:?}")]
    Coercion {
        column: String,
        row: usize,
        value: String,
        target: FieldType,
    },

    /// A region column's code does not fit a 64-bit integer.
    #[error("region column '{column}': code {code} is out of range")]
    RegionCode { column: String, code: String },
}

/// Errors raised by a transformation stage.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Misconfiguration; every scenario would fail the same way.
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    /// Bad values in this scenario only.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {0}")]
    Frame(#[from] PolarsError),
}

impl TransformError {
    /// True when the error should stop the whole run rather than one scenario.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type for transformation stages.
pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_errors_are_fatal() {
        let config: TransformError = ConfigurationError::ReferenceYearAbsent { year: 2015 }.into();
        assert!(config.is_fatal());

        let data: TransformError = DataError::Coercion {
            column: "SummerPrecip".to_string(),
            row: 3,
            value: "n/a".to_string(),
            target: FieldType::Float64,
        }
        .into();
        assert!(!data.is_fatal());

        let frame: TransformError = PolarsError::ColumnNotFound("Year".into()).into();
        assert!(!frame.is_fatal());
    }
}
