//! Error types shared across the pipeline crates.

use std::path::PathBuf;

use thiserror::Error;

/// A misconfiguration detected before any output is produced for a scenario.
///
/// Every scenario in a run shares the same configuration, so the driver treats
/// these as fatal for the whole run rather than skipping a single file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A column required by a stage is not present in its input table.
    #[error("{stage}: column '{column}' not found in input table")]
    MissingColumn { stage: &'static str, column: String },

    /// The reference year has no rows, so no baseline can be built.
    #[error("reference year {year} is absent from the data")]
    ReferenceYearAbsent { year: i64 },

    /// The field mapping cannot be evaluated as declared.
    #[error("malformed field mapping: {reason}")]
    MalformedMapping { reason: String },

    /// The season window is outside 1..=12 or runs backwards.
    #[error("invalid season window {start}..={end}: months must satisfy 1 <= start <= end <= 12")]
    InvalidSeasonWindow { start: u32, end: u32 },

    /// A region column name does not carry a region code after its prefix.
    #[error("region column '{column}' is invalid: {reason}")]
    InvalidRegionColumn { column: String, reason: String },

    /// The reference year holds more than one row for a region and the
    /// duplicate policy rejects that.
    #[error("region {fips} appears more than once in reference year {year}")]
    DuplicateBaseline { fips: i64, year: i64 },

    /// Any other invalid setting.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`crate::PipelineConfig`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The file parsed but describes an unusable configuration.
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_stage_and_column() {
        let err = ConfigurationError::MissingColumn {
            stage: "reshape",
            column: "Sum_F1001".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "reshape: column 'Sum_F1001' not found in input table"
        );
    }

    #[test]
    fn invalid_config_wraps_configuration_error() {
        let err: ConfigError = ConfigurationError::ReferenceYearAbsent { year: 2015 }.into();
        assert_eq!(err.to_string(), "reference year 2015 is absent from the data");
    }
}
