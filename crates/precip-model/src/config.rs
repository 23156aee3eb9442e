//! Run configuration and TOML loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::columns::ColumnNames;
use crate::error::{ConfigError, ConfigurationError};
use crate::mapping::FieldMapping;
use crate::options::{BaselineOptions, SeasonOptions};

/// Discovery and output naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoOptions {
    /// Glob matched against file names in the input directory.
    pub pattern: String,
    /// Output directory; the CLI defaults it to the input directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Appended to the scenario name to form the output table name.
    pub output_suffix: String,
    /// Also persist the seasonal, transposed and baseline tables.
    pub keep_intermediate: bool,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            pattern: "*.csv".to_string(),
            output_dir: None,
            output_suffix: "_spFinal".to_string(),
            keep_intermediate: false,
        }
    }
}

/// Shared, read-only configuration for every scenario in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub season: SeasonOptions,
    pub baseline: BaselineOptions,
    pub columns: ColumnNames,
    pub io: IoOptions,
    /// Explicit field rules. When absent the mapping follows `columns`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldMapping>,
}

impl PipelineConfig {
    /// The field mapping in effect for this configuration.
    pub fn field_mapping(&self) -> FieldMapping {
        self.fields
            .clone()
            .unwrap_or_else(|| FieldMapping::for_columns(&self.columns))
    }

    /// Output table name for a scenario.
    pub fn output_name(&self, scenario: &str) -> String {
        format!("{scenario}{}", self.io.output_suffix)
    }

    /// Check every setting once, before any scenario is read.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.season.window.validate()?;
        self.field_mapping().validate()?;

        let columns = &self.columns;
        let required = [
            ("date", &columns.date),
            ("year", &columns.year),
            ("month", &columns.month),
            ("region_prefix", &columns.region_prefix),
            ("fips", &columns.fips),
            ("frequency", &columns.frequency),
            ("value", &columns.value),
            ("baseline_suffix", &columns.baseline_suffix),
            ("change", &columns.change),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigurationError::InvalidConfig {
                    reason: format!("columns.{key} must not be empty"),
                });
            }
        }
        let baseline = columns.baseline();
        if columns.change == columns.value || columns.change == baseline {
            return Err(ConfigurationError::InvalidConfig {
                reason: format!(
                    "change column '{}' collides with the value or baseline column",
                    columns.change
                ),
            });
        }
        if self.io.pattern.trim().is_empty() {
            return Err(ConfigurationError::InvalidConfig {
                reason: "io.pattern must not be empty".to_string(),
            });
        }
        if self.io.output_suffix.is_empty() && self.io.output_dir.is_none() {
            return Err(ConfigurationError::InvalidConfig {
                reason: "io.output_suffix is empty and no output_dir is set; outputs would \
                         shadow inputs"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load and validate a TOML configuration file.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: PipelineConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}
