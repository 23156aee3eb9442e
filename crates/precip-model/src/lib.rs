//! Data model for the summer precipitation change pipeline.
//!
//! Holds the configuration surface shared by every stage: column naming,
//! season and baseline options, the declarative field mapping, and the
//! error types the driver uses to tell fatal misconfiguration apart from
//! per-file failures.

pub mod columns;
pub mod config;
pub mod error;
pub mod mapping;
pub mod options;

pub use columns::ColumnNames;
pub use config::{IoOptions, PipelineConfig, load_config};
pub use error::{ConfigError, ConfigurationError};
pub use mapping::{FieldMapping, FieldRule, FieldType};
pub use options::{BaselineOptions, DuplicatePolicy, NullPolicy, SeasonOptions, SeasonWindow};
