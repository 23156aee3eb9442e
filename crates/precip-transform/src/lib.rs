//! Transformation stages for the summer precipitation change pipeline.
//!
//! Each stage takes a `&DataFrame` and returns a new one; [`ScenarioPipeline`]
//! chains them for one scenario table.

pub mod baseline;
pub mod coerce;
pub mod delta;
pub mod error;
pub mod filter;
pub mod frame;
pub mod pipeline;
pub mod predicate;
pub mod reshape;
pub mod season;

pub use baseline::{BaselineJoin, BaselineJoiner, JoinCoverage};
pub use coerce::{FieldCoercer, coerce_column};
pub use delta::DeltaCalculator;
pub use error::{DataError, Result, TransformError};
pub use filter::RecordFilter;
pub use frame::{NamedFrame, column_names, require_columns};
pub use pipeline::{ScenarioOutput, ScenarioPipeline, ScenarioStats};
pub use predicate::{CompareOp, Predicate, PredicateValue, all_of, describe};
pub use reshape::Reshaper;
pub use season::SeasonAggregator;
