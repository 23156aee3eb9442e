//! Table stores for scenario inputs and pipeline outputs.
//!
//! - **store**: the [`TableStore`] trait with CSV-directory and in-memory backends
//! - **csv_table**: CSV parsing, column typing and serialization
//! - **polars_utils**: AnyValue conversions and lenient numeric parsing

pub mod csv_table;
pub mod error;
pub mod polars_utils;
pub mod store;

pub use csv_table::{CsvTable, ReadOptions, build_frame, read_csv_table, write_csv};
pub use error::{Result, StoreError};
pub use polars_utils::{any_to_f64, any_to_i64, any_to_string, parse_f64, parse_i64};
pub use store::{CsvTableStore, MemoryTableStore, TableStore};
