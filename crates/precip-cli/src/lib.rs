//! Library side of the `summer-precip` binary: logging setup, the run
//! driver, and the run report.

pub mod logging;
pub mod pipeline;
pub mod types;
