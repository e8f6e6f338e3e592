// 特定の警告を無効化
#![allow(clippy::needless_return)]
#![allow(clippy::too_many_arguments)]

pub mod dataset;
pub mod error;
pub mod io;
pub mod stats;

// Re-export commonly used types
pub use dataset::{ContingencyTable, Sample, SampleGrid, SampleSet};
pub use error::{Error, Result};
pub use stats::{IntervalResult, RegressionLine, SignificanceResult, TailDirection};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
