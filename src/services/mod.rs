//! Services for normalization, bucketing, and pivot evaluation

pub mod bucketer;
pub mod config;
pub mod evaluator;
pub mod fetcher;
pub mod format;
pub mod lookup;
pub mod normalizer;

pub use config::Config;
pub use evaluator::{CellOutput, Evaluator};
pub use fetcher::{DataSource, ResultsClient};
pub use lookup::PivotLookups;
pub use normalizer::{normalize_row, normalize_rows};
