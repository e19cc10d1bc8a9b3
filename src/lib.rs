pub mod analysis;
pub mod app;
pub mod args;
pub mod cache;
pub mod config;
pub mod error;
pub mod interactive;
pub mod loader;
pub mod records;
pub mod report;
pub mod stats;
pub mod utils;

pub use analysis::{analyze, analyze_all};
pub use args::Args;
pub use cache::AnalysisCache;
pub use error::{LoadError, SchemaError};
pub use loader::{DataSource, Dataset};
pub use records::{BlogUrlRow, BlogUrlTable, KeywordRow, PositionBucket, PositionDistribution};
pub use stats::{AnalysisResult, BlogCoverage, SideStats};
