// Core infrastructure shared by the pattern and search layers

pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::SearchConfig;
pub use errors::{Result, SearchError};
pub use metrics::{MetricsSnapshot, SearchMetrics};
