// Core infrastructure modules
pub mod core;

// Grid geometry and the candidate pool
pub mod pattern;

// Worker pool, shared state and the oracle seam
pub mod search;

// Re-exports for convenience
pub use core::config::SearchConfig;
pub use core::errors::{Result, SearchError};
pub use core::metrics::{MetricsSnapshot, SearchMetrics};
pub use pattern::{CandidatePool, Code, PoolStats, TOTAL_CODES};
pub use search::{
    ConfirmationStatus, ConfirmationToken, ProbeOracle, ProbeOutcome, RunInput,
    SearchCoordinator, SearchOutcome, SearchReport, SimulatedOracle,
};
