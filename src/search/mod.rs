//! Concurrent search over a candidate pool
//!
//! [`SearchCoordinator`] drives a fixed pool of workers that pull candidates
//! from a shared [`SearchState`] and submit them to a [`ProbeOracle`].

pub mod attempt_log;
pub mod coordinator;
pub mod oracle;
pub mod progress;
pub mod simulated;
pub mod state;

pub use attempt_log::{
    AttemptLog, AttemptRecord, AttemptSink, JsonlAttemptLog, MemoryAttemptLog, TracingAttemptLog,
};
pub use coordinator::{SearchCoordinator, SearchOutcome, SearchReport, WorkerReport};
pub use oracle::{
    ConfirmationStatus, ConfirmationToken, OutcomeKind, ProbeOracle, ProbeOutcome, RunInput,
};
pub use progress::{ProgressReporter, ProgressSnapshot};
pub use simulated::{SimulatedOracle, SimulatedSession};
pub use state::{Dispatch, SearchState, StateSnapshot};
