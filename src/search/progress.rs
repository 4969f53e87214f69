//! Periodic progress sampling

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::pattern::Code;
use crate::search::state::{SearchState, StateSnapshot};

/// One progress sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Candidates dispatched so far.
    pub attempted: usize,
    pub total: usize,
    pub percent: f64,
    pub last_code: Option<Code>,
    pub found: bool,
}

impl ProgressSnapshot {
    pub fn from_state(state: &SearchState) -> Self {
        let snapshot = state.snapshot();
        Self::from_parts(&snapshot, snapshot.last_dispatched(state.pool()).copied())
    }

    fn from_parts(snapshot: &StateSnapshot, last_code: Option<Code>) -> Self {
        let percent = if snapshot.total == 0 {
            100.0
        } else {
            snapshot.cursor as f64 / snapshot.total as f64 * 100.0
        };
        Self {
            attempted: snapshot.cursor,
            total: snapshot.total,
            percent,
            last_code,
            found: snapshot.found,
        }
    }

    /// Single-line rendering for terminals.
    pub fn display_line(&self) -> String {
        let last = self
            .last_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            "Progress: {:.2}% | attempted: {}/{} | last code: {}",
            self.percent, self.attempted, self.total, last
        )
    }
}

/// Samples a [`SearchState`] on a fixed interval until the run is found,
/// exhausted or cancelled, or until an optional stop signal fires.
///
/// Sampling takes the state lock for one copy and publishes with
/// `try_send`, so a slow consumer loses samples instead of slowing workers.
pub struct ProgressReporter {
    state: Arc<SearchState>,
    interval: Duration,
    sink: Option<mpsc::Sender<ProgressSnapshot>>,
    stop: Option<oneshot::Receiver<()>>,
}

impl ProgressReporter {
    pub fn new(state: Arc<SearchState>, interval: Duration) -> Self {
        Self {
            state,
            interval,
            sink: None,
            stop: None,
        }
    }

    /// Stop when `stop` fires or its sender is dropped.
    pub fn with_stop(mut self, stop: oneshot::Receiver<()>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_sink(mut self, sink: mpsc::Sender<ProgressSnapshot>) -> Self {
        self.sink = Some(sink);
        self
    }

    fn publish(&self, snapshot: ProgressSnapshot) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.try_send(snapshot) {
                debug!("Progress snapshot dropped: {}", e);
            }
        }
    }

    /// Run until a terminal condition is observed; returns the final sample.
    pub async fn run(mut self) -> ProgressSnapshot {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut stop = self.stop.take();

        loop {
            let stopped = match stop.as_mut() {
                Some(rx) => tokio::select! {
                    _ = ticker.tick() => false,
                    _ = rx => true,
                },
                None => {
                    ticker.tick().await;
                    false
                }
            };

            let state = self.state.snapshot();
            let snapshot = ProgressSnapshot::from_parts(
                &state,
                state.last_dispatched(self.state.pool()).copied(),
            );
            let done = stopped || state.found || state.cancelled || state.is_exhausted();

            if done {
                info!("{}", snapshot.display_line());
                self.publish(snapshot.clone());
                return snapshot;
            }

            debug!("{}", snapshot.display_line());
            self.publish(snapshot);
        }
    }
}
