//! Search coordinator - spawns the worker pool and drives one run to its end
//!
//! A run moves `Idle -> Running -> {Found, Exhausted}`; external
//! cancellation or the run deadline can also end it as `Cancelled`.
//! Workers pull candidates from the shared [`SearchState`]; the first worker
//! whose probe succeeds wins the success transition and performs the single
//! confirmation sequence. Everything else observes `found` at its next
//! dispatch and exits.

use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::config::SearchConfig;
use crate::core::errors::{Result, SearchError};
use crate::core::metrics::{MetricsSnapshot, SearchMetrics};
use crate::pattern::{CandidatePool, Code};
use crate::search::attempt_log::{
    AttemptLog, AttemptRecord, AttemptSink, JsonlAttemptLog, TracingAttemptLog,
};
use crate::search::oracle::{ConfirmationStatus, ProbeOracle, ProbeOutcome, RunInput};
use crate::search::progress::{ProgressReporter, ProgressSnapshot};
use crate::search::state::{Dispatch, SearchState};

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// One probe succeeded.
    Found {
        code: Code,
        index: usize,
        confirmation: ConfirmationStatus,
    },
    /// Every candidate was probed and none succeeded.
    Exhausted,
    /// Stopped by a cancel signal or the run deadline before a verdict.
    Cancelled { attempted: usize },
    /// Every worker stopped early (e.g. no worker could open a session).
    Aborted { attempted: usize, reason: String },
}

impl SearchOutcome {
    pub fn code(&self) -> Option<Code> {
        match self {
            SearchOutcome::Found { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }
}

/// What one worker did during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub probes: u64,
    pub failures: u64,
    pub transient_errors: u64,
    /// Set only on the worker that won the success transition.
    pub confirmation: Option<ConfirmationStatus>,
}

/// Full result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub run_id: String,
    pub outcome: SearchOutcome,
    /// Candidates dispatched (the final cursor).
    pub attempted: usize,
    pub total: usize,
    pub elapsed_ms: u64,
    pub metrics: MetricsSnapshot,
    pub workers: Vec<WorkerReport>,
    pub final_progress: ProgressSnapshot,
}

/// Everything a worker needs, cloned once per worker.
struct WorkerContext<O: ProbeOracle> {
    state: Arc<SearchState>,
    oracle: Arc<O>,
    input: Arc<RunInput>,
    attempts: Arc<dyn AttemptSink>,
    metrics: Arc<SearchMetrics>,
    probe_timeout: Option<Duration>,
    response_truncate: usize,
}

impl<O: ProbeOracle> Clone for WorkerContext<O> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            oracle: self.oracle.clone(),
            input: self.input.clone(),
            attempts: self.attempts.clone(),
            metrics: self.metrics.clone(),
            probe_timeout: self.probe_timeout,
            response_truncate: self.response_truncate,
        }
    }
}

/// Cancels the run when dropped, so abandoning the run future stops dispatch
/// to every detached worker.
struct CancelOnDrop(Arc<SearchState>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Coordinates a pool of workers over one candidate pool.
pub struct SearchCoordinator<O: ProbeOracle + 'static> {
    config: SearchConfig,
    pool: Arc<CandidatePool>,
    oracle: Arc<O>,
    extra_sinks: Vec<Arc<dyn AttemptSink>>,
    progress_tx: Option<mpsc::Sender<ProgressSnapshot>>,
}

impl<O: ProbeOracle + 'static> SearchCoordinator<O> {
    pub fn new(config: SearchConfig, pool: Arc<CandidatePool>, oracle: Arc<O>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pool,
            oracle,
            extra_sinks: Vec::new(),
            progress_tx: None,
        })
    }

    /// Also send attempt records to `sink`.
    pub fn with_attempt_sink(mut self, sink: Arc<dyn AttemptSink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    /// Publish progress snapshots on `tx`.
    pub fn with_progress_sink(mut self, tx: mpsc::Sender<ProgressSnapshot>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Create a bounded progress channel sized from the config.
    pub fn progress_channel(&self) -> (mpsc::Sender<ProgressSnapshot>, mpsc::Receiver<ProgressSnapshot>) {
        mpsc::channel(self.config.progress_channel_capacity)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run until found or exhausted.
    pub async fn run(self, input: RunInput) -> Result<SearchReport> {
        let (_keep_open, cancel_rx) = oneshot::channel();
        self.run_with_cancel(input, cancel_rx).await
    }

    /// Run until found, exhausted, cancelled through `cancel_rx`, or past
    /// the configured run deadline. Dropping the sender never cancels.
    pub async fn run_with_cancel(
        self,
        input: RunInput,
        cancel_rx: oneshot::Receiver<()>,
    ) -> Result<SearchReport> {
        let attempts = self.build_attempt_log()?;
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "search_run",
            run_id = %run_id,
            workers = self.config.workers,
            pool_size = self.pool.len()
        );

        self.execute(run_id, input, attempts, cancel_rx)
            .instrument(span)
            .await
    }

    fn build_attempt_log(&self) -> Result<Arc<dyn AttemptSink>> {
        let mut log = AttemptLog::new().with_sink(TracingAttemptLog);
        if let Some(path) = &self.config.attempt_log_path {
            log = log.with_sink(JsonlAttemptLog::create(path)?);
        }
        for sink in &self.extra_sinks {
            log = log.with_sink(sink.clone());
        }
        Ok(Arc::new(log))
    }

    async fn execute(
        self,
        run_id: String,
        input: RunInput,
        attempts: Arc<dyn AttemptSink>,
        mut cancel_rx: oneshot::Receiver<()>,
    ) -> Result<SearchReport> {
        let started = Instant::now();
        let state = Arc::new(SearchState::new(self.pool.clone()));
        let metrics = Arc::new(SearchMetrics::new());
        let _cancel_guard = CancelOnDrop(state.clone());

        info!(
            "Search running: {} candidates, {} workers",
            self.pool.len(),
            self.config.workers
        );

        let ctx = WorkerContext {
            state: state.clone(),
            oracle: self.oracle.clone(),
            input: Arc::new(input),
            attempts: attempts.clone(),
            metrics: metrics.clone(),
            probe_timeout: self.config.probe_timeout(),
            response_truncate: self.config.response_truncate,
        };

        let handles: Vec<_> = (0..self.config.workers)
            .map(|worker_id| tokio::spawn(run_worker(ctx.clone(), worker_id).in_current_span()))
            .collect();

        let (stop_tx, stop_rx) = oneshot::channel();
        let mut reporter = ProgressReporter::new(state.clone(), self.config.progress_interval())
            .with_stop(stop_rx);
        if let Some(tx) = self.progress_tx.clone() {
            reporter = reporter.with_sink(tx);
        }
        let reporter_handle = tokio::spawn(reporter.run().in_current_span());

        let run_deadline = self.config.run_timeout();
        let deadline = async move {
            match run_deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let all_workers = join_all(handles);
        tokio::pin!(all_workers);

        let mut found_seen = false;
        let mut cancel_closed = false;
        let mut deadline_fired = false;

        let joined = loop {
            tokio::select! {
                joined = &mut all_workers => break joined,
                _ = state.found(), if !found_seen => {
                    found_seen = true;
                    info!("Answer found, stopping remaining dispatch");
                    state.cancel();
                }
                signal = &mut cancel_rx, if !cancel_closed => {
                    cancel_closed = true;
                    if signal.is_ok() {
                        info!("Cancel requested, waiting for in-flight probes");
                        state.cancel();
                    }
                }
                _ = &mut deadline, if !deadline_fired => {
                    deadline_fired = true;
                    warn!("Run deadline reached, waiting for in-flight probes");
                    state.cancel();
                }
            }
        };

        let mut workers = Vec::with_capacity(joined.len());
        for (worker_id, result) in joined.into_iter().enumerate() {
            match result {
                Ok(report) => workers.push(report),
                Err(e) => {
                    metrics.record_worker_fault();
                    let err = SearchError::internal(format!(
                        "worker {} terminated abnormally: {}",
                        worker_id, e
                    ));
                    error!(category = err.category(), "{}", err);
                    workers.push(WorkerReport {
                        worker_id,
                        ..WorkerReport::default()
                    });
                }
            }
        }

        let _ = stop_tx.send(());
        let final_progress = match reporter_handle.await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Progress reporter terminated abnormally: {}", e);
                ProgressSnapshot::from_state(&state)
            }
        };
        attempts.flush();

        let snapshot = state.snapshot();
        let outcome = match snapshot.answer {
            Some((index, code)) => {
                let confirmation = workers
                    .iter()
                    .find_map(|w| w.confirmation.clone())
                    .unwrap_or_else(|| {
                        ConfirmationStatus::Failed("confirmation did not complete".to_string())
                    });
                SearchOutcome::Found {
                    code,
                    index,
                    confirmation,
                }
            }
            None if snapshot.is_exhausted() => SearchOutcome::Exhausted,
            None if snapshot.cancelled => SearchOutcome::Cancelled {
                attempted: snapshot.cursor,
            },
            None => SearchOutcome::Aborted {
                attempted: snapshot.cursor,
                reason: "all workers stopped before the pool was exhausted".to_string(),
            },
        };

        match &outcome {
            SearchOutcome::Found { code, index, confirmation } => info!(
                "Search found {} (candidate {} of {}), confirmation: {:?}",
                code,
                index + 1,
                snapshot.total,
                confirmation
            ),
            SearchOutcome::Exhausted => info!(
                "Search exhausted {} candidates, nothing found",
                snapshot.total
            ),
            SearchOutcome::Cancelled { attempted } => {
                info!("Search cancelled after {} candidates", attempted)
            }
            SearchOutcome::Aborted { attempted, reason } => {
                error!("Search aborted after {} candidates: {}", attempted, reason)
            }
        }

        Ok(SearchReport {
            run_id,
            outcome,
            attempted: snapshot.cursor,
            total: snapshot.total,
            elapsed_ms: started.elapsed().as_millis() as u64,
            metrics: metrics.snapshot(),
            workers,
            final_progress,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Await an oracle call with the probe timeout, containing panics.
async fn guarded<T, F>(fut: F, timeout: Option<Duration>) -> std::result::Result<T, GuardError>
where
    F: Future<Output = T>,
{
    let fut = AssertUnwindSafe(fut).catch_unwind();
    let caught = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(caught) => caught,
            Err(_) => return Err(GuardError::TimedOut(limit)),
        },
        None => fut.await,
    };
    caught.map_err(|payload| GuardError::Panicked(panic_message(payload.as_ref())))
}

enum GuardError {
    TimedOut(Duration),
    Panicked(String),
}

async fn probe_once<O: ProbeOracle>(
    ctx: &WorkerContext<O>,
    session: &mut O::Session,
    worker_id: usize,
    code: &Code,
) -> ProbeOutcome {
    match guarded(ctx.oracle.probe(session, &ctx.input, code), ctx.probe_timeout).await {
        Ok(outcome) => outcome,
        Err(GuardError::TimedOut(limit)) => {
            ctx.metrics.record_timeout();
            let err = SearchError::timeout(format!("probe {}", code), limit.as_millis() as u64);
            ProbeOutcome::transient(err.to_string())
        }
        Err(GuardError::Panicked(message)) => {
            ctx.metrics.record_worker_fault();
            let err = SearchError::probe(code.to_string(), format!("panicked: {}", message));
            error!(worker = worker_id, category = err.category(), "{}", err);
            ProbeOutcome::transient(err.to_string())
        }
    }
}

async fn run_worker<O: ProbeOracle>(ctx: WorkerContext<O>, worker_id: usize) -> WorkerReport {
    let mut report = WorkerReport {
        worker_id,
        ..WorkerReport::default()
    };

    let mut session = match guarded(ctx.oracle.open_session(&ctx.input), ctx.probe_timeout).await {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            ctx.metrics.record_worker_fault();
            error!("Worker {} could not open a session: {:#}", worker_id, e);
            return report;
        }
        Err(GuardError::TimedOut(limit)) => {
            ctx.metrics.record_worker_fault();
            error!("Worker {} session open timed out after {:?}", worker_id, limit);
            return report;
        }
        Err(GuardError::Panicked(message)) => {
            ctx.metrics.record_worker_fault();
            error!("Worker {} session open panicked: {}", worker_id, message);
            return report;
        }
    };

    loop {
        let (index, code) = match ctx.state.dispatch() {
            Dispatch::Candidate { index, code } => (index, code),
            Dispatch::NoMoreWork => break,
        };

        ctx.metrics.record_probe();
        report.probes += 1;

        let outcome = probe_once(&ctx, &mut session, worker_id, &code).await;
        ctx.attempts.record(&AttemptRecord::new(
            worker_id,
            index,
            code,
            &outcome,
            ctx.response_truncate,
        ));

        match outcome {
            ProbeOutcome::Success { token, .. } => {
                if !ctx.state.try_record_success(index, code) {
                    ctx.metrics.record_discarded_success();
                    debug!("Worker {} discarding late success for {}", worker_id, code);
                    break;
                }

                info!("Worker {} found valid code {}", worker_id, code);
                let confirm = ctx.oracle.confirm(&mut session, &ctx.input, &code, &token);
                let status = match guarded(confirm, ctx.probe_timeout).await {
                    Ok(Ok(())) => ConfirmationStatus::Confirmed,
                    Ok(Err(e)) => ConfirmationStatus::Failed(format!("{:#}", e)),
                    Err(GuardError::TimedOut(limit)) => ConfirmationStatus::Failed(format!(
                        "confirmation timed out after {}ms",
                        limit.as_millis()
                    )),
                    Err(GuardError::Panicked(message)) => {
                        ctx.metrics.record_worker_fault();
                        ConfirmationStatus::Failed(format!("confirmation panicked: {}", message))
                    }
                };
                if let ConfirmationStatus::Failed(reason) = &status {
                    warn!("Confirmation for {} failed: {}", code, reason);
                }
                report.confirmation = Some(status);
                break;
            }
            ProbeOutcome::Failure { .. } => {
                ctx.metrics.record_failure();
                report.failures += 1;
            }
            ProbeOutcome::TransientError { reason } => {
                ctx.metrics.record_transient();
                report.transient_errors += 1;
                warn!("Worker {} transient error on {}: {}", worker_id, code, reason);
            }
        }
    }

    debug!("Worker {} exiting after {} probes", worker_id, report.probes);
    report
}
