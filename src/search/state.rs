//! Shared state of one search run
//!
//! Cursor, found flag and answer live behind a single mutex. Every critical
//! section is a handful of loads and stores with no `.await` inside, so the
//! lock is never held across a probe.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::pattern::{CandidatePool, Code};

/// Result of asking for the next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Candidate { index: usize, code: Code },
    NoMoreWork,
}

#[derive(Debug, Default)]
struct Inner {
    cursor: usize,
    found: bool,
    answer: Option<(usize, Code)>,
    cancelled: bool,
}

/// Read-only copy of the shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Next undispatched index, equal to the number of dispatched candidates.
    pub cursor: usize,
    pub total: usize,
    pub found: bool,
    /// Pool index and code of the discovered answer.
    pub answer: Option<(usize, Code)>,
    pub cancelled: bool,
}

impl StateSnapshot {
    /// Most recently dispatched code.
    pub fn last_dispatched<'a>(&self, pool: &'a CandidatePool) -> Option<&'a Code> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| pool.as_slice().get(i))
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.total
    }
}

/// Per-run search state, shared by reference between the coordinator, its
/// workers and the progress reporter.
#[derive(Debug)]
pub struct SearchState {
    pool: Arc<CandidatePool>,
    inner: Mutex<Inner>,
    found_signal: Notify,
}

impl SearchState {
    pub fn new(pool: Arc<CandidatePool>) -> Self {
        Self {
            pool,
            inner: Mutex::new(Inner::default()),
            found_signal: Notify::new(),
        }
    }

    pub fn pool(&self) -> &Arc<CandidatePool> {
        &self.pool
    }

    // No critical section can panic midway, so a poisoned lock still holds
    // consistent data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hand out the next candidate, or `NoMoreWork` once the run is found,
    /// cancelled or out of candidates.
    ///
    /// This is the only writer of the cursor, so each index is handed out
    /// exactly once and in increasing order.
    pub fn dispatch(&self) -> Dispatch {
        let mut inner = self.lock();
        if inner.found || inner.cancelled {
            return Dispatch::NoMoreWork;
        }
        match self.pool.get(inner.cursor) {
            Some(code) => {
                let index = inner.cursor;
                inner.cursor += 1;
                Dispatch::Candidate { index, code }
            }
            None => Dispatch::NoMoreWork,
        }
    }

    /// Success transition. Returns `true` for exactly one caller per run;
    /// later callers lost the race and must discard their result.
    pub fn try_record_success(&self, index: usize, code: Code) -> bool {
        {
            let mut inner = self.lock();
            if inner.found {
                return false;
            }
            inner.found = true;
            inner.answer = Some((index, code));
        }
        self.found_signal.notify_waiters();
        true
    }

    /// Stop handing out candidates. Probes already in flight finish.
    pub fn cancel(&self) {
        self.lock().cancelled = true;
    }

    pub fn is_found(&self) -> bool {
        self.lock().found
    }

    pub fn answer(&self) -> Option<(usize, Code)> {
        self.lock().answer
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.lock();
        StateSnapshot {
            cursor: inner.cursor,
            total: self.pool.len(),
            found: inner.found,
            answer: inner.answer,
            cancelled: inner.cancelled,
        }
    }

    /// Resolves once the success transition has happened.
    pub async fn found(&self) {
        loop {
            let notified = self.found_signal.notified();
            if self.is_found() {
                return;
            }
            notified.await;
        }
    }
}
