//! Worker events are recorded inside the run span

use async_trait::async_trait;
use gesture_search::search::{ProbeOracle, ProbeOutcome, RunInput, SearchCoordinator};
use gesture_search::{CandidatePool, Code, SearchConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Remembers the name of the span current at every probe.
#[derive(Default)]
struct SpanRecorder {
    seen: Mutex<Vec<Option<&'static str>>>,
}

#[async_trait]
impl ProbeOracle for SpanRecorder {
    type Session = ();

    async fn open_session(&self, _input: &RunInput) -> anyhow::Result<()> {
        Ok(())
    }

    async fn probe(&self, _session: &mut (), _input: &RunInput, _code: &Code) -> ProbeOutcome {
        let name = tracing::Span::current().metadata().map(|m| m.name());
        self.seen.lock().unwrap().push(name);
        ProbeOutcome::failure()
    }
}

#[tokio::test]
async fn test_workers_run_inside_search_span() {
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());

    let codes = CandidatePool::generate().iter().take(12).copied().collect();
    let pool = Arc::new(CandidatePool::from_codes(codes));
    let oracle = Arc::new(SpanRecorder::default());
    let config = SearchConfig::default()
        .with_workers(3)
        .with_progress_interval(Duration::from_millis(5));

    let report = SearchCoordinator::new(config, pool, oracle.clone())
        .unwrap()
        .run(RunInput::new("activity", "uid=1").unwrap())
        .await
        .unwrap();
    assert_eq!(report.attempted, 12);

    let seen = oracle.seen.lock().unwrap();
    assert_eq!(seen.len(), 12);
    assert!(seen.iter().all(|name| *name == Some("search_run")));
}
