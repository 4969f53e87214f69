//! Concurrency properties of the shared search state

use gesture_search::search::{Dispatch, SearchState};
use gesture_search::{CandidatePool, Code};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn state_with(n: usize) -> Arc<SearchState> {
    let codes = CandidatePool::generate().iter().take(n).copied().collect();
    Arc::new(SearchState::new(Arc::new(CandidatePool::from_codes(codes))))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_dispatch_hands_out_each_index_once() {
    const K: usize = 20_000;
    let state = state_with(K);

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Dispatch::Candidate { index, code } = state.dispatch() {
                    assert_eq!(state.pool().get(index), Some(code));
                    seen.push(index);
                    if seen.len() % 64 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
                seen
            })
        })
        .collect();

    let mut all = Vec::with_capacity(K);
    for handle in handles {
        let seen = handle.await.unwrap();
        // Each task observes strictly increasing indices.
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        all.extend(seen);
    }
    all.sort_unstable();
    assert_eq!(all, (0..K).collect::<Vec<_>>());
    assert!(state.snapshot().is_exhausted());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_at_most_one_success_transition() {
    let state = state_with(64);
    let candidates: Vec<(usize, Code)> = (0..32)
        .map(|_| match state.dispatch() {
            Dispatch::Candidate { index, code } => (index, code),
            Dispatch::NoMoreWork => panic!("pool too small"),
        })
        .collect();

    let handles: Vec<_> = candidates
        .into_iter()
        .map(|(index, code)| {
            let state = state.clone();
            tokio::spawn(async move {
                let won = state.try_record_success(index, code);
                (won, index, code)
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        let (won, index, code) = handle.await.unwrap();
        if won {
            winners.push((index, code));
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(state.answer(), Some(winners[0]));
    assert!(state.is_found());
}

#[tokio::test]
async fn test_no_dispatch_after_found() {
    let state = state_with(10);
    let (index, code) = match state.dispatch() {
        Dispatch::Candidate { index, code } => (index, code),
        Dispatch::NoMoreWork => panic!("expected a candidate"),
    };
    assert!(state.try_record_success(index, code));

    assert_eq!(state.dispatch(), Dispatch::NoMoreWork);
    assert_eq!(state.dispatch(), Dispatch::NoMoreWork);
    let snapshot = state.snapshot();
    assert_eq!(snapshot.cursor, 1);
    assert_eq!(snapshot.answer, Some((0, code)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_found_wakes_every_waiter() {
    let state = state_with(10);
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move { state.found().await })
        })
        .collect();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let code = state.pool().get(3).unwrap();
    assert!(state.try_record_success(3, code));

    for waiter in waiters {
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
