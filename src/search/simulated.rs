//! In-process oracle with a known secret code
//!
//! Used by the command line demo and by tests to exercise the coordinator
//! under latency and transient failures without any network.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::pattern::Code;
use crate::search::oracle::{ConfirmationToken, ProbeOracle, ProbeOutcome, RunInput};

/// Simulated oracle accepting exactly one secret code.
#[derive(Debug)]
pub struct SimulatedOracle {
    secret: Code,
    latency: Duration,
    jitter: Duration,
    transient_rate: f64,
    fail_confirmation: bool,
    seed: Option<u64>,
    sessions_opened: AtomicU64,
    confirmations: AtomicU64,
}

/// Per-worker state: a private RNG, so no worker contends on another's.
#[derive(Debug)]
pub struct SimulatedSession {
    rng: fastrand::Rng,
    probes: u64,
}

impl SimulatedSession {
    pub fn probes(&self) -> u64 {
        self.probes
    }
}

impl SimulatedOracle {
    pub fn new(secret: Code) -> Self {
        Self {
            secret,
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
            transient_rate: 0.0,
            fail_confirmation: false,
            seed: None,
            sessions_opened: AtomicU64::new(0),
            confirmations: AtomicU64::new(0),
        }
    }

    /// Fixed delay before every verdict, plus up to `jitter` extra.
    pub fn with_latency(mut self, latency: Duration, jitter: Duration) -> Self {
        self.latency = latency;
        self.jitter = jitter;
        self
    }

    /// Probability in `[0, 1]` that a probe of a wrong code reports a
    /// transient error instead of a failure. The secret always succeeds.
    pub fn with_transient_rate(mut self, rate: f64) -> Self {
        self.transient_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_failing_confirmation(mut self, fail: bool) -> Self {
        self.fail_confirmation = fail;
        self
    }

    /// Seed session RNGs; session `n` uses `seed + n`.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn secret(&self) -> Code {
        self.secret
    }

    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn confirmations(&self) -> u64 {
        self.confirmations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProbeOracle for SimulatedOracle {
    type Session = SimulatedSession;

    async fn open_session(&self, _input: &RunInput) -> anyhow::Result<SimulatedSession> {
        let n = self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        let rng = match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed.wrapping_add(n)),
            None => fastrand::Rng::new(),
        };
        Ok(SimulatedSession { rng, probes: 0 })
    }

    async fn probe(
        &self,
        session: &mut SimulatedSession,
        _input: &RunInput,
        code: &Code,
    ) -> ProbeOutcome {
        session.probes += 1;

        let mut delay = self.latency;
        if !self.jitter.is_zero() {
            let extra = session.rng.u64(0..=self.jitter.as_millis() as u64);
            delay += Duration::from_millis(extra);
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *code == self.secret {
            return ProbeOutcome::Success {
                token: ConfirmationToken::new(format!("sim-{}", code)),
                detail: Some("{\"result\":1}".to_string()),
            };
        }

        if self.transient_rate > 0.0 && session.rng.f64() < self.transient_rate {
            return ProbeOutcome::transient("simulated connection reset");
        }

        ProbeOutcome::Failure {
            detail: Some("{\"result\":0,\"errorMsg\":\"wrong code\"}".to_string()),
        }
    }

    async fn confirm(
        &self,
        _session: &mut SimulatedSession,
        _input: &RunInput,
        code: &Code,
        token: &ConfirmationToken,
    ) -> anyhow::Result<()> {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        if self.fail_confirmation {
            anyhow::bail!("simulated confirmation failure for {}", code);
        }
        anyhow::ensure!(
            token.0.as_deref() == Some(format!("sim-{}", code).as_str()),
            "confirmation token does not match {}",
            code
        );
        Ok(())
    }
}
