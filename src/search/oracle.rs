//! Probe oracle contract
//!
//! The oracle is the only part of a run that talks to the outside world.
//! The coordinator treats [`ProbeOutcome`] as the whole contract and never
//! looks at how an oracle reaches its verdict.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::errors::{Result, SearchError};
use crate::pattern::Code;

/// Opaque session identifier and credential passed to every probe.
#[derive(Clone, PartialEq, Eq)]
pub struct RunInput {
    identifier: String,
    credential: String,
}

impl RunInput {
    /// Validate presence of both values.
    ///
    /// Both are kept exactly as given; a value made only of whitespace
    /// counts as missing.
    pub fn new(identifier: impl Into<String>, credential: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        let credential = credential.into();

        if identifier.trim().is_empty() {
            return Err(SearchError::invalid_input(
                "identifier",
                "must not be empty",
            ));
        }
        if credential.trim().is_empty() {
            return Err(SearchError::invalid_input(
                "credential",
                "must not be empty",
            ));
        }

        Ok(Self {
            identifier,
            credential,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }
}

// Keeps credentials out of logs.
impl fmt::Debug for RunInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunInput")
            .field("identifier", &self.identifier)
            .field("credential", &format_args!("<{} chars>", self.credential.len()))
            .finish()
    }
}

/// Whatever a successful probe hands back for the confirmation sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationToken(pub Option<String>);

impl ConfirmationToken {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }
}

/// Verdict of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The code was accepted.
    Success {
        token: ConfirmationToken,
        detail: Option<String>,
    },
    /// The code was rejected.
    Failure { detail: Option<String> },
    /// The probe could not reach a verdict; the code is not retried.
    TransientError { reason: String },
}

impl ProbeOutcome {
    pub fn success(token: ConfirmationToken) -> Self {
        Self::Success {
            token,
            detail: None,
        }
    }

    pub fn failure() -> Self {
        Self::Failure { detail: None }
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        Self::TransientError {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success { .. } => OutcomeKind::Success,
            Self::Failure { .. } => OutcomeKind::Failure,
            Self::TransientError { .. } => OutcomeKind::TransientError,
        }
    }

    /// Free-form text for the attempt log.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Success { detail, .. } | Self::Failure { detail } => detail.as_deref(),
            Self::TransientError { reason } => Some(reason),
        }
    }
}

/// Outcome tag without payload, used in attempt records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failure,
    TransientError,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Failure => "failure",
            OutcomeKind::TransientError => "transient_error",
        }
    }
}

/// Result of the confirmation sequence that follows the winning probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Confirmed,
    Failed(String),
}

impl ConfirmationStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// External collaborator that validates candidate codes.
///
/// Implementations own their transport. A session handle per worker is
/// created through [`ProbeOracle::open_session`] and never shared.
#[async_trait]
pub trait ProbeOracle: Send + Sync {
    /// Per-worker session state (connection, cookie jar, ...).
    type Session: Send + 'static;

    /// Open a private session for one worker.
    async fn open_session(&self, input: &RunInput) -> anyhow::Result<Self::Session>;

    /// Submit one candidate.
    async fn probe(&self, session: &mut Self::Session, input: &RunInput, code: &Code)
        -> ProbeOutcome;

    /// Follow-up calls after the first accepted success. Runs at most once
    /// per search; a failure here does not change the discovered code.
    async fn confirm(
        &self,
        _session: &mut Self::Session,
        _input: &RunInput,
        _code: &Code,
        _token: &ConfirmationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_input_passed_through_unchanged() {
        let input = RunInput::new(" 4000123 ", "a b\tc").unwrap();
        assert_eq!(input.identifier(), " 4000123 ");
        assert_eq!(input.credential(), "a b\tc");
    }

    #[test]
    fn test_run_input_requires_presence() {
        let err = RunInput::new("   ", "token").unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput { ref field, .. } if field == "identifier"));

        let err = RunInput::new("id", " \n ").unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput { ref field, .. } if field == "credential"));
    }

    #[test]
    fn test_debug_hides_credential() {
        let input = RunInput::new("id", "secret-value").unwrap();
        let printed = format!("{:?}", input);
        assert!(!printed.contains("secret-value"));
        assert!(printed.contains("12 chars"));
    }

    #[test]
    fn test_outcome_detail_and_kind() {
        let outcome = ProbeOutcome::transient("connection reset");
        assert_eq!(outcome.kind(), OutcomeKind::TransientError);
        assert_eq!(outcome.detail(), Some("connection reset"));
        assert!(ProbeOutcome::success(ConfirmationToken::none()).is_success());
        assert_eq!(ProbeOutcome::failure().detail(), None);
    }
}
