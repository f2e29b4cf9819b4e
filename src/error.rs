//! Error taxonomy (§7): each variant names its handling, not just its
//! cause, so callers can match on kind rather than string-sniffing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed policy, call, or config. Surfaced to the caller; no run
    /// side effects.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The candle store lacks the required window for a call. The call is
    /// marked `excluded`; the run continues.
    #[error("no coverage for call {call_id}: missing [{from_ms}, {to_ms}]")]
    NoCoverage {
        call_id: String,
        from_ms: i64,
        to_ms: i64,
    },

    /// Anchor candle missing, or its close is non-finite/non-positive.
    /// Path metrics come back empty; the policy yields `no_entry`. The run
    /// continues.
    #[error("invalid anchor for call {call_id}")]
    InvalidAnchor { call_id: String },

    /// An unexpected failure while running one (call, scenario) pair. No
    /// row is emitted; an entry is appended to `errors.ndjson`. The run
    /// continues.
    #[error("scenario {scenario_id} failed for call {call_id}: {message}")]
    ScenarioFailure {
        scenario_id: String,
        call_id: String,
        message: String,
    },

    /// One of I1-I6 was breached. Fatal: abort the run, mark the manifest
    /// `failed`, exit non-zero.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Cooperative cancellation. Partial artifacts are retained.
    #[error("run cancelled")]
    Cancelled,

    /// A per-call row or the manifest could not be written. Fatal.
    #[error("storage fault: {0}")]
    StorageFault(#[source] anyhow::Error),
}

impl EngineError {
    /// Process exit code per §6.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::BadInput(_) => 2,
            EngineError::NoCoverage { .. } => 3,
            EngineError::InvariantViolation(_) => 4,
            EngineError::Cancelled => 130,
            EngineError::InvalidAnchor { .. } | EngineError::ScenarioFailure { .. } => 1,
            EngineError::StorageFault(_) => 1,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
