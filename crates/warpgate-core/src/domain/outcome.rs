//! Outcome model: the tagged result of one remote execution.
//!
//! An outcome is produced on the host for every descriptor it receives and is
//! sent back as a single base64 text reply. It is never persisted.

use serde::{Deserialize, Serialize};

use super::errors::RemoteError;

/// Which side of the gate a failure came from.
///
/// Serialized as SCREAMING_SNAKE_CASE: TASK / GATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureOrigin {
    /// The invoked operation itself returned an error (or panicked).
    Task,

    /// The host could not run the operation at all: unknown unit, missing
    /// artifact, contract mismatch, materialization or argument decode error.
    Gate,
}

/// Result of one remote execution.
///
/// - `SUCCESS`: `value` holds the operation's return value, encoded with
///   [`PayloadCodec`](crate::typed::PayloadCodec).
/// - `FAILURE`: `error` describes what was raised and `origin` tells the
///   client which error category to surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success {
        value: String,
    },
    Failure {
        origin: FailureOrigin,
        error: RemoteError,
    },
}

impl Outcome {
    pub fn success(value: impl Into<String>) -> Self {
        Self::Success {
            value: value.into(),
        }
    }

    pub fn task_failure(error: RemoteError) -> Self {
        Self::Failure {
            origin: FailureOrigin::Task,
            error,
        }
    }

    pub fn gate_failure(error: RemoteError) -> Self {
        Self::Failure {
            origin: FailureOrigin::Gate,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// `Some(origin)` for failures, `None` for success.
    pub fn failure_origin(&self) -> Option<FailureOrigin> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { origin, .. } => Some(*origin),
        }
    }
}
