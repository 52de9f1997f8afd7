//! Outcome resolver: turns a reply into a value or a categorized error.
//!
//! ```text
//! Pending ─┬─> Resolved(value)
//!          ├─> RemoteTaskFailure(error)   origin = TASK
//!          ├─> GateFailure(error)         origin = GATE
//!          └─> TransportError             reply is not an Outcome
//! ```
//! Every state is terminal.

use serde::de::DeserializeOwned;

use crate::domain::errors::{GateError, TransportError};
use crate::domain::outcome::{FailureOrigin, Outcome};
use crate::typed::codec::PayloadCodec;

/// Decode the raw reply text into an [`Outcome`].
pub fn decode_reply(reply: &str) -> Result<Outcome, TransportError> {
    PayloadCodec::decode(reply).map_err(|e| TransportError::MalformedReply(e.to_string()))
}

/// Resolve an already decoded outcome.
pub fn resolve_outcome<R: DeserializeOwned>(outcome: Outcome) -> Result<R, GateError> {
    match outcome {
        Outcome::Success { value } => Ok(PayloadCodec::decode(&value)?),
        Outcome::Failure {
            origin: FailureOrigin::Task,
            error,
        } => Err(GateError::RemoteTaskFailure(error)),
        Outcome::Failure {
            origin: FailureOrigin::Gate,
            error,
        } => Err(GateError::GateFailure(error)),
    }
}

pub fn resolve<R: DeserializeOwned>(reply: &str) -> Result<R, GateError> {
    resolve_outcome(decode_reply(reply)?)
}
