use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by the session controller.
///
/// Commands invoked from a state where they are documented no-ops (e.g.
/// `pause()` while Idle) are logged and ignored rather than reported here.
/// Backend failures never propagate past the controller: each one ends in a
/// well-defined `SessionState` with the failure recorded in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SessionError {
    /// The backend could not open a recognition stream; the session never
    /// left Idle.
    #[error("recognition backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Audio delivery could not be resumed after a pause; the session was
    /// stopped.
    #[error("failed to resume audio delivery: {0}")]
    ResumeFailed(String),

    /// The backend reported an error mid-stream; the session was stopped.
    #[error("recognition error: {0}")]
    Recognition(String),
}
