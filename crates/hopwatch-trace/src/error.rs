use std::io;
use thiserror::Error;

/// Errors a caller can see from `RunController::start`. Per-line and per-row
/// problems are absorbed and never show up here.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("target host is empty")]
    InvalidTarget,

    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error("failed to launch {program}: {source}")]
    ProcessUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },
}
