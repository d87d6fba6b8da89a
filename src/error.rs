use thiserror::Error;

use crate::driver::DriverError;

/// Errors surfaced by the session controller.
///
/// Transient per-frame I/O failures never appear here; they are recovered
/// on the next tick or poll iteration and only show up in the engine
/// counters. The one user-visible failure mode is a failed start.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bus handle acquisition failed; the session remains Stopped.
    #[error("bus initialization failed: {0}")]
    StartFailed(#[source] DriverError),

    /// An engine thread could not be spawned; the partial start is rolled
    /// back before this is returned.
    #[error("failed to spawn engine thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
