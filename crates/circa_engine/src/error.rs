use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The driver task has shut down; no further commands are accepted
    #[error("simulation engine is no longer running")]
    Closed,

    #[error("unsupported speed factor {0}x (expected 1, 60 or 3600)")]
    UnsupportedSpeed(u32),
}
