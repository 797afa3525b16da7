use thiserror::Error;

/// Error kinds exposed by the simulation core.
///
/// `InvalidRange` and `CapacityViolation` are fatal: the former is raised at
/// configuration time, the latter indicates an invariant was about to break.
/// `OracleFailure` is recoverable — callers absorb it and treat the affected
/// vehicle as removed at the next reconciliation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid stepped range (min={min}, max={max}, step={step})")]
    InvalidRange { min: i64, max: i64, step: i64 },

    #[error("capacity violation: {0}")]
    CapacityViolation(String),

    #[error("mobility oracle failure: {0}")]
    OracleFailure(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
