//! Error types for ring settlement

use thiserror::Error;

/// Result type for ring settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ring settlement errors
///
/// Every variant is a ring-level failure: nothing is recovered or retried
/// inside the crate, and no partial transfer list is ever returned.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration or out-of-domain parameter
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A post-resolution bound check failed
    #[error("Invariant violation at order {index}: {detail}")]
    InvariantViolation {
        /// Position of the offending order in the ring
        index: usize,
        /// Which bound failed
        detail: String,
    },

    /// Scaler or registry call failed, timed out, or returned an unusable result
    #[error("Collaborator failure: {0}")]
    CollaboratorFailure(String),

    /// A 256-bit computation overflowed or underflowed
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Division by a zero amount
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Ring is malformed or has been invalidated
    #[error("Invalid ring: {0}")]
    InvalidRing(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the ring itself must be marked invalid
    pub fn invalidates_ring(&self) -> bool {
        matches!(
            self,
            Error::CollaboratorFailure(_)
                | Error::InvariantViolation { .. }
                | Error::ArithmeticOverflow(_)
                | Error::DivisionByZero(_)
                | Error::InvalidRing(_)
        )
    }
}
