//! Error types for torus-life.

use thiserror::Error;

/// Errors surfaced at construction or configuration time.
///
/// Every variant is caller-correctable: retry with fixed input. Invariant
/// violations inside a committed step (a neighbor count leaving `0..=8`, a
/// row-band partition not covering the grid) are asserts, not errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// An explicit seed sequence's length did not match the grid area.
    #[error("seed length {got} does not match grid area {expected}")]
    SeedLength {
        /// Expected number of cells (N²).
        expected: usize,
        /// Number of cells actually provided.
        got: usize,
    },

    /// Grid dimension was zero.
    #[error("grid dimension must be positive")]
    ZeroDimension,

    /// Alive probability outside `0.0..=1.0`.
    #[error("alive probability {0} is outside 0.0..=1.0")]
    InvalidProbability(f64),

    /// Parallel stepping configured with zero worker threads.
    #[error("worker count must be positive")]
    ZeroWorkers,
}
