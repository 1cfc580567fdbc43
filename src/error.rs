//! Error types for brewlp.

use thiserror::Error;

use crate::blend::Ion;
use crate::solver::Status;

/// Error type for brewlp operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimplexError {
    /// A constraint row does not have one coefficient per goal entry.
    #[error("Shape mismatch: constraint row {row} has {got} coefficients, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// The right-hand side does not have one value per constraint row.
    #[error("Shape mismatch: {got} row values for {expected} constraint rows")]
    RowValuesLength { expected: usize, got: usize },

    /// A basis that is not a partial injective map from rows to columns.
    #[error("Invalid basis: {0}")]
    InvalidBasis(String),

    /// NaN or infinity in the input.
    #[error("Non-finite input: {0}")]
    NonFinite(String),

    /// A phase kept pivoting past the configured cap, most likely cycling on a degenerate basis.
    #[error("Iteration limit reached after {pivots} pivots")]
    IterationLimit { pivots: usize },

    /// The feasibility objective is bounded below by zero, so this only happens on numerical breakdown.
    #[error("Feasibility phase reported an unbounded objective")]
    PhaseOneUnbounded,

    /// Basis repair found an artificial variable still above the feasibility threshold.
    #[error("Artificial variable of row {row} still at {value} after phase 1")]
    ResidualArtificial { row: usize, value: f64 },

    /// Solver configuration rejected by `SimplexConfig::validate`.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A tracked ion has no target concentration.
    #[error("No target concentration for {0}")]
    MissingTarget(Ion),

    /// The blending problem did not reach an optimum.
    #[error("Salt blend has no solution: {0}")]
    NoSolution(Status),
}

/// Result type for brewlp operations.
pub type Result<T> = std::result::Result<T, SimplexError>;
