use num::ToPrimitive;

use crate::error::{Result, SimplexError};

/// Numeric knobs of the simplex engine.
///
/// `tolerance` is the threshold a goal coefficient or a ratio-test coefficient must exceed to count
/// as positive, and (scaled by the starting infeasibility) the residual phase 1 may leave behind
/// while still calling the problem feasible. A tolerance of zero gives plain `> 0.0` comparisons.
///
/// `max_pivots` caps the pivots of a single phase. There is no anti-cycling rule, so the cap is
/// what guarantees termination on degenerate problems.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimplexConfig {
    tolerance: f64,
    max_pivots: usize,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-9,
            max_pivots: 10_000,
        }
    }
}

impl SimplexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance<T: ToPrimitive>(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance.to_f64().unwrap_or(f64::NAN);
        self
    }

    pub fn with_max_pivots(mut self, max_pivots: usize) -> Self {
        self.max_pivots = max_pivots;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_pivots(&self) -> usize {
        self.max_pivots
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(SimplexError::InvalidConfig(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.max_pivots == 0 {
            return Err(SimplexError::InvalidConfig(
                "max_pivots must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
