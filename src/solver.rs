use rustc_hash::FxHashMap;

use std::fmt;

use crate::error::Result;
use crate::model::Problem;
use crate::tableau::Tableau;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Optimal,
    Unbounded,
    Infeasible,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Optimal => write!(f, "Optimal"),
            Status::Unbounded => write!(f, "Unbounded"),
            Status::Infeasible => write!(f, "Infeasible"),
        }
    }
}

pub trait SolveAlgorithm {
    fn solve(&self, problem: &Problem) -> Result<Solution>;
}

/// Outcome of a two-phase solve.
///
/// For `Unbounded` the values are those of the last basis reached, which is feasible but not
/// optimal. For `Infeasible` there are no values and no goal value; `tableau` is then the final
/// phase-1 tableau and `infeasibility` the residual it could not remove.
#[derive(Clone, Debug)]
pub struct Solution {
    status: Status,
    variable_values: FxHashMap<usize, f64>,
    goal_value: Option<f64>,
    infeasibility: f64,
    pivots: usize,
    tableau: Tableau,
}

impl Solution {
    pub(crate) fn new(status: Status, tableau: Tableau, infeasibility: f64, pivots: usize) -> Self {
        let (variable_values, goal_value) = match status {
            Status::Infeasible => (FxHashMap::default(), None),
            Status::Optimal | Status::Unbounded => {
                (tableau.variable_values(), Some(tableau.goal_value()))
            }
        };
        Self {
            status,
            variable_values,
            goal_value,
            infeasibility,
            pivots,
            tableau,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn variable_values(&self) -> &FxHashMap<usize, f64> {
        &self.variable_values
    }

    /// Value of column `var`; non-basic columns are zero.
    pub fn value(&self, var: usize) -> f64 {
        self.variable_values.get(&var).copied().unwrap_or(0.0)
    }

    pub fn goal_value(&self) -> Option<f64> {
        self.goal_value
    }

    /// Residual of the feasibility objective after phase 1.
    pub fn infeasibility(&self) -> f64 {
        self.infeasibility
    }

    /// Pivots performed across both phases, basis repair included.
    pub fn pivots(&self) -> usize {
        self.pivots
    }

    /// Final tableau, for diagnostics.
    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }
}
