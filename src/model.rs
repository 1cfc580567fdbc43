use ndarray::{Array1, Array2};
use rustc_hash::FxHashMap;
use tabular::{Row, Table};

use std::fmt;

use crate::error::{Result, SimplexError};

/// A linear program in augmented standard form:
///
/// ```text
/// minimise    initial_goal_value + goal . x
/// subject to  constraints . x = row_values
///             x >= 0
/// ```
///
/// Inequalities are expected to already carry their slack/surplus columns. Construction validates
/// the shapes and rejects non-finite numbers, so every `Problem` is safe to hand to a solver.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    pub(crate) goal: Array1<f64>,
    pub(crate) constraints: Array2<f64>,
    pub(crate) row_values: Array1<f64>,
    pub(crate) initial_goal_value: f64,
}

impl Problem {
    pub fn new(goal: Vec<f64>, constraints: Vec<Vec<f64>>, row_values: Vec<f64>) -> Result<Self> {
        let n = goal.len();
        for (i, row) in constraints.iter().enumerate() {
            if row.len() != n {
                return Err(SimplexError::RowLength {
                    row: i,
                    expected: n,
                    got: row.len(),
                });
            }
        }
        let m = constraints.len();
        let constraints = Array2::from_shape_fn((m, n), |(i, j)| constraints[i][j]);
        Self::from_arrays(Array1::from(goal), constraints, Array1::from(row_values))
    }

    pub fn from_arrays(
        goal: Array1<f64>,
        constraints: Array2<f64>,
        row_values: Array1<f64>,
    ) -> Result<Self> {
        if constraints.nrows() > 0 && constraints.ncols() != goal.len() {
            return Err(SimplexError::RowLength {
                row: 0,
                expected: goal.len(),
                got: constraints.ncols(),
            });
        }
        if row_values.len() != constraints.nrows() {
            return Err(SimplexError::RowValuesLength {
                expected: constraints.nrows(),
                got: row_values.len(),
            });
        }

        if let Some((j, v)) = goal.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SimplexError::NonFinite(format!("goal[{}] = {}", j, v)));
        }
        if let Some(((i, j), v)) = constraints.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimplexError::NonFinite(format!(
                "constraints[{}][{}] = {}",
                i, j, v
            )));
        }
        if let Some((i, v)) = row_values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SimplexError::NonFinite(format!("row_values[{}] = {}", i, v)));
        }

        // an empty constraint block still has to agree with the goal on column count
        let constraints = if constraints.nrows() == 0 {
            Array2::zeros((0, goal.len()))
        } else {
            constraints
        };

        Ok(Self {
            goal,
            constraints,
            row_values,
            initial_goal_value: 0.0,
        })
    }

    pub fn with_initial_goal_value(mut self, initial_goal_value: f64) -> Result<Self> {
        if !initial_goal_value.is_finite() {
            return Err(SimplexError::NonFinite(format!(
                "initial_goal_value = {}",
                initial_goal_value
            )));
        }
        self.initial_goal_value = initial_goal_value;
        Ok(self)
    }

    pub fn goal(&self) -> &Array1<f64> {
        &self.goal
    }

    pub fn constraints(&self) -> &Array2<f64> {
        &self.constraints
    }

    pub fn row_values(&self) -> &Array1<f64> {
        &self.row_values
    }

    pub fn initial_goal_value(&self) -> f64 {
        self.initial_goal_value
    }

    pub fn variable_count(&self) -> usize {
        self.goal.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.nrows()
    }

    /// Expand a sparse value map into one entry per column. Missing columns are zero.
    pub fn dense_values(&self, values: &FxHashMap<usize, f64>) -> Array1<f64> {
        Array1::from_shape_fn(self.variable_count(), |j| {
            values.get(&j).copied().unwrap_or(0.0)
        })
    }

    /// `constraints . x - row_values` for the original (un-normalised) rows.
    pub fn residuals(&self, values: &FxHashMap<usize, f64>) -> Array1<f64> {
        self.constraints.dot(&self.dense_values(values)) - &self.row_values
    }

    pub fn objective(&self, values: &FxHashMap<usize, f64>) -> f64 {
        self.initial_goal_value + self.goal.dot(&self.dense_values(values))
    }

    fn term_cells(coeffs: impl Iterator<Item = f64>, cells: &mut Vec<String>) {
        let mut first = true;
        for (j, coeff) in coeffs.enumerate() {
            if coeff == 0.0 {
                cells.push(String::new());
                cells.push(String::new());
                continue;
            }
            let sign = match (coeff < 0.0, first) {
                (true, _) => "-",
                (false, true) => "",
                (false, false) => "+",
            };
            cells.push(sign.to_string());
            cells.push(format!("{}*x{}", coeff.abs(), j));
            first = false;
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        //label, colon, sign/term pairs, comparison, constant
        let n = self.variable_count();
        let mut columns = "{:<}{:^}".to_string();
        columns += &" {:>}{:<}".repeat(n);
        columns += " {:^} {:>}";
        let mut table = Table::new(columns.as_str());

        let mut cells = vec!["Min".to_string(), ":".to_string()];
        Self::term_cells(self.goal.iter().copied(), &mut cells);
        cells.push("+".to_string());
        cells.push(format!("{}", self.initial_goal_value));
        table.add_row(Row::from_cells(cells));

        let mut cells = vec!["Subject to".to_string(), ":".to_string()];
        cells.extend(std::iter::repeat(String::new()).take(2 * n + 2));
        table.add_row(Row::from_cells(cells));

        for (row, value) in self.constraints.rows().into_iter().zip(self.row_values.iter()) {
            let mut cells = vec![String::new(), String::new()];
            Self::term_cells(row.iter().copied(), &mut cells);
            cells.push("=".to_string());
            cells.push(format!("{}", value));
            table.add_row(Row::from_cells(cells));
        }

        write!(f, "{}", table)
    }
}
