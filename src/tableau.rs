use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};
use rustc_hash::{FxHashMap, FxHashSet};
use tabular::{Row, Table};

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, SimplexError};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableauIx {
    i: usize,
    j: usize,
}

impl TableauIx {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }

    /// Leaving row.
    pub fn i(&self) -> usize {
        self.i
    }

    /// Entering column.
    pub fn j(&self) -> usize {
        self.j
    }
}

/// State of one simplex phase, stored as a single flat table:
///
/// ```text
///            x0 .. x(n-1) | rhs
/// row 0..m   matrix       | row_values
/// carried    carried rows | their values
/// goal       goal         | goal_value
/// ```
///
/// Goal coefficients use the "positive improves" convention: a column with a positive goal entry
/// lowers the phase objective when it enters, and `goal_value` is the objective of the current
/// basic solution. Carried rows go through every elimination step but never leave the basis,
/// which is how phase 1 transports the real objective into phase 2.
#[derive(Clone, Debug, PartialEq)]
pub struct Tableau {
    pub(crate) tbl: Array2<f64>,
    pub(crate) basis: Vec<Option<usize>>,
    pub(crate) carried: usize,
}

/// Flip every row with a negative right-hand side so that all right-hand sides are non-negative.
/// Returns the indices of the flipped rows.
pub fn normalize_rows(mut matrix: ArrayViewMut2<f64>, mut row_values: ArrayViewMut1<f64>) -> Vec<usize> {
    assert_eq!(matrix.nrows(), row_values.len());
    let mut flipped = Vec::new();
    for (i, (mut row, value)) in matrix
        .axis_iter_mut(Axis(0))
        .zip(row_values.iter_mut())
        .enumerate()
    {
        if *value < 0.0_f64 {
            *value *= -1.0_f64;
            row *= -1.0_f64;
            flipped.push(i);
        }
    }
    flipped
}

impl Tableau {
    //constructor
    pub fn new(
        goal: Array1<f64>,
        matrix: Array2<f64>,
        row_values: Array1<f64>,
        goal_value: f64,
        basis: Vec<Option<usize>>,
    ) -> Result<Self> {
        let n = goal.len();
        Self::assemble(
            goal,
            matrix,
            row_values,
            goal_value,
            Array2::zeros((0, n)),
            Array1::zeros(0),
            basis,
        )
    }

    /// Build a tableau whose last constraint-block rows are carried rows.
    pub(crate) fn with_carried(
        goal: Array1<f64>,
        matrix: Array2<f64>,
        row_values: Array1<f64>,
        goal_value: f64,
        carried: Array2<f64>,
        carried_values: Array1<f64>,
    ) -> Result<Self> {
        let m = matrix.nrows();
        Self::assemble(
            goal,
            matrix,
            row_values,
            goal_value,
            carried,
            carried_values,
            vec![None; m],
        )
    }

    fn assemble(
        goal: Array1<f64>,
        matrix: Array2<f64>,
        row_values: Array1<f64>,
        goal_value: f64,
        carried: Array2<f64>,
        carried_values: Array1<f64>,
        basis: Vec<Option<usize>>,
    ) -> Result<Self> {
        let n = goal.len();
        let m = matrix.nrows();
        let c = carried.nrows();
        if m > 0 && matrix.ncols() != n {
            return Err(SimplexError::RowLength {
                row: 0,
                expected: n,
                got: matrix.ncols(),
            });
        }
        if c > 0 && carried.ncols() != n {
            return Err(SimplexError::RowLength {
                row: m,
                expected: n,
                got: carried.ncols(),
            });
        }
        if row_values.len() != m {
            return Err(SimplexError::RowValuesLength {
                expected: m,
                got: row_values.len(),
            });
        }
        if carried_values.len() != c {
            return Err(SimplexError::RowValuesLength {
                expected: c,
                got: carried_values.len(),
            });
        }
        Self::check_basis(&basis, m, n)?;

        let mut tbl = Array2::<f64>::zeros((m + c + 1, n + 1));
        if m > 0 {
            tbl.slice_mut(s![..m, ..n]).assign(&matrix);
            tbl.slice_mut(s![..m, n]).assign(&row_values);
        }
        if c > 0 {
            tbl.slice_mut(s![m..m + c, ..n]).assign(&carried);
            tbl.slice_mut(s![m..m + c, n]).assign(&carried_values);
        }
        tbl.slice_mut(s![m + c, ..n]).assign(&goal);
        tbl[[m + c, n]] = goal_value;

        Ok(Self {
            tbl,
            basis,
            carried: c,
        })
    }

    fn check_basis(basis: &[Option<usize>], m: usize, n: usize) -> Result<()> {
        if basis.len() != m {
            return Err(SimplexError::InvalidBasis(format!(
                "{} basis entries for {} rows",
                basis.len(),
                m
            )));
        }
        let mut seen = FxHashSet::default();
        for (row, var) in basis.iter().enumerate() {
            if let Some(var) = var {
                if *var >= n {
                    return Err(SimplexError::InvalidBasis(format!(
                        "row {} names column {} of {}",
                        row, var, n
                    )));
                }
                if !seen.insert(*var) {
                    return Err(SimplexError::InvalidBasis(format!(
                        "column {} is basic in more than one row",
                        var
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn tbl(&self) -> &Array2<f64> {
        &self.tbl
    }

    /// Number of constraint rows, carried rows excluded.
    pub fn constraint_count(&self) -> usize {
        self.tbl.nrows() - self.carried - 1
    }

    pub(crate) fn carried_count(&self) -> usize {
        self.carried
    }

    pub fn variable_count(&self) -> usize {
        self.tbl.ncols() - 1
    }

    pub fn goal(&self) -> ArrayView1<f64> {
        self.tbl.slice(s![-1, ..-1])
    }

    pub fn goal_value(&self) -> f64 {
        self.tbl[[self.tbl.nrows() - 1, self.tbl.ncols() - 1]]
    }

    pub fn matrix(&self) -> ArrayView2<f64> {
        self.tbl.slice(s![..self.constraint_count(), ..-1])
    }

    pub fn row_values(&self) -> ArrayView1<f64> {
        self.tbl.slice(s![..self.constraint_count(), -1])
    }

    pub fn basis(&self) -> &[Option<usize>] {
        &self.basis
    }

    pub(crate) fn set_row_value(&mut self, row: usize, value: f64) {
        let n = self.variable_count();
        self.tbl[[row, n]] = value;
    }

    /// Dantzig's rule: the column with the greatest goal coefficient above `tol`. The first column
    /// attaining the maximum wins.
    pub fn entering_variable(&self, tol: f64) -> Option<usize> {
        self.goal()
            .iter()
            .enumerate()
            .filter(|(_j, v)| **v > tol)
            .min_by(|(_j1, v1), (_j2, v2)| v2.partial_cmp(v1).unwrap_or(Ordering::Equal))
            .map(|(j, _v)| j)
    }

    /// Ratio test over the constraint rows. Carried rows never leave. The first row attaining the
    /// minimum ratio wins.
    ///
    /// Row values within `tol` below zero are rounding residue of a degenerate row and count as
    /// zero, so such a row still blocks the entering column.
    pub fn leaving_row(&self, entering: usize, tol: f64) -> Option<usize> {
        let m = self.constraint_count();
        self.tbl
            .slice(s![..m, entering])
            .iter()
            .zip(self.tbl.slice(s![..m, -1]))
            .enumerate()
            .filter(|(_i, (a, b))| **a > tol && **b >= -tol)
            .map(|(i, (a, b))| (i, b.max(0.0_f64) / *a))
            .min_by(|(_i1, r1), (_i2, r2)| r1.partial_cmp(r2).unwrap_or(Ordering::Equal))
            .map(|(i, _r)| i)
    }

    /// Column of `row` with the largest coefficient magnitude above `tol`, first one on ties.
    pub(crate) fn largest_column(&self, row: usize, tol: f64) -> Option<usize> {
        self.tbl
            .slice(s![row, ..-1])
            .iter()
            .map(|v| v.abs())
            .enumerate()
            .filter(|(_j, a)| *a > tol)
            .min_by(|(_j1, a1), (_j2, a2)| a2.partial_cmp(a1).unwrap_or(Ordering::Equal))
            .map(|(j, _a)| j)
    }

    //pivot
    #[inline(always)]
    pub fn pivot(&mut self, pivot_ind: &TableauIx) {
        //leaving row must be a constraint row
        assert!(pivot_ind.i() < self.constraint_count());
        assert!(pivot_ind.j() < self.variable_count());

        //set coefficients in pivot row
        let div = self.tbl[[pivot_ind.i(), pivot_ind.j()]];
        for j in 0..self.tbl.shape()[1] {
            self.tbl[[pivot_ind.i(), j]] /= div;
        }

        //eliminate entering column from every other row, carried and goal rows included
        for i in 0..self.tbl.shape()[0] {
            if i == pivot_ind.i() {
                continue;
            }
            let ratio = self.tbl[[i, pivot_ind.j()]];
            if ratio == 0.0_f64 {
                continue;
            }
            for j in 0..self.tbl.shape()[1] {
                self.tbl[[i, j]] -= self.tbl[[pivot_ind.i(), j]] * ratio;
            }
        }

        for occupant in self.basis.iter_mut() {
            if *occupant == Some(pivot_ind.j()) {
                *occupant = None;
            }
        }
        self.basis[pivot_ind.i()] = Some(pivot_ind.j());
    }

    /// Value of every basic variable. Non-basic variables are implicitly zero and absent.
    pub fn variable_values(&self) -> FxHashMap<usize, f64> {
        let n = self.variable_count();
        self.basis
            .iter()
            .enumerate()
            .filter_map(|(row, var)| var.map(|var| (var, self.tbl[[row, n]])))
            .collect()
    }

    /// Drop the goal row and turn the last carried row into the new goal row.
    pub(crate) fn promote_carried(self) -> Self {
        assert!(self.carried > 0, "no carried row to promote");
        Self {
            tbl: self.tbl.slice(s![..-1, ..]).to_owned(),
            basis: self.basis,
            carried: self.carried - 1,
        }
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let n = self.variable_count();
        let m = self.constraint_count();
        let mut columns = "{:<}".to_string();
        columns += &" {:>}".repeat(n + 1);
        let mut table = Table::new(columns.as_str());

        let mut header = vec!["basis".to_string()];
        header.extend((0..n).map(|j| format!("x{}", j)));
        header.push("rhs".to_string());
        table.add_row(Row::from_cells(header));

        for (i, row) in self.tbl.rows().into_iter().enumerate() {
            let label = if i < m {
                match self.basis[i] {
                    Some(var) => format!("x{}", var),
                    None => "-".to_string(),
                }
            } else if i < m + self.carried_count() {
                "carried".to_string()
            } else {
                "goal".to_string()
            };
            let mut cells = vec![label];
            cells.extend(row.iter().map(|v| format!("{:.4}", v)));
            table.add_row(Row::from_cells(cells));
        }

        write!(f, "{}", table)
    }
}
