use log::{debug, trace};
use ndarray::{Array1, Axis};
use rustc_hash::FxHashMap;

use crate::config::SimplexConfig;
use crate::error::{Result, SimplexError};
use crate::model::Problem;
use crate::solver::{Solution, SolveAlgorithm, Status};
use crate::tableau::{normalize_rows, Tableau, TableauIx};

/// Multiple of `f64::EPSILON * max|row_values|` that phase 1 may leave behind as rounding residue.
const ROUNDING_SLACK: f64 = 1024.0;

/// Two-phase tableau simplex.
///
/// Phase 1 minimises the sum of one implicit artificial variable per row, starting from the
/// all-artificial basis; phase 2 minimises the caller's goal from the basis phase 1 found.
#[derive(Copy, Clone, Debug, Default)]
pub struct Simplex {
    config: SimplexConfig,
}

enum PivotChoice {
    Pivot(TableauIx),
    Optimal,
    Unbounded,
}

/// Terminal state of a single phase.
#[derive(Clone, Debug)]
pub struct PhaseResult {
    status: Status,
    pivots: usize,
    tableau: Tableau,
}

impl PhaseResult {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn pivots(&self) -> usize {
        self.pivots
    }

    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    pub fn into_tableau(self) -> Tableau {
        self.tableau
    }

    pub fn variable_values(&self) -> FxHashMap<usize, f64> {
        self.tableau.variable_values()
    }

    pub fn goal_value(&self) -> f64 {
        self.tableau.goal_value()
    }
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimplexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimplexConfig {
        &self.config
    }

    #[inline(always)]
    fn pivot_ind(&self, tbl: &Tableau) -> PivotChoice {
        let tol = self.config.tolerance();
        let j = match tbl.entering_variable(tol) {
            Some(j) => j,
            None => return PivotChoice::Optimal,
        };
        match tbl.leaving_row(j, tol) {
            Some(i) => PivotChoice::Pivot(TableauIx::new(i, j)),
            None => {
                debug!("x{} can grow without bound", j);
                PivotChoice::Unbounded
            }
        }
    }

    /// Pivot until no goal coefficient is positive (`Optimal`) or the entering column has no
    /// eligible row (`Unbounded`). Fails once a pivot beyond `max_pivots` would be needed.
    pub fn run_phase(&self, mut tableau: Tableau) -> Result<PhaseResult> {
        let mut pvt_cnt = 0;
        loop {
            let status = match self.pivot_ind(&tableau) {
                PivotChoice::Optimal => Status::Optimal,
                PivotChoice::Unbounded => Status::Unbounded,
                PivotChoice::Pivot(ix) => {
                    if pvt_cnt >= self.config.max_pivots() {
                        return Err(SimplexError::IterationLimit { pivots: pvt_cnt });
                    }
                    tableau.pivot(&ix);
                    pvt_cnt += 1;
                    trace!(
                        "pivot {}: x{} enters at row {}\n{}",
                        pvt_cnt,
                        ix.j(),
                        ix.i(),
                        tableau
                    );
                    continue;
                }
            };
            debug!(
                "phase finished {} after {} pivots, goal value {}",
                status,
                pvt_cnt,
                tableau.goal_value()
            );
            return Ok(PhaseResult {
                status,
                pivots: pvt_cnt,
                tableau,
            });
        }
    }

    /// Normalise the rows, price out the artificials into a column-sum goal and run phase 1 with
    /// the caller's goal carried along. Returns the phase result and the starting infeasibility.
    fn phase_one(&self, problem: &Problem) -> Result<(PhaseResult, f64)> {
        let mut matrix = problem.constraints.clone();
        let mut row_values = problem.row_values.clone();
        let flipped = normalize_rows(matrix.view_mut(), row_values.view_mut());
        if !flipped.is_empty() {
            debug!("negated rows {:?} to make right-hand sides non-negative", flipped);
        }

        let feasibility_goal = matrix.sum_axis(Axis(0));
        let infeasibility = row_values.sum();

        //carried row holds -goal so that its rhs tracks initial_goal_value + goal . x
        let carried = (-&problem.goal).insert_axis(Axis(0));
        let carried_values = Array1::from_elem(1, problem.initial_goal_value);

        let tableau = Tableau::with_carried(
            feasibility_goal,
            matrix,
            row_values,
            infeasibility,
            carried,
            carried_values,
        )?;
        trace!("phase 1 start\n{}", tableau);

        Ok((self.run_phase(tableau)?, infeasibility))
    }

    /// Rows still without a basic variable hold an artificial at level zero. Pivot a real column
    /// in where the row has one; otherwise the row is redundant and stays unassigned. A leftover
    /// value above `threshold` means phase 1 did not actually reach feasibility.
    fn drive_out_artificials(&self, tableau: &mut Tableau, threshold: f64) -> Result<usize> {
        let tol = self.config.tolerance();
        let mut pivots = 0;
        for row in 0..tableau.constraint_count() {
            if tableau.basis()[row].is_some() {
                continue;
            }
            let value = tableau.row_values()[row];
            if value.abs() > threshold {
                return Err(SimplexError::ResidualArtificial { row, value });
            }
            tableau.set_row_value(row, 0.0_f64);
            match tableau.largest_column(row, tol) {
                Some(col) => {
                    tableau.pivot(&TableauIx::new(row, col));
                    pivots += 1;
                    debug!("artificial of row {} replaced by x{}", row, col);
                }
                None => debug!("row {} is redundant", row),
            }
        }
        Ok(pivots)
    }

    /// Largest phase-1 residual still accepted as feasible: the configured tolerance, or the
    /// rounding residue expected at the magnitude of the right-hand sides if that is larger.
    fn feasibility_threshold(&self, problem: &Problem) -> f64 {
        let scale = problem
            .row_values
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        self.config
            .tolerance()
            .max(ROUNDING_SLACK * f64::EPSILON * scale)
    }

    fn phase_two(&self, tableau: Tableau) -> Result<PhaseResult> {
        let tableau = tableau.promote_carried();
        trace!("phase 2 start\n{}", tableau);
        self.run_phase(tableau)
    }

    pub fn solve(&self, problem: &Problem) -> Result<Solution> {
        let (feasible, infeasibility) = self.phase_one(problem)?;
        if feasible.status() != Status::Optimal {
            return Err(SimplexError::PhaseOneUnbounded);
        }

        let residual = feasible.goal_value();
        let threshold = self.feasibility_threshold(problem);
        if residual > threshold {
            debug!(
                "infeasible: phase 1 left {} of {} infeasibility, threshold {}",
                residual, infeasibility, threshold
            );
            return Ok(Solution::new(
                Status::Infeasible,
                feasible.tableau,
                residual,
                feasible.pivots,
            ));
        }

        let mut tableau = feasible.tableau;
        let repaired = self.drive_out_artificials(&mut tableau, threshold)?;
        let optimal = self.phase_two(tableau)?;

        Ok(Solution::new(
            optimal.status,
            optimal.tableau,
            residual,
            feasible.pivots + repaired + optimal.pivots,
        ))
    }
}

impl SolveAlgorithm for Simplex {
    fn solve(&self, problem: &Problem) -> Result<Solution> {
        Simplex::solve(self, problem)
    }
}

/// Minimise `initial_goal_value + goal . x` subject to `constraints . x = row_values`, `x >= 0`,
/// with the default configuration.
pub fn solve_minimize(
    goal: &[f64],
    constraints: &[Vec<f64>],
    row_values: &[f64],
    initial_goal_value: f64,
) -> Result<Solution> {
    let problem = Problem::new(goal.to_vec(), constraints.to_vec(), row_values.to_vec())?
        .with_initial_goal_value(initial_goal_value)?;
    Simplex::new().solve(&problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn degenerate_goal_needs_no_pivots() {
        let tableau = Tableau::new(
            array![0.0, -1.0, -3.0],
            array![[1.0, 2.0, 0.0], [0.0, 1.0, 1.0]],
            array![4.0, 2.0],
            0.0,
            vec![None, None],
        )
        .unwrap();
        let result = Simplex::new().run_phase(tableau.clone()).unwrap();
        assert_eq!(result.status(), Status::Optimal);
        assert_eq!(result.pivots(), 0);
        assert!(result.variable_values().is_empty());
        assert_eq!(result.tableau(), &tableau);
    }

    #[test]
    fn unbounded_on_first_entering_column() {
        let tableau =
            Tableau::new(array![1.0, 0.0], array![[-1.0, 1.0]], array![0.0], 0.0, vec![None])
                .unwrap();
        let result = Simplex::new().run_phase(tableau).unwrap();
        assert_eq!(result.status(), Status::Unbounded);
        assert_eq!(result.pivots(), 0);
    }

    #[test]
    fn optimal_tableau_is_a_fixed_point() {
        let tableau = Tableau::new(
            array![3.0, 2.0, 0.0, 0.0],
            array![[1.0, 1.0, 1.0, 0.0], [2.0, 1.0, 0.0, 1.0]],
            array![4.0, 6.0],
            0.0,
            vec![Some(2), Some(3)],
        )
        .unwrap();
        let simplex = Simplex::new();
        let first = simplex.run_phase(tableau).unwrap();
        assert_eq!(first.status(), Status::Optimal);
        assert!(first.pivots() > 0);

        let again = simplex.run_phase(first.tableau().clone()).unwrap();
        assert_eq!(again.status(), Status::Optimal);
        assert_eq!(again.pivots(), 0);
        assert_eq!(again.tableau(), first.tableau());
    }

    #[test]
    fn maximises_positive_goal_entries() {
        // goal row entries are improvements: this is max 3a + 2b with a + b <= 4, 2a + b <= 6
        let tableau = Tableau::new(
            array![3.0, 2.0, 0.0, 0.0],
            array![[1.0, 1.0, 1.0, 0.0], [2.0, 1.0, 0.0, 1.0]],
            array![4.0, 6.0],
            0.0,
            vec![Some(2), Some(3)],
        )
        .unwrap();
        let result = Simplex::new().run_phase(tableau).unwrap();
        let values = result.variable_values();
        assert_abs_diff_eq!(values[&0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[&1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.goal_value(), -10.0, epsilon = 1e-12);
    }

    #[test]
    fn pivot_cap_reports_iteration_limit() {
        let tableau = Tableau::new(
            array![1.0, 1.0],
            array![[1.0, 0.0], [0.0, 1.0]],
            array![1.0, 1.0],
            0.0,
            vec![None, None],
        )
        .unwrap();
        let simplex = Simplex::with_config(SimplexConfig::new().with_max_pivots(1)).unwrap();
        assert_eq!(
            simplex.run_phase(tableau.clone()).unwrap_err(),
            SimplexError::IterationLimit { pivots: 1 }
        );
        assert_eq!(Simplex::new().run_phase(tableau).unwrap().pivots(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(Simplex::with_config(SimplexConfig::new().with_tolerance(-1)).is_err());
    }

    #[test]
    fn basis_repair_pivots_out_zero_level_artificials() {
        // after phase 1 the second row of this problem is left without a basic variable
        let problem = Problem::new(
            vec![1.0, 1.0, 0.0, 0.0],
            vec![vec![1.0, -1.0, 1.0, 0.0], vec![-1.0, 1.0, 0.0, 1.0]],
            vec![5.0, -5.0],
        )
        .unwrap();
        let simplex = Simplex::new();
        let (feasible, infeasibility) = simplex.phase_one(&problem).unwrap();
        assert_abs_diff_eq!(infeasibility, 10.0);
        assert_eq!(feasible.status(), Status::Optimal);
        assert_abs_diff_eq!(feasible.goal_value(), 0.0, epsilon = 1e-12);
        assert_eq!(feasible.tableau().basis(), &[Some(0), None]);

        let mut tableau = feasible.into_tableau();
        assert_eq!(simplex.drive_out_artificials(&mut tableau, 1e-9).unwrap(), 1);
        assert_eq!(tableau.basis(), &[Some(0), Some(2)]);
    }

    #[test]
    fn basis_repair_refuses_a_nonzero_artificial() {
        let mut tableau = Tableau::new(
            array![0.0, 0.0],
            array![[1.0, 0.0], [1.0, 1.0]],
            array![2.0, 0.5],
            0.0,
            vec![Some(0), None],
        )
        .unwrap();
        assert_eq!(
            Simplex::new()
                .drive_out_artificials(&mut tableau, 1e-9)
                .unwrap_err(),
            SimplexError::ResidualArtificial { row: 1, value: 0.5 }
        );
    }

    #[test]
    fn feasibility_threshold_follows_rhs_magnitude() {
        let simplex = Simplex::new();
        let small = Problem::new(vec![0.0], vec![vec![1.0]], vec![3.0]).unwrap();
        assert_eq!(simplex.feasibility_threshold(&small), 1e-9);

        let large = Problem::new(vec![0.0], vec![vec![1.0]], vec![-1e9]).unwrap();
        let threshold = simplex.feasibility_threshold(&large);
        assert!(threshold > 1e-9);
        assert!(threshold < 1e-3);
    }

    #[test]
    fn redundant_rows_stay_unassigned() {
        let problem = Problem::new(
            vec![1.0, 0.0],
            vec![vec![1.0, 1.0], vec![2.0, 2.0]],
            vec![2.0, 4.0],
        )
        .unwrap();
        let solution = Simplex::new().solve(&problem).unwrap();
        assert_eq!(solution.status(), Status::Optimal);
        assert_abs_diff_eq!(solution.value(0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(solution.value(1), 2.0, epsilon = 1e-12);
        assert_eq!(
            solution.tableau().basis().iter().filter(|b| b.is_none()).count(),
            1
        );
    }
}
