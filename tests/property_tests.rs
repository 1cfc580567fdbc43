//! Property-based tests for the two-phase solver
//!
//! Problems are generated around a known non-negative point `x*` with `b = A x*`, so every problem
//! is feasible, and with non-negative costs, so every problem is bounded.

use brewlp::{Problem, Simplex, SimplexError, Solution, Status};
use proptest::prelude::*;

const EPS: f64 = 1e-6;

/// (A, x*, c) with A of shape m x n.
fn feasible_problem_strategy() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>, Vec<f64>)> {
    (1usize..4, 1usize..6).prop_flat_map(|(m, n)| {
        (
            prop::collection::vec(prop::collection::vec(-5i32..=5, n), m),
            prop::collection::vec(0i32..=4, n),
            prop::collection::vec(0i32..=5, n),
        )
            .prop_map(|(a, x, c)| {
                let a: Vec<Vec<f64>> = a
                    .into_iter()
                    .map(|row| row.into_iter().map(f64::from).collect())
                    .collect();
                let x: Vec<f64> = x.into_iter().map(f64::from).collect();
                let c: Vec<f64> = c.into_iter().map(f64::from).collect();
                (a, x, c)
            })
    })
}

fn rhs(a: &[Vec<f64>], x: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(x).map(|(a, x)| a * x).sum::<f64>())
        .collect()
}

fn solve(problem: &Problem) -> Option<Solution> {
    match Simplex::new().solve(problem) {
        Ok(solution) => Some(solution),
        Err(SimplexError::IterationLimit { .. }) => None,
        Err(err) => panic!("unexpected error: {}", err),
    }
}

proptest! {
    /// Every optimum satisfies the original rows and stays non-negative.
    #[test]
    fn optimum_is_feasible((a, x, c) in feasible_problem_strategy()) {
        let b = rhs(&a, &x);
        let problem = Problem::new(c, a, b).unwrap();
        let solution = solve(&problem);
        prop_assume!(solution.is_some());
        let solution = solution.unwrap();

        prop_assert_eq!(solution.status(), Status::Optimal);
        for r in problem.residuals(solution.variable_values()).iter() {
            prop_assert!(r.abs() < EPS, "residual {}", r);
        }
        for (var, value) in solution.variable_values() {
            prop_assert!(*value >= -EPS, "x{} = {}", var, value);
        }
    }

    /// The reported goal value is the objective at the returned point, and no worse than x*.
    #[test]
    fn optimum_beats_the_generating_point((a, x, c) in feasible_problem_strategy()) {
        let b = rhs(&a, &x);
        let known: f64 = c.iter().zip(&x).map(|(c, x)| c * x).sum();
        let problem = Problem::new(c, a, b).unwrap();
        let solution = solve(&problem);
        prop_assume!(solution.is_some());
        let solution = solution.unwrap();

        let goal_value = solution.goal_value().unwrap();
        prop_assert!((goal_value - problem.objective(solution.variable_values())).abs() < EPS);
        prop_assert!(goal_value <= known + EPS, "{} > {}", goal_value, known);
        prop_assert!(goal_value >= -EPS);
    }

    /// Negating a row together with its right-hand side changes nothing.
    #[test]
    fn row_negation_is_invisible(
        (a, x, c) in feasible_problem_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let b = rhs(&a, &x);
        let k = pick.index(a.len());
        prop_assume!(b[k] != 0.0);

        let mut a_neg = a.clone();
        let mut b_neg = b.clone();
        a_neg[k].iter_mut().for_each(|v| *v = -*v);
        b_neg[k] = -b_neg[k];

        let original = solve(&Problem::new(c.clone(), a, b).unwrap());
        let negated = solve(&Problem::new(c.clone(), a_neg, b_neg).unwrap());
        prop_assume!(original.is_some() && negated.is_some());
        let (original, negated) = (original.unwrap(), negated.unwrap());

        prop_assert_eq!(original.status(), negated.status());
        for var in 0..c.len() {
            prop_assert!((original.value(var) - negated.value(var)).abs() < EPS);
        }
    }

    /// Contradicting one row with a shifted copy of itself is always detected.
    #[test]
    fn shifted_duplicate_row_is_infeasible(
        (a, x, c) in feasible_problem_strategy(),
        shift in 1i32..5,
    ) {
        let mut b = rhs(&a, &x);
        let mut a = a;
        a.push(a[0].clone());
        b.push(b[0] + f64::from(shift));

        let problem = Problem::new(c, a, b).unwrap();
        let solution = solve(&problem);
        prop_assume!(solution.is_some());
        let solution = solution.unwrap();
        prop_assert_eq!(solution.status(), Status::Infeasible);
        prop_assert!(solution.goal_value().is_none());
        prop_assert!(solution.variable_values().is_empty());
    }

    /// A contradiction far below the magnitude of the data is still detected.
    #[test]
    fn small_shift_on_scaled_rows_is_infeasible(
        (a, x, c) in feasible_problem_strategy(),
        shift in 1i32..5,
    ) {
        let mut b: Vec<f64> = rhs(&a, &x).into_iter().map(|v| v * 1e6).collect();
        let mut a = a;
        a.push(a[0].clone());
        b.push(b[0] + 1e-3 * f64::from(shift));

        let problem = Problem::new(c, a, b).unwrap();
        let solution = solve(&problem);
        prop_assume!(solution.is_some());
        let solution = solution.unwrap();
        prop_assert_eq!(solution.status(), Status::Infeasible);
        prop_assert!(solution.goal_value().is_none());
    }

    /// Scaling the right-hand sides keeps a feasible problem feasible.
    #[test]
    fn scaled_rows_stay_feasible((a, x, c) in feasible_problem_strategy()) {
        let b: Vec<f64> = rhs(&a, &x).into_iter().map(|v| v * 1e6).collect();
        let problem = Problem::new(c, a, b).unwrap();
        let solution = solve(&problem);
        prop_assume!(solution.is_some());
        prop_assert_eq!(solution.unwrap().status(), Status::Optimal);
    }
}
