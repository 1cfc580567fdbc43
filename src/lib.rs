//! Two-phase tableau simplex for small linear programs in augmented standard form, plus a
//! brewing-water salt blender built on it.
//!
//! ```
//! use brewlp::{solve_minimize, Status};
//!
//! // minimise excess + lack for a quantity that starts 5 away from its target
//! let solution = solve_minimize(
//!     &[1.0, 1.0, 0.0, 0.0],
//!     &[vec![1.0, -1.0, 1.0, 0.0], vec![-1.0, 1.0, 0.0, 1.0]],
//!     &[5.0, -5.0],
//!     0.0,
//! )
//! .unwrap();
//! assert_eq!(solution.status(), Status::Optimal);
//! assert!((solution.goal_value().unwrap() - 5.0).abs() < 1e-9);
//! ```

pub mod blend;
pub mod config;
pub mod error;
pub mod model;
pub mod simplex;
pub mod solver;
pub mod tableau;

pub use crate::blend::{optimise_salts, Ion, IonProfile, Salt, SaltAdditions, SaltTable};
pub use crate::config::SimplexConfig;
pub use crate::error::{Result, SimplexError};
pub use crate::model::Problem;
pub use crate::simplex::{solve_minimize, PhaseResult, Simplex};
pub use crate::solver::{Solution, SolveAlgorithm, Status};
pub use crate::tableau::{Tableau, TableauIx};
