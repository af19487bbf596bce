//! The assignment model and everything needed to solve it.

pub mod bnb;
pub mod build;
pub mod extract;
pub mod model;
pub mod solve;
pub mod solver;

pub use bnb::{BnbStatistics, BranchAndBound};
pub use build::ModelBuilder;
pub use model::AssignmentModel;
pub use solve::{solve_instance, Solve, SolveReport};
pub use solver::{MilpSolver, Progress, SolveStatus, SolverOutcome};
