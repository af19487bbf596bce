//! The interface every MILP engine plugs into.

use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::model::AssignmentModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolveStatus {
    Optimal,
    /// Stopped by the time limit; any objective is an incumbent, not an optimum.
    TimeLimit,
    Infeasible,
    /// The engine failed; nothing it returned can be trusted.
    Error,
}

impl SolveStatus {
    pub fn may_have_incumbent(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::TimeLimit)
    }
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::TimeLimit => write!(f, "time-limit"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Error => write!(f, "error"),
        }
    }
}

/// `|objective - bound| / |objective|`, infinite when the objective is exactly zero.
pub fn optimality_gap(objective: f64, bound: f64) -> f64 {
    if objective == 0.0 {
        f64::INFINITY
    } else {
        (objective - bound).abs() / objective.abs()
    }
}

/// A snapshot handed to the progress callback during the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub iterations: u64,
    pub incumbent: Option<f64>,
    pub bound: f64,
    /// Gap of the incumbent against `bound`, if there is an incumbent.
    pub gap: Option<f64>,
    /// Seconds since the solve started.
    pub elapsed: f64,
}

impl Progress {
    pub fn new(iterations: u64, incumbent: Option<f64>, bound: f64, elapsed: f64) -> Self {
        let gap = incumbent.map(|obj| optimality_gap(obj, bound));
        Progress { iterations, incumbent, bound, gap, elapsed }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub bound: Option<f64>,
    /// One value per model variable.
    pub values: Option<Vec<f64>>,
    pub iterations: u64,
    pub message: Option<String>,
}

impl SolverOutcome {
    pub fn infeasible(iterations: u64) -> Self {
        SolverOutcome { status: SolveStatus::Infeasible, objective: None, bound: None, values: None, iterations, message: None }
    }

    pub fn error(message: impl Into<String>, iterations: u64) -> Self {
        SolverOutcome { status: SolveStatus::Error, objective: None, bound: None, values: None, iterations, message: Some(message.into()) }
    }

    pub fn gap(&self) -> Option<f64> {
        match (self.status.may_have_incumbent(), self.objective, self.bound) {
            (true, Some(obj), Some(bound)) => Some(optimality_gap(obj, bound)),
            _ => None,
        }
    }
}

/// A mixed-integer linear programming engine.
///
/// `progress` may be invoked any number of times during the search; it only
/// observes, the model is borrowed immutably for the whole call.
pub trait MilpSolver {
    fn solve(&self, model: &AssignmentModel, time_limit: Duration, progress: &mut dyn FnMut(&Progress)) -> SolverOutcome;
}
