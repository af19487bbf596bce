//! Depth-first, LP-based branch-and-bound.
//!
//! Every node fixes a subset of the binaries to 0 or 1 and solves the LP
//! relaxation of the rest with `good_lp`. Integral relaxations become
//! incumbents; fractional ones branch on the binary closest to 0.5. The clock
//! is checked between nodes, so one LP solve may overrun the time limit.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use good_lp::{constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel};
use tracing::{debug, trace};

use super::model::{AssignmentModel, LinearExpr, Sense, VarId, VarKind};
use super::solver::{MilpSolver, Progress, SolveStatus, SolverOutcome};

/// Statistics collected during one branch-and-bound run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BnbStatistics {
    pub nodes_explored: u64,
    pub prunings_bound: u64,
    pub prunings_infeasible: u64,
    pub solutions_found: u64,
    pub max_depth: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct BranchAndBound {
    integrality_tol: f64,
    /// Relative slack under which a node cannot improve the incumbent.
    prune_tol: f64,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        BranchAndBound { integrality_tol: 1e-6, prune_tol: 1e-9 }
    }
}

#[derive(Debug, Clone)]
struct Node {
    fixings: Vec<(VarId, f64)>,
    /// The parent's relaxation value, a lower bound for the whole subtree.
    bound: f64,
}

enum Relaxation {
    Solved { objective: f64, values: Vec<f64> },
    Infeasible,
}

fn to_expression(expr: &LinearExpr, handles: &[good_lp::Variable]) -> Expression {
    expr.terms.iter().fold(Expression::from(expr.constant), |acc, &(v, c)| acc + c * handles[v.0])
}

impl BranchAndBound {

    pub fn new() -> Self {
        Self::default()
    }

    fn relax(&self, model: &AssignmentModel, fixings: &[(VarId, f64)]) -> Result<Relaxation, String> {
        let mut bounds = model.variables().iter().map(|v| v.kind.bounds()).collect::<Vec<(f64, f64)>>();
        for &(var, value) in fixings.iter() {
            bounds[var.0] = (value, value);
        }

        let mut vars = ProblemVariables::new();
        let handles = bounds.iter()
            .map(|&(lb, ub)| vars.add(variable().min(lb).max(ub)))
            .collect::<Vec<good_lp::Variable>>();

        let mut problem = vars.minimise(to_expression(model.objective(), &handles)).using(default_solver);
        for c in model.constraints() {
            let lhs = to_expression(&c.lhs, &handles);
            let row = match c.sense {
                Sense::Le => constraint::leq(lhs, c.rhs),
                Sense::Ge => constraint::geq(lhs, c.rhs),
                Sense::Eq => constraint::eq(lhs, c.rhs),
            };
            problem.add_constraint(row);
        }

        match problem.solve() {
            Ok(solution) => {
                let values = handles.iter().map(|&h| solution.value(h)).collect::<Vec<f64>>();
                let objective = model.objective().eval(&values);
                Ok(Relaxation::Solved { objective, values })
            },
            Err(ResolutionError::Infeasible) => Ok(Relaxation::Infeasible),
            Err(e) => Err(e.to_string()),
        }
    }

    /// The binary whose relaxed value is closest to 0.5, if any is fractional.
    fn branching_var(&self, model: &AssignmentModel, values: &[f64]) -> Option<VarId> {
        model.binaries()
            .map(|var| (var, (values[var.0] - values[var.0].round()).abs()))
            .filter(|&(_, frac)| frac > self.integrality_tol)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(var, _)| var)
    }

    fn prunable(&self, bound: f64, incumbent: Option<f64>) -> bool {
        incumbent.is_some_and(|best| bound >= best - self.prune_tol * best.abs().max(1.0))
    }

    /// Rounds the binaries and recomputes each linearization variable to its
    /// smallest feasible value.
    fn polish(&self, model: &AssignmentModel, values: &mut [f64]) {
        for var in model.binaries() {
            values[var.0] = values[var.0].round();
        }
        for c in model.constraints() {
            if c.sense != Sense::Ge || c.lhs.terms.len() != 3 || c.lhs.terms[0].1 != 1.0 {
                continue;
            }
            let y = c.lhs.terms[0].0;
            if model.variables()[y.0].kind == VarKind::Binary {
                continue;
            }
            let rest = c.lhs.terms[1..].iter().fold(0.0, |acc, &(v, coef)| acc + coef * values[v.0]);
            values[y.0] = (c.rhs - rest).max(0.0);
        }
    }

    pub fn solve_with_stats(
        &self,
        model: &AssignmentModel,
        time_limit: Duration,
        progress: &mut dyn FnMut(&Progress),
    ) -> (SolverOutcome, BnbStatistics) {
        let start = Instant::now();
        let mut stats = BnbStatistics::default();
        let mut incumbent: Option<(f64, Vec<f64>)> = None;
        let mut stack = vec![Node { fixings: vec![], bound: f64::NEG_INFINITY }];
        let mut timed_out = false;

        while let Some(node) = stack.pop() {
            if start.elapsed() >= time_limit {
                stack.push(node);
                timed_out = true;
                break;
            }

            let best = incumbent.as_ref().map(|(obj, _)| *obj);
            if self.prunable(node.bound, best) {
                stats.prunings_bound += 1;
                continue;
            }

            stats.nodes_explored += 1;
            stats.max_depth = stats.max_depth.max(node.fixings.len() as u64);

            let relaxation = catch_unwind(AssertUnwindSafe(|| self.relax(model, &node.fixings)))
                .unwrap_or_else(|_| Err("LP engine panicked".to_string()));

            match relaxation {
                Err(message) => {
                    debug!(%message, nodes = stats.nodes_explored, "relaxation failed");
                    let mut outcome = SolverOutcome::error(message, stats.nodes_explored);
                    if let Some((obj, values)) = incumbent {
                        outcome.objective = Some(obj);
                        outcome.values = Some(values);
                    }
                    return (outcome, stats);
                },
                Ok(Relaxation::Infeasible) => {
                    stats.prunings_infeasible += 1;
                },
                Ok(Relaxation::Solved { objective, mut values }) => {
                    if self.prunable(objective, best) {
                        stats.prunings_bound += 1;
                    } else if let Some(var) = self.branching_var(model, &values) {
                        let value = values[var.0];
                        // the branch nearest the relaxed value is popped first
                        let (first, second) = if value >= 0.5 { (1.0, 0.0) } else { (0.0, 1.0) };
                        for fixed in [second, first] {
                            let mut fixings = node.fixings.clone();
                            fixings.push((var, fixed));
                            stack.push(Node { fixings, bound: objective });
                        }
                    } else {
                        self.polish(model, &mut values);
                        let objective = model.objective().eval(&values);
                        if best.map_or(true, |b| objective < b) {
                            stats.solutions_found += 1;
                            trace!(objective, nodes = stats.nodes_explored, "new incumbent");
                            incumbent = Some((objective, values));
                        }
                    }
                },
            }

            let incumbent_value = incumbent.as_ref().map(|(obj, _)| *obj);
            progress(&Progress::new(
                stats.nodes_explored,
                incumbent_value,
                Self::global_bound(&stack, incumbent_value),
                start.elapsed().as_secs_f64(),
            ));
        }

        let outcome = match incumbent {
            Some((objective, values)) => {
                let bound = if timed_out { Self::global_bound(&stack, Some(objective)) } else { objective };
                SolverOutcome {
                    status: if timed_out { SolveStatus::TimeLimit } else { SolveStatus::Optimal },
                    objective: Some(objective),
                    bound: Some(bound),
                    values: Some(values),
                    iterations: stats.nodes_explored,
                    message: None,
                }
            },
            None if timed_out => SolverOutcome {
                status: SolveStatus::TimeLimit,
                objective: None,
                bound: Some(Self::global_bound(&stack, None)),
                values: None,
                iterations: stats.nodes_explored,
                message: None,
            },
            None => SolverOutcome::infeasible(stats.nodes_explored),
        };

        debug!(
            status = %outcome.status,
            objective = ?outcome.objective,
            nodes = stats.nodes_explored,
            solutions = stats.solutions_found,
            "branch-and-bound finished"
        );
        (outcome, stats)
    }

    /// The weakest bound among open nodes, capped by the incumbent.
    fn global_bound(open: &[Node], incumbent: Option<f64>) -> f64 {
        let open_bound = open.iter().map(|n| n.bound).fold(f64::INFINITY, f64::min);
        match incumbent {
            Some(best) => open_bound.min(best),
            None => open_bound,
        }
    }

}

impl MilpSolver for BranchAndBound {
    fn solve(&self, model: &AssignmentModel, time_limit: Duration, progress: &mut dyn FnMut(&Progress)) -> SolverOutcome {
        self.solve_with_stats(model, time_limit, progress).0
    }
}
