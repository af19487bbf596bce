use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::instance::{Assignment, GapInstance};

use super::model::AssignmentModel;

/// Reads the gate of every aircraft from the x values. Returns `None` unless
/// each aircraft has exactly one x above 0.5.
pub fn decode(instance: &GapInstance, model: &AssignmentModel, values: &[f64]) -> Option<Assignment> {
    let mut gates = vec![None; instance.nb_aircraft()];
    for ((ac, k), var) in model.assignment_vars() {
        if values.get(var.0).copied().unwrap_or(0.0) > 0.5 {
            if gates[ac].is_some() {
                return None;
            }
            gates[ac] = Some(k);
        }
    }
    gates.into_iter().collect::<Option<Vec<usize>>>().map(|gates| Assignment { gates })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Violation {
    IneligibleGate { aircraft: String, gate: String },
    /// `from` and `to` bound the interval in hours.
    GateOverlap { gate: String, interval: usize, from: f64, to: f64, count: usize },
    ApronCount { expected: usize, actual: usize },
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::IneligibleGate { aircraft, gate } =>
                write!(f, "aircraft {} cannot use gate {}", aircraft, gate),
            Violation::GateOverlap { gate, interval, from, to, count } =>
                write!(f, "gate {} holds {} aircraft during interval {} [{}, {})", gate, count, interval, from, to),
            Violation::ApronCount { expected, actual } =>
                write!(f, "{} aircraft on the apron, expected {}", actual, expected),
        }
    }
}

/// Checks an assignment against the instance's hard rules. Every violation
/// is logged and returned; an empty list means the assignment is valid.
pub fn verify(instance: &GapInstance, assignment: &Assignment) -> Vec<Violation> {
    let mut violations = vec![];
    let gates = &assignment.gates;

    for (ac, &k) in gates.iter().enumerate() {
        if !instance.gates[k].kind.serves(instance.aircraft[ac].class) {
            violations.push(Violation::IneligibleGate {
                aircraft: instance.aircraft[ac].id.clone(),
                gate: instance.gates[k].id.clone(),
            });
        }
    }

    let grid = &instance.time_grid;
    for k in instance.real_gates() {
        for r in 0..grid.nb_intervals() {
            let count = grid.present(r).filter(|&ac| gates[ac] == k).count();
            if count > 1 {
                let (from, to) = grid.interval(r);
                violations.push(Violation::GateOverlap { gate: instance.gates[k].id.clone(), interval: r, from, to, count });
            }
        }
    }

    let expected = instance.apron_floor.total();
    let actual = gates.iter().filter(|&&k| k == instance.apron).count();
    if actual != expected {
        violations.push(Violation::ApronCount { expected, actual });
    }

    for v in violations.iter() {
        warn!(violation = %v, "assignment check failed");
    }
    violations
}
