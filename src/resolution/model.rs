//! Solver-agnostic linear model: variables, a linear objective to minimize
//! and named linear constraints.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    Binary,
    Continuous { lb: f64, ub: f64 },
}

impl VarKind {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            VarKind::Binary => (0.0, 1.0),
            VarKind::Continuous { lb, ub } => (lb, ub),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms.iter().fold(self.constant, |acc, &(v, c)| acc + c * values[v.0])
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        LinearExpr { terms: iter.into_iter().collect(), constant: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub lhs: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.lhs.eval(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Ge => lhs >= self.rhs - tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// The gate assignment MILP.
///
/// `x[(ac, k)]` is the binary "aircraft `ac` parks at gate `k`";
/// `y[(i, j, k, l)]`, with `i < j`, linearizes `x[(i, k)] * x[(j, l)]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentModel {
    variables: Vec<Variable>,
    objective: LinearExpr,
    constraints: Vec<Constraint>,
    x: BTreeMap<(usize, usize), VarId>,
    y: BTreeMap<(usize, usize, usize, usize), VarId>,
}

impl AssignmentModel {

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn x(&self, aircraft: usize, gate: usize) -> Option<VarId> {
        self.x.get(&(aircraft, gate)).copied()
    }

    pub fn y(&self, i: usize, j: usize, k: usize, l: usize) -> Option<VarId> {
        self.y.get(&(i, j, k, l)).copied()
    }

    /// `((aircraft, gate), var)` in aircraft then gate order.
    pub fn assignment_vars(&self) -> impl Iterator<Item = ((usize, usize), VarId)> + '_ {
        self.x.iter().map(|(&key, &var)| (key, var))
    }

    pub fn nb_assignment_vars(&self) -> usize {
        self.x.len()
    }

    pub fn nb_linearization_vars(&self) -> usize {
        self.y.len()
    }

    pub fn binaries(&self) -> impl Iterator<Item = VarId> + '_ {
        self.variables.iter()
            .enumerate()
            .filter(|(_, v)| v.kind == VarKind::Binary)
            .map(|(i, _)| VarId(i))
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub(crate) fn add_x(&mut self, aircraft: usize, gate: usize, name: String) -> VarId {
        let var = self.add_variable(name, VarKind::Binary);
        self.x.insert((aircraft, gate), var);
        var
    }

    pub(crate) fn add_y(&mut self, key: (usize, usize, usize, usize), name: String) -> VarId {
        let var = self.add_variable(name, VarKind::Continuous { lb: 0.0, ub: 1.0 });
        self.y.insert(key, var);
        var
    }

    fn add_variable(&mut self, name: String, kind: VarKind) -> VarId {
        self.variables.push(Variable { name, kind });
        VarId(self.variables.len() - 1)
    }

    pub(crate) fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub(crate) fn add_constraint(&mut self, name: String, lhs: LinearExpr, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint { name, lhs, sense, rhs });
    }

    /// Whether `values` respects bounds, integrality and every constraint.
    pub fn is_feasible(&self, values: &[f64], tol: f64) -> bool {
        values.len() == self.variables.len()
            && self.variables.iter().zip(values.iter()).all(|(var, &v)| {
                let (lb, ub) = var.kind.bounds();
                let integral = var.kind != VarKind::Binary || (v - v.round()).abs() <= tol;
                integral && v >= lb - tol && v <= ub + tol
            })
            && self.constraints.iter().all(|c| c.is_satisfied(values, tol))
    }

    /// Writes the model in CPLEX LP format.
    pub fn write_lp(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "\\ gate assignment: {} variables, {} constraints", self.variables.len(), self.constraints.len())?;
        writeln!(w, "Minimize")?;
        write!(w, " obj:")?;
        self.write_expr(w, &self.objective)?;
        if self.objective.constant != 0.0 {
            write!(w, " + {}", self.objective.constant)?;
        }
        writeln!(w)?;

        writeln!(w, "Subject To")?;
        for c in self.constraints.iter() {
            write!(w, " {}:", c.name)?;
            self.write_expr(w, &c.lhs)?;
            writeln!(w, " {} {}", c.sense, c.rhs - c.lhs.constant)?;
        }

        writeln!(w, "Bounds")?;
        for var in self.variables.iter() {
            if let VarKind::Continuous { lb, ub } = var.kind {
                writeln!(w, " {} <= {} <= {}", lb, var.name, ub)?;
            }
        }

        writeln!(w, "Binary")?;
        for var in self.binaries() {
            writeln!(w, " {}", self.variables[var.0].name)?;
        }
        writeln!(w, "End")
    }

    fn write_expr(&self, w: &mut impl Write, expr: &LinearExpr) -> io::Result<()> {
        if expr.is_empty() {
            return write!(w, " 0 {}", self.variables.first().map(|v| v.name.as_str()).unwrap_or("x"));
        }
        for &(var, coef) in expr.terms.iter() {
            let sign = if coef < 0.0 { '-' } else { '+' };
            write!(w, " {} {} {}", sign, coef.abs(), self.variables[var.0].name)?;
        }
        Ok(())
    }

}
