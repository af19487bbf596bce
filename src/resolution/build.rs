use tracing::debug;

use crate::instance::{AircraftClass, GapInstance};

use super::model::{AssignmentModel, LinearExpr, Sense, VarId};

/// Turns an instance into its assignment model.
pub struct ModelBuilder<'a> {
    instance: &'a GapInstance,
}

impl<'a> ModelBuilder<'a> {

    pub fn new(instance: &'a GapInstance) -> Self {
        ModelBuilder { instance }
    }

    pub fn build(&self) -> AssignmentModel {
        let mut model = AssignmentModel::default();

        self.add_assignment_vars(&mut model);
        self.add_linearization_vars(&mut model);
        self.set_objective(&mut model);

        self.add_single_gate_constraints(&mut model, AircraftClass::Domestic);
        self.add_single_gate_constraints(&mut model, AircraftClass::International);
        self.add_no_overlap_constraints(&mut model);
        self.add_apron_floor_constraint(&mut model);
        self.add_linearization_constraints(&mut model);

        debug!(
            x = model.nb_assignment_vars(),
            y = model.nb_linearization_vars(),
            constraints = model.constraints().len(),
            "assignment model built"
        );
        model
    }

    fn add_assignment_vars(&self, model: &mut AssignmentModel) {
        let inst = self.instance;
        for (i, ac) in inst.aircraft.iter().enumerate() {
            for k in inst.eligible_gates(i) {
                model.add_x(i, k, format!("x_{}_{}", ac.id, inst.gates[k].id));
            }
        }
    }

    /// Pairs `(i, j)` with `i < j` and every eligible gate combination.
    fn gate_pairs(&self) -> impl Iterator<Item = (usize, usize, usize, usize)> + '_ {
        let inst = self.instance;
        let n = inst.nb_aircraft();
        (0..n).flat_map(move |i| {
            ((i + 1)..n).flat_map(move |j| {
                inst.eligible_gates(i).flat_map(move |k| {
                    inst.eligible_gates(j).map(move |l| (i, j, k, l))
                })
            })
        })
    }

    fn add_linearization_vars(&self, model: &mut AssignmentModel) {
        for (i, j, k, l) in self.gate_pairs() {
            model.add_y((i, j, k, l), format!("y_{}_{}_{}_{}", i, j, k, l));
        }
    }

    fn x(model: &AssignmentModel, aircraft: usize, gate: usize) -> VarId {
        model.x(aircraft, gate).unwrap_or_else(|| unreachable!("x[{aircraft}, {gate}] was never created"))
    }

    /// Transfer walks through the linearized pairs, plus every aircraft's
    /// non-transfer passengers walking from the entrance. The apron only
    /// enters through its distances.
    fn set_objective(&self, model: &mut AssignmentModel) {
        let inst = self.instance;
        let mut objective = LinearExpr::new();

        for (i, j, k, l) in self.gate_pairs() {
            let coef = inst.transfers[i][j] as f64 * inst.distances[k][l];
            if coef != 0.0 {
                if let Some(y) = model.y(i, j, k, l) {
                    objective.add_term(y, coef);
                }
            }
        }

        for class in AircraftClass::ALL {
            for i in inst.aircraft_of(class) {
                let load = inst.aircraft[i].non_transfer() as f64;
                for k in inst.eligible_gates(i) {
                    let coef = load * inst.entrance_distances[k];
                    if coef != 0.0 {
                        objective.add_term(Self::x(model, i, k), coef);
                    }
                }
            }
        }

        model.set_objective(objective);
    }

    fn add_single_gate_constraints(&self, model: &mut AssignmentModel, class: AircraftClass) {
        let inst = self.instance;
        for i in inst.aircraft_of(class) {
            let lhs = inst.eligible_gates(i).map(|k| (Self::x(model, i, k), 1.0)).collect();
            model.add_constraint(format!("ac_{}_single_gate", inst.aircraft[i].id), lhs, Sense::Eq, 1.0);
        }
    }

    /// At most one aircraft per real gate and interval. Intervals where no
    /// aircraft of the gate's class is present give no row.
    fn add_no_overlap_constraints(&self, model: &mut AssignmentModel) {
        let inst = self.instance;
        let grid = &inst.time_grid;
        for k in inst.real_gates() {
            for r in 0..grid.nb_intervals() {
                let lhs: LinearExpr = grid.present(r)
                    .filter_map(|ac| model.x(ac, k))
                    .map(|x| (x, 1.0))
                    .collect();
                if !lhs.is_empty() {
                    model.add_constraint(format!("no_overlap_gate{}_interval{}", inst.gates[k].id, r), lhs, Sense::Le, 1.0);
                }
            }
        }
    }

    fn add_apron_floor_constraint(&self, model: &mut AssignmentModel) {
        let inst = self.instance;
        let lhs = (0..inst.nb_aircraft())
            .filter_map(|i| model.x(i, inst.apron))
            .map(|x| (x, 1.0))
            .collect();
        model.add_constraint("minimal_apron_ac".to_string(), lhs, Sense::Eq, inst.apron_floor.total() as f64);
    }

    /// `y[i,j,k,l] >= x[i,k] + x[j,l] - 1`
    fn add_linearization_constraints(&self, model: &mut AssignmentModel) {
        for (i, j, k, l) in self.gate_pairs() {
            let Some(y) = model.y(i, j, k, l) else { continue };
            let lhs = [(y, 1.0), (Self::x(model, i, k), -1.0), (Self::x(model, j, l), -1.0)].into_iter().collect();
            model.add_constraint(format!("linearize_{}_{}_{}_{}", i, j, k, l), lhs, Sense::Ge, -1.0);
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GateLayout;
    use crate::instance::{Aircraft, InstanceBuilder};

    fn mixed_instance() -> GapInstance {
        InstanceBuilder::new(GateLayout::Linear.gates(2, 1))
            .aircraft(Aircraft::new("dom1", AircraftClass::Domestic, 13.0, 14.0, 10, 5))
            .aircraft(Aircraft::new("dom2", AircraftClass::Domestic, 13.5, 15.0, 4, 0))
            .aircraft(Aircraft::new("int1", AircraftClass::International, 14.0, 15.0, 2, 2))
            .transfers(vec![vec![0, 6, 0], vec![1, 0, 3], vec![0, 8, 0]])
            .build()
            .unwrap()
    }

    #[test]
    fn variables_cover_only_eligible_gates() {
        let inst = mixed_instance();
        let model = ModelBuilder::new(&inst).build();
        // gates: A1 A2 B1 apron
        assert_eq!(model.nb_assignment_vars(), 3 + 3 + 2);
        assert!(model.x(0, 2).is_none());
        assert!(model.x(2, 0).is_none());
        assert!(model.x(2, 3).is_some());
        // pairs (0,1): 3x3, (0,2): 3x2, (1,2): 3x2
        assert_eq!(model.nb_linearization_vars(), 9 + 6 + 6);
        assert_eq!(model.variables()[model.x(0, 1).unwrap().0].name, "x_dom1_A2");
    }

    #[test]
    fn constraint_families_have_the_expected_shape() {
        let inst = mixed_instance();
        let model = ModelBuilder::new(&inst).build();

        let single = model.constraint("ac_int1_single_gate").unwrap();
        assert_eq!(single.sense, Sense::Eq);
        assert_eq!(single.lhs.terms.len(), 2);

        let apron = model.constraint("minimal_apron_ac").unwrap();
        assert_eq!(apron.sense, Sense::Eq);
        assert_eq!(apron.rhs, inst.apron_floor.total() as f64);
        assert_eq!(apron.lhs.terms.len(), 3);

        // breakpoints 13, 13.5, 14, 15: both domestic aircraft share [13.5, 14)
        let shared = model.constraint("no_overlap_gateA1_interval1").unwrap();
        assert_eq!(shared.lhs.terms.len(), 2);
        assert_eq!(shared.rhs, 1.0);
        // only int1 can use B1, and never alongside another international aircraft
        assert!(model.constraint("no_overlap_gateB1_interval0").is_none());
        assert!(model.constraints().iter().all(|c| !c.name.contains("gateapron")));

        let lin = model.constraints().iter().filter(|c| c.name.starts_with("linearize_")).count();
        assert_eq!(lin, model.nb_linearization_vars());
    }

    #[test]
    fn objective_prices_transfers_for_the_ordered_pair_only() {
        let inst = mixed_instance();
        let model = ModelBuilder::new(&inst).build();
        let coef = |var: VarId| model.objective().terms.iter().find(|(v, _)| *v == var).map(|(_, c)| *c);

        // p[0][1] = 6, d(A1, A2) = 2
        assert_eq!(coef(model.y(0, 1, 0, 1).unwrap()), Some(12.0));
        // same gate costs nothing and is left out
        assert_eq!(coef(model.y(0, 1, 0, 0).unwrap()), None);
        // p[1][2] = 3, d(A2, B1) = 8
        assert_eq!(coef(model.y(1, 2, 1, 2).unwrap()), Some(24.0));
        // entrance walks: 15 passengers at A1 (3), at the apron (30)
        assert_eq!(coef(model.x(0, 0).unwrap()), Some(45.0));
        assert_eq!(coef(model.x(0, 3).unwrap()), Some(450.0));
    }

    #[test]
    fn objective_matches_direct_evaluation_of_an_assignment() {
        let inst = mixed_instance();
        let model = ModelBuilder::new(&inst).build();
        let gates = [0, 1, 2];

        let mut values = vec![0.0; model.variables().len()];
        for (i, &k) in gates.iter().enumerate() {
            values[model.x(i, k).unwrap().0] = 1.0;
        }
        for i in 0..3 {
            for j in (i + 1)..3 {
                values[model.y(i, j, gates[i], gates[j]).unwrap().0] = 1.0;
            }
        }

        let expected = inst.walking_distance(&crate::instance::Assignment { gates: gates.to_vec() });
        assert_eq!(model.objective().eval(&values), expected);
    }
}
