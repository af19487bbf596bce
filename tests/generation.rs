use std::time::Duration;

use gap::generate::{GateLayout, GeneratorConfig, OperatingWindow, PassengerPolicy};
use gap::resolution::extract::verify;
use gap::resolution::{solve_instance, BranchAndBound, SolveStatus};

fn config(seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        num_dom_aircraft: 4,
        num_int_aircraft: 2,
        num_dom_gates: 2,
        num_int_gates: 1,
        seed,
        ..Default::default()
    }
}

#[test]
fn identical_configurations_give_identical_instances() {
    for seed in [0, 1, 17] {
        let a = config(seed).generate().unwrap();
        let b = config(seed).generate().unwrap();
        assert_eq!(a, b);
        for (x, y) in a.aircraft.iter().zip(b.aircraft.iter()) {
            assert_eq!(x.arrival.to_bits(), y.arrival.to_bits());
            assert_eq!(x.departure.to_bits(), y.departure.to_bits());
        }
    }
    assert_ne!(config(0).generate().unwrap().aircraft, config(1).generate().unwrap().aircraft);
}

#[test]
fn distances_are_a_metric_on_gates() {
    for layout in [GateLayout::Linear, GateLayout::Ber, GateLayout::Vie] {
        let inst = GeneratorConfig { gate_layout: layout, ..config(3) }.generate().unwrap();
        for k in 0..inst.nb_gates() {
            assert_eq!(inst.distances[k][k], 0.0);
            for l in 0..inst.nb_gates() {
                assert_eq!(inst.distances[k][l], inst.distances[l][k]);
            }
        }
    }
}

#[test]
fn passenger_policies_shape_the_flows() {
    for policy in [PassengerPolicy::Standard, PassengerPolicy::NoTransfer, PassengerPolicy::OnlyTransfer, PassengerPolicy::Equal] {
        let inst = GeneratorConfig { passenger_policy: policy, num_dom_aircraft: 8, ..config(5) }.generate().unwrap();
        let n = inst.nb_aircraft();
        for i in 0..n {
            assert_eq!(inst.transfers[i][i], 0);
        }
        let transfers: u64 = inst.transfers.iter().flatten().map(|&p| p as u64).sum();
        let non_transfer: u64 = inst.aircraft.iter().map(|ac| ac.non_transfer() as u64).sum();
        assert_eq!(inst.total_passengers, transfers + non_transfer);

        match policy {
            PassengerPolicy::NoTransfer => assert_eq!(transfers, 0),
            PassengerPolicy::OnlyTransfer => assert_eq!(non_transfer, 0),
            PassengerPolicy::Equal => {
                for (i, ac) in inst.aircraft.iter().enumerate() {
                    assert_eq!(ac.non_transfer(), inst.transfers[i].iter().sum::<u32>());
                }
            },
            PassengerPolicy::Standard => assert!(non_transfer > 0),
        }
    }
}

#[test]
fn solved_assignments_respect_every_hard_rule() {
    for (seed, window) in [(0, OperatingWindow::Set1), (1, OperatingWindow::Set2), (2, OperatingWindow::Set2)] {
        let inst = GeneratorConfig { airport_window: window, ..config(seed) }.generate().unwrap();
        let report = solve_instance(&inst, &BranchAndBound::new(), Duration::from_secs(120));
        assert_eq!(report.status, SolveStatus::Optimal);

        let assignment = report.assignment.unwrap();
        assert!(verify(&inst, &assignment).is_empty());
        for (i, &k) in assignment.gates.iter().enumerate() {
            assert!(inst.eligible_gates(i).any(|g| g == k));
        }
        let on_apron = assignment.gates.iter().filter(|&&k| k == inst.apron).count();
        assert_eq!(on_apron, inst.apron_floor.total());
        assert!((inst.walking_distance(&assignment) - report.objective.unwrap()).abs() < 1e-6);
    }
}
