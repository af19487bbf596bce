//! Apron floor: the least number of aircraft that cannot be packed onto the
//! real gates of their class.
//!
//! A gate is a track that aircraft chain through one after the other. Per
//! class we build the DAG `source -> ac -> sink`, with `ac_i -> ac_j` whenever
//! `departure_i <= arrival_j`, and look for at most `#gates` vertex-disjoint
//! paths covering as many aircraft as possible. Aircraft nodes are split in
//! two with a unit arc of cost `-1`, so the min-cost flow counts the covered
//! aircraft exactly.

pub mod flow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PreprocessError;
use crate::instance::{Aircraft, AircraftClass, Gate, GateKind};

use self::flow::{FlowNetwork, FlowSolver, FlowStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFloor {
    pub class: AircraftClass,
    pub nb_aircraft: usize,
    pub nb_gates: usize,
    /// Aircraft that fit on the real gates.
    pub on_gates: usize,
    /// `nb_aircraft - on_gates`.
    pub floor: usize,
    /// One chain of aircraft indices per used gate track, in visiting order.
    pub tracks: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApronFloor {
    pub domestic: ClassFloor,
    pub international: ClassFloor,
}

impl ApronFloor {

    /// Computes both class floors independently; the instance uses their sum.
    pub fn compute(aircraft: &[Aircraft], gates: &[Gate], solver: &impl FlowSolver) -> Result<Self, PreprocessError> {
        let domestic = class_floor(AircraftClass::Domestic, aircraft, gates, solver)?;
        let international = class_floor(AircraftClass::International, aircraft, gates, solver)?;
        Ok(ApronFloor { domestic, international })
    }

    pub fn total(&self) -> usize {
        AircraftClass::ALL.iter().map(|&class| self.class(class).floor).sum()
    }

    pub fn class(&self, class: AircraftClass) -> &ClassFloor {
        match class {
            AircraftClass::Domestic => &self.domestic,
            AircraftClass::International => &self.international,
        }
    }

}

#[inline]
fn in_node(i: usize) -> usize {
    2 + 2 * i
}

#[inline]
fn out_node(i: usize) -> usize {
    3 + 2 * i
}

/// The chaining network for aircraft with the given windows.
pub fn chaining_network(windows: &[(f64, f64)], nb_gates: usize) -> FlowNetwork {
    let n = windows.len();
    let mut network = FlowNetwork::new(2 + 2 * n, 0, 1);

    for i in 0..n {
        network.add_arc(network.source(), in_node(i), 1, 0);
        network.add_arc(in_node(i), out_node(i), 1, -1);
        network.add_arc(out_node(i), network.sink(), 1, 0);
    }
    for (i, wi) in windows.iter().enumerate() {
        for (j, wj) in windows.iter().enumerate() {
            if i != j && wi.1 <= wj.0 {
                network.add_arc(out_node(i), in_node(j), 1, 0);
            }
        }
    }

    network.with_source_cap(nb_gates as i64).with_sink_cap(nb_gates as i64)
}

/// Follows the unit flows from the source to recover the gate tracks.
fn tracks_from_flow(network: &FlowNetwork, flows: &[i64], n: usize) -> Vec<Vec<usize>> {
    let mut starts = vec![];
    let mut successor = vec![None; n];

    for (arc, &f) in network.arcs().iter().zip(flows.iter()) {
        if f <= 0 {
            continue;
        }
        if arc.from == network.source() {
            starts.push((arc.to - 2) / 2);
        } else if arc.from >= 2 && arc.to >= 2 && arc.from % 2 == 1 && arc.to % 2 == 0 {
            successor[(arc.from - 3) / 2] = Some((arc.to - 2) / 2);
        }
    }

    starts.sort_unstable();
    starts.into_iter()
        .map(|start| {
            let mut track = vec![start];
            let mut cur = start;
            while let Some(next) = successor[cur] {
                track.push(next);
                cur = next;
            }
            track
        })
        .collect()
}

pub fn class_floor(class: AircraftClass, aircraft: &[Aircraft], gates: &[Gate], solver: &impl FlowSolver) -> Result<ClassFloor, PreprocessError> {
    let members = aircraft.iter()
        .enumerate()
        .filter(|(_, ac)| ac.class == class)
        .map(|(i, _)| i)
        .collect::<Vec<usize>>();
    let nb_gates = gates.iter().filter(|g| g.kind == GateKind::from(class)).count();
    let n = members.len();

    if n == 0 || nb_gates == 0 {
        return Ok(ClassFloor { class, nb_aircraft: n, nb_gates, on_gates: 0, floor: n, tracks: vec![] });
    }

    let windows = members.iter().map(|&i| aircraft[i].window()).collect::<Vec<_>>();
    let network = chaining_network(&windows, nb_gates);
    let solution = solver.solve(&network);

    if solution.status != FlowStatus::Optimal {
        return Err(PreprocessError::new(class, solution.status.to_string()));
    }
    let on_gates = usize::try_from(-solution.cost)
        .ok()
        .filter(|&covered| covered <= n)
        .ok_or_else(|| PreprocessError::new(class, format!("inconsistent cost {}", solution.cost)))?;

    let tracks = tracks_from_flow(&network, &solution.arc_flows, n)
        .into_iter()
        .map(|track| track.into_iter().map(|local| members[local]).collect())
        .collect::<Vec<Vec<usize>>>();

    debug!(%class, aircraft = n, gates = nb_gates, on_gates, tracks = tracks.len(), "apron floor computed");

    Ok(ClassFloor { class, nb_aircraft: n, nb_gates, on_gates, floor: n - on_gates, tracks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::flow::{FlowSolution, SuccessiveShortestPaths};

    fn fleet(class: AircraftClass, windows: &[(f64, f64)]) -> Vec<Aircraft> {
        windows.iter()
            .enumerate()
            .map(|(i, &(a, d))| Aircraft::new(format!("ac{}", i + 1), class, a, d, 0, 0))
            .collect()
    }

    fn gates(kind: GateKind, n: usize) -> Vec<Gate> {
        (0..n).map(|i| Gate::new(format!("G{}", i + 1), kind, (3.0 + 2.0 * i as f64, 0.0))).collect()
    }

    /// Max number of intervals packed onto `k` tracks: sweep by arrival and,
    /// when too many overlap, drop the one leaving last.
    fn greedy_on_gates(windows: &[(f64, f64)], k: usize) -> usize {
        let mut sorted = windows.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut active: Vec<f64> = vec![];
        let mut dropped = 0;
        for (a, d) in sorted {
            active.retain(|&end| end > a);
            active.push(d);
            if active.len() > k {
                let (pos, _) = active.iter().enumerate().max_by(|x, y| x.1.total_cmp(y.1)).unwrap();
                active.remove(pos);
                dropped += 1;
            }
        }
        windows.len() - dropped
    }

    #[test]
    fn overlapping_pair_on_one_gate_leaves_one_on_the_apron() {
        let aircraft = fleet(AircraftClass::Domestic, &[(13.0, 14.0), (13.5, 14.5)]);
        let floor = ApronFloor::compute(&aircraft, &gates(GateKind::Domestic, 1), &SuccessiveShortestPaths::new()).unwrap();
        assert_eq!(floor.domestic.floor, 1);
        assert_eq!(floor.domestic.tracks.len(), 1);
        assert_eq!(floor.total(), 1);
    }

    #[test]
    fn disjoint_pair_chains_through_one_gate() {
        let aircraft = fleet(AircraftClass::Domestic, &[(13.0, 14.0), (14.0, 15.0)]);
        let floor = ApronFloor::compute(&aircraft, &gates(GateKind::Domestic, 1), &SuccessiveShortestPaths::new()).unwrap();
        assert_eq!(floor.total(), 0);
        assert_eq!(floor.domestic.tracks, vec![vec![0, 1]]);
    }

    #[test]
    fn classes_are_computed_independently() {
        let mut aircraft = fleet(AircraftClass::Domestic, &[(13.0, 14.0), (13.0, 14.0), (13.0, 14.0)]);
        aircraft.extend(fleet(AircraftClass::International, &[(13.0, 14.0), (13.0, 14.0)]));
        let mut all_gates = gates(GateKind::Domestic, 2);
        all_gates.extend(gates(GateKind::International, 1));

        let floor = ApronFloor::compute(&aircraft, &all_gates, &SuccessiveShortestPaths::new()).unwrap();
        assert_eq!(floor.domestic.floor, 1);
        assert_eq!(floor.international.floor, 1);
        assert_eq!(floor.total(), 2);
        for track in floor.international.tracks.iter() {
            assert!(track.iter().all(|&i| i >= 3));
        }
    }

    #[test]
    fn reference_day_from_the_paper_example() {
        // three gates, eight aircraft over four hourly slots
        let windows = [(0.0, 1.0), (0.0, 1.0), (0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (2.0, 3.0), (2.0, 3.0), (2.0, 3.0)];
        let aircraft = fleet(AircraftClass::Domestic, &windows);
        let floor = ApronFloor::compute(&aircraft, &gates(GateKind::Domestic, 3), &SuccessiveShortestPaths::new()).unwrap();
        assert_eq!(floor.domestic.on_gates, 7);
        assert_eq!(floor.domestic.floor, 1);
        assert!(floor.domestic.tracks.len() <= 3);
        assert_eq!(floor.domestic.tracks.iter().map(Vec::len).sum::<usize>(), 7);
    }

    #[test]
    fn tracks_never_hold_overlapping_aircraft() {
        let windows = [(13.0, 14.5), (13.5, 14.0), (14.0, 15.0), (14.5, 16.0), (13.0, 13.5), (15.0, 16.0), (13.5, 15.5)];
        let aircraft = fleet(AircraftClass::Domestic, &windows);
        for k in 1..=4 {
            let floor = ApronFloor::compute(&aircraft, &gates(GateKind::Domestic, k), &SuccessiveShortestPaths::new()).unwrap();
            assert_eq!(floor.domestic.on_gates, greedy_on_gates(&windows, k));
            assert!(floor.domestic.tracks.len() <= k);
            for track in floor.domestic.tracks.iter() {
                for pair in track.windows(2) {
                    assert!(windows[pair[0]].1 <= windows[pair[1]].0);
                }
            }
        }
    }

    #[test]
    fn no_gates_sends_everyone_to_the_apron() {
        let aircraft = fleet(AircraftClass::International, &[(13.0, 14.0), (15.0, 16.0)]);
        let floor = ApronFloor::compute(&aircraft, &gates(GateKind::Domestic, 2), &SuccessiveShortestPaths::new()).unwrap();
        assert_eq!(floor.international.floor, 2);
        assert_eq!(floor.domestic.floor, 0);
    }

    struct Failing;

    impl FlowSolver for Failing {
        fn solve(&self, network: &FlowNetwork) -> FlowSolution {
            FlowSolution {
                status: FlowStatus::IterationLimit,
                value: 0,
                cost: 0,
                arc_flows: vec![0; network.arcs().len()],
            }
        }
    }

    #[test]
    fn non_optimal_flow_is_fatal() {
        let aircraft = fleet(AircraftClass::Domestic, &[(13.0, 14.0)]);
        let err = ApronFloor::compute(&aircraft, &gates(GateKind::Domestic, 1), &Failing).unwrap_err();
        assert_eq!(err.class(), AircraftClass::Domestic);
        assert_eq!(err.status(), "iteration-limit");
    }
}
