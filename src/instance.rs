//! This module defines an abstract representation of a gate assignment instance.

use std::fmt::Display;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::error::{ConfigError, InstanceError};
use crate::preprocess::ApronFloor;
use crate::preprocess::flow::{FlowSolver, SuccessiveShortestPaths};
use crate::timegrid::{TimeGrid, windows_overlap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AircraftClass {
    Domestic,
    International,
}

impl AircraftClass {
    pub const ALL: [AircraftClass; 2] = [AircraftClass::Domestic, AircraftClass::International];
}

impl Display for AircraftClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AircraftClass::Domestic => write!(f, "domestic"),
            AircraftClass::International => write!(f, "international"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateKind {
    Domestic,
    International,
    /// Overflow parking shared by both classes, without capacity limit.
    Apron,
}

impl GateKind {
    pub fn serves(self, class: AircraftClass) -> bool {
        self == GateKind::Apron || self == GateKind::from(class)
    }
}

impl From<AircraftClass> for GateKind {
    fn from(class: AircraftClass) -> Self {
        match class {
            AircraftClass::Domestic => GateKind::Domestic,
            AircraftClass::International => GateKind::International,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub id: String,
    pub class: AircraftClass,
    /// In hours.
    pub arrival: f64,
    pub departure: f64,
    pub turnaround: f64,
    /// Non-transfer passengers, split in two sub-counts.
    pub early: u32,
    pub late: u32,
}

impl Aircraft {
    pub fn new(id: impl Into<String>, class: AircraftClass, arrival: f64, departure: f64, early: u32, late: u32) -> Self {
        Aircraft { id: id.into(), class, arrival, departure, turnaround: departure - arrival, early, late }
    }

    pub fn window(&self) -> (f64, f64) {
        (self.arrival, self.departure)
    }

    pub fn non_transfer(&self) -> u32 {
        self.early + self.late
    }

    pub fn overlaps(&self, other: &Aircraft) -> bool {
        windows_overlap(self.window(), other.window())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub id: String,
    pub kind: GateKind,
    pub coord: (f64, f64),
}

impl Gate {
    pub const APRON: &'static str = "apron";

    pub fn new(id: impl Into<String>, kind: GateKind, coord: (f64, f64)) -> Self {
        Gate { id: id.into(), kind, coord }
    }

    pub fn apron(coord: (f64, f64)) -> Self {
        Gate::new(Gate::APRON, GateKind::Apron, coord)
    }

    pub fn manhattan(&self, to: (f64, f64)) -> f64 {
        (self.coord.0 - to.0).abs() + (self.coord.1 - to.1).abs()
    }
}

/// Gate chosen for every aircraft, by index into the instance's gate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub gates: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapInstance {
    pub aircraft: Vec<Aircraft>,
    /// Real gates first, the apron last.
    pub gates: Vec<Gate>,
    pub apron: usize,
    /// `transfers[i][j]`: passengers moving from aircraft `i` to aircraft `j`.
    pub transfers: Vec<Vec<u32>>,
    pub distances: Vec<Vec<f64>>,
    pub entrance_distances: Vec<f64>,
    pub time_grid: TimeGrid,
    pub apron_floor: ApronFloor,
    pub total_passengers: u64,
}

impl GapInstance {
    pub fn nb_aircraft(&self) -> usize {
        self.aircraft.len()
    }

    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// The gates an aircraft may use: those of its class, then the apron.
    pub fn eligible_gates(&self, aircraft: usize) -> impl Iterator<Item = usize> + '_ {
        let class = self.aircraft[aircraft].class;
        self.gates.iter()
            .enumerate()
            .filter(move |(_, g)| g.kind.serves(class))
            .map(|(k, _)| k)
    }

    pub fn aircraft_of(&self, class: AircraftClass) -> impl Iterator<Item = usize> + '_ {
        self.aircraft.iter()
            .enumerate()
            .filter(move |(_, ac)| ac.class == class)
            .map(|(i, _)| i)
    }

    pub fn real_gates(&self) -> impl Iterator<Item = usize> + '_ {
        self.gates.iter()
            .enumerate()
            .filter(|(_, g)| g.kind != GateKind::Apron)
            .map(|(k, _)| k)
    }

    pub fn transfers_from(&self, aircraft: usize) -> &[u32] {
        &self.transfers[aircraft]
    }

    /// Total walking distance of an assignment, transfers plus entrance walks.
    pub fn walking_distance(&self, assignment: &Assignment) -> f64 {
        let g = &assignment.gates;
        let mut total = 0.0;
        for i in 0..self.nb_aircraft() {
            total += self.aircraft[i].non_transfer() as f64 * self.entrance_distances[g[i]];
            for j in (i + 1)..self.nb_aircraft() {
                total += self.transfers[i][j] as f64 * self.distances[g[i]][g[j]];
            }
        }
        total
    }
}

/// Assembles an instance from explicit aircraft, gates and transfer flows.
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    gates: Vec<Gate>,
    aircraft: Vec<Aircraft>,
    transfers: Option<Vec<Vec<u32>>>,
    entrance: (f64, f64),
}

impl InstanceBuilder {

    /// The gate list must contain exactly one apron.
    pub fn new(gates: Vec<Gate>) -> Self {
        InstanceBuilder { gates, aircraft: vec![], transfers: None, entrance: (0.0, 0.0) }
    }

    pub fn aircraft(mut self, aircraft: Aircraft) -> Self {
        self.aircraft.push(aircraft);
        self
    }

    pub fn fleet(mut self, aircraft: Vec<Aircraft>) -> Self {
        self.aircraft.extend(aircraft);
        self
    }

    /// Without transfers, the matrix is all zeros.
    pub fn transfers(mut self, transfers: Vec<Vec<u32>>) -> Self {
        self.transfers = Some(transfers);
        self
    }

    pub fn entrance(mut self, entrance: (f64, f64)) -> Self {
        self.entrance = entrance;
        self
    }

    pub fn build(self) -> Result<GapInstance, InstanceError> {
        self.build_with(&SuccessiveShortestPaths::new())
    }

    pub fn build_with(self, flow: &impl FlowSolver) -> Result<GapInstance, InstanceError> {
        let InstanceBuilder { gates, aircraft, transfers, entrance } = self;
        let n = aircraft.len();

        // real gates first, apron last
        let (mut gates, aprons): (Vec<Gate>, Vec<Gate>) = gates.into_iter().partition(|g| g.kind != GateKind::Apron);
        if aprons.len() != 1 {
            return Err(ConfigError::Parameter(format!("expected exactly one apron gate, found {}", aprons.len())).into());
        }
        gates.extend(aprons);
        let apron = gates.len() - 1;

        for class in AircraftClass::ALL {
            let count = aircraft.iter().filter(|ac| ac.class == class).count();
            if count > 0 && !gates.iter().any(|g| g.kind == GateKind::from(class)) {
                return Err(ConfigError::NoGatesForClass { class, aircraft: count }.into());
            }
        }

        let transfers = transfers.unwrap_or_else(|| vec![vec![0; n]; n]);
        if transfers.len() != n {
            return Err(ConfigError::TransferShape { expected: n, found: transfers.len() }.into());
        }
        for (i, row) in transfers.iter().enumerate() {
            if row.len() != n {
                return Err(ConfigError::TransferShape { expected: n, found: row.len() }.into());
            }
            for (j, &p) in row.iter().enumerate() {
                if p > 0 && (i == j || !aircraft[i].overlaps(&aircraft[j])) {
                    return Err(ConfigError::Parameter(format!(
                        "transfer from {} to {} requires distinct aircraft on the ground together",
                        aircraft[i].id, aircraft[j].id
                    )).into());
                }
            }
        }

        let windows = aircraft.iter().map(Aircraft::window).collect::<Vec<_>>();
        let time_grid = TimeGrid::new(&windows)?;
        let apron_floor = ApronFloor::compute(&aircraft, &gates, flow)?;

        let distances = gates.iter()
            .map(|k| gates.iter().map(|l| k.manhattan(l.coord)).collect())
            .collect::<Vec<Vec<f64>>>();
        let entrance_distances = gates.iter().map(|k| k.manhattan(entrance)).collect::<Vec<f64>>();

        let total_passengers = aircraft.iter().map(|ac| ac.non_transfer() as u64).sum::<u64>()
            + transfers.iter().flatten().map(|&p| p as u64).sum::<u64>();

        debug!(
            aircraft = n,
            gates = gates.len(),
            intervals = time_grid.nb_intervals(),
            apron_floor = apron_floor.total(),
            total_passengers,
            "instance assembled"
        );

        Ok(GapInstance {
            aircraft,
            gates,
            apron,
            transfers,
            distances,
            entrance_distances,
            time_grid,
            apron_floor,
            total_passengers,
        })
    }

}
