//! Discretization of the planning horizon.
//!
//! Every arrival and departure timestamp becomes a breakpoint; consecutive
//! breakpoints delimit half-open intervals `[t_r, t_{r+1})`. An aircraft
//! occupies interval `r` iff `arrival < t_{r+1} && departure > t_r`, so an
//! aircraft leaving at `t` and another arriving at `t` never share an interval.

use serde::{Deserialize, Serialize};

use crate::error::TimeGridError;

/// Whether two ground windows overlap under half-open semantics.
#[inline]
pub fn windows_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    breakpoints: Vec<f64>,
    /// `occupancy[ac][r]`, the compatibility matrix.
    occupancy: Vec<Vec<bool>>,
}

impl TimeGrid {

    pub fn new(windows: &[(f64, f64)]) -> Result<Self, TimeGridError> {
        for (aircraft, &(arrival, departure)) in windows.iter().enumerate() {
            if !arrival.is_finite() || !departure.is_finite() {
                return Err(TimeGridError::NonFiniteTime { aircraft });
            }
            if arrival >= departure {
                return Err(TimeGridError::EmptyWindow { aircraft, arrival, departure });
            }
        }

        let mut breakpoints = windows.iter().flat_map(|&(a, d)| [a, d]).collect::<Vec<f64>>();
        breakpoints.sort_unstable_by(|a, b| a.total_cmp(b));
        breakpoints.dedup();

        let occupancy = windows.iter()
            .map(|&(arrival, departure)| {
                breakpoints.windows(2)
                    .map(|w| arrival < w[1] && departure > w[0])
                    .collect()
            })
            .collect();

        Ok(TimeGrid { breakpoints, occupancy })
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn nb_intervals(&self) -> usize {
        self.breakpoints.len().saturating_sub(1)
    }

    pub fn nb_aircraft(&self) -> usize {
        self.occupancy.len()
    }

    /// The bounds `[t_r, t_{r+1})` of interval `r`.
    pub fn interval(&self, r: usize) -> (f64, f64) {
        (self.breakpoints[r], self.breakpoints[r + 1])
    }

    pub fn occupies(&self, aircraft: usize, r: usize) -> bool {
        self.occupancy[aircraft][r]
    }

    /// The aircraft on the ground during interval `r`, in index order.
    pub fn present(&self, r: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.nb_aircraft()).filter(move |&ac| self.occupies(ac, r))
    }

}
