use clap::ValueEnum;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::timegrid::windows_overlap;

/// How passenger flows are drawn for an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PassengerPolicy {
    /// Random non-transfer loads and random transfers between aircraft on the
    /// ground together.
    #[default]
    #[serde(alias = "paper")]
    #[value(alias = "paper")]
    Standard,
    #[serde(alias = "no_transfer")]
    #[value(alias = "no_transfer")]
    NoTransfer,
    #[serde(alias = "only_transfer")]
    #[value(alias = "only_transfer")]
    OnlyTransfer,
    /// Each aircraft's non-transfer load equals its outgoing transfer total.
    Equal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassengerData {
    pub transfers: Vec<Vec<u32>>,
    pub early: Vec<u32>,
    pub late: Vec<u32>,
}

const MAX_NON_TRANSFER: u32 = 100;
const TRANSFER_BUDGET: usize = 200;

impl PassengerPolicy {

    pub fn generate(self, rng: &mut impl Rng, windows: &[(f64, f64)], symmetric: bool) -> PassengerData {
        let n = windows.len();
        match self {
            PassengerPolicy::Standard => {
                let transfers = draw_transfers(rng, windows, symmetric);
                let loads = draw_loads(rng, n);
                let (early, late) = split_loads(rng, &loads, true);
                PassengerData { transfers, early, late }
            },
            PassengerPolicy::NoTransfer => {
                let loads = draw_loads(rng, n);
                let (early, late) = split_loads(rng, &loads, true);
                PassengerData { transfers: vec![vec![0; n]; n], early, late }
            },
            PassengerPolicy::OnlyTransfer => {
                let transfers = draw_transfers(rng, windows, symmetric);
                PassengerData { transfers, early: vec![0; n], late: vec![0; n] }
            },
            PassengerPolicy::Equal => {
                let transfers = draw_transfers(rng, windows, symmetric);
                let loads = transfers.iter().map(|row| row.iter().sum()).collect::<Vec<u32>>();
                let (early, late) = split_loads(rng, &loads, false);
                PassengerData { transfers, early, late }
            },
        }
    }

}

/// `p[i][j] ~ U{1..max(1, 200 / n)}` for every pair on the ground together.
fn draw_transfers(rng: &mut impl Rng, windows: &[(f64, f64)], symmetric: bool) -> Vec<Vec<u32>> {
    let n = windows.len();
    let mut transfers = vec![vec![0; n]; n];
    if n == 0 {
        return transfers;
    }
    let rand_flow = Uniform::new_inclusive(1, (TRANSFER_BUDGET / n).max(1) as u32);

    for i in 0..n {
        for j in 0..n {
            if i == j || (symmetric && j < i) {
                continue;
            }
            if windows_overlap(windows[i], windows[j]) {
                let flow = rand_flow.sample(rng);
                transfers[i][j] = flow;
                if symmetric {
                    transfers[j][i] = flow;
                }
            }
        }
    }
    transfers
}

fn draw_loads(rng: &mut impl Rng, n: usize) -> Vec<u32> {
    let rand_load = Uniform::new_inclusive(1, MAX_NON_TRANSFER);
    (0..n).map(|_| rand_load.sample(rng)).collect()
}

/// Splits each load into early and late passengers. With `inclusive`, the
/// early share may take the whole load.
fn split_loads(rng: &mut impl Rng, loads: &[u32], inclusive: bool) -> (Vec<u32>, Vec<u32>) {
    let early = loads.iter()
        .map(|&nt| match (nt, inclusive) {
            (0, _) => 0,
            (nt, true) => rng.gen_range(0..=nt),
            (nt, false) => rng.gen_range(0..nt),
        })
        .collect::<Vec<u32>>();
    let late = loads.iter().zip(early.iter()).map(|(nt, e)| nt - e).collect();
    (early, late)
}
