use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::instance::{Gate, GateKind};

/// Where gates sit relative to the terminal entrance at the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GateLayout {
    /// Domestic gates along +x, international along -x, two units apart.
    #[default]
    Linear,
    /// Domestic gates alternating between the two arms of a corner.
    #[serde(alias = "BER")]
    Ber,
    /// Domestic gates paired along a single pier.
    #[serde(alias = "VIE")]
    Vie,
}

impl GateLayout {

    fn domestic_coord(self, i: usize) -> (f64, f64) {
        let n = (i + 1) as f64;
        match self {
            GateLayout::Linear => (3.0 + 2.0 * i as f64, 0.0),
            GateLayout::Ber if (i + 1) % 2 == 1 => (n + 2.0, 0.0),
            GateLayout::Ber => (0.0, n + 1.0),
            GateLayout::Vie if (i + 1) % 2 == 0 => (n + 1.0, 0.5),
            GateLayout::Vie => (n + 2.0, 0.5),
        }
    }

    fn international_coord(self, j: usize) -> (f64, f64) {
        (-3.0 - 2.0 * j as f64, 0.0)
    }

    /// Deliberately far from everything, so the apron is used only when forced.
    pub fn apron_coord(self) -> (f64, f64) {
        match self {
            GateLayout::Ber => (30.0, 0.0),
            GateLayout::Linear | GateLayout::Vie => (0.0, 30.0),
        }
    }

    /// `A1..An` domestic, `B1..Bm` international, then the apron.
    pub fn gates(self, nb_domestic: usize, nb_international: usize) -> Vec<Gate> {
        let mut gates = Vec::with_capacity(nb_domestic + nb_international + 1);
        for i in 0..nb_domestic {
            gates.push(Gate::new(format!("A{}", i + 1), GateKind::Domestic, self.domestic_coord(i)));
        }
        for j in 0..nb_international {
            gates.push(Gate::new(format!("B{}", j + 1), GateKind::International, self.international_coord(j)));
        }
        gates.push(Gate::apron(self.apron_coord()));
        gates
    }

}
