//! Seeded synthesis of gate assignment instances.

pub mod layout;
pub mod passengers;
pub mod window;

use std::{fs::File, io::Write};

use anyhow::Context;
use clap::Args;
use derivative::Derivative;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{ConfigError, InstanceError};
use crate::instance::{Aircraft, AircraftClass, GapInstance, InstanceBuilder};

pub use layout::GateLayout;
pub use passengers::{PassengerData, PassengerPolicy};
pub use window::OperatingWindow;

/// Every parameter of an instance. Also readable from a flat JSON map, which
/// is how experiment plans override it.
#[derive(Debug, Clone, PartialEq, Args, Serialize, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// The number of domestic aircraft
    #[clap(long, default_value="10")]
    #[derivative(Default(value="10"))]
    pub num_dom_aircraft: usize,
    /// The number of international aircraft
    #[clap(long, default_value="0")]
    pub num_int_aircraft: usize,
    /// The number of domestic gates, apron excluded
    #[clap(long, default_value="10")]
    #[derivative(Default(value="10"))]
    pub num_dom_gates: usize,
    /// The number of international gates, apron excluded
    #[clap(long, default_value="0")]
    pub num_int_gates: usize,
    /// Base turnaround of domestic aircraft in hours (0 uses the window's)
    #[clap(long, default_value="0.0")]
    pub dom_turnover: f64,
    /// Base turnaround of international aircraft in hours (0 uses the window's)
    #[clap(long, default_value="0.0")]
    pub int_turnover: f64,
    /// The operating window of the airport
    #[clap(long, value_enum, default_value="set1")]
    pub airport_window: OperatingWindow,
    /// The time discretization in minutes
    #[clap(long, default_value="10.0")]
    #[derivative(Default(value="10.0"))]
    pub time_disc: f64,
    /// The seed of the instance
    #[clap(short='s', long, default_value="1")]
    #[derivative(Default(value="1"))]
    pub seed: u64,
    /// How passenger flows are drawn
    #[clap(long, value_enum, default_value="standard")]
    pub passenger_policy: PassengerPolicy,
    /// Gate coordinates
    #[clap(long, value_enum, default_value="linear")]
    pub gate_layout: GateLayout,
    /// Draw one transfer flow per pair and use it in both directions
    #[clap(long)]
    pub symmetric_transfers: bool,
}

impl GeneratorConfig {

    /// Overlays `overrides` on the defaults; unknown names are rejected.
    pub fn from_parameters(overrides: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut params = match serde_json::to_value(GeneratorConfig::default()) {
            Ok(Value::Object(map)) => map,
            _ => return Err(ConfigError::Parameter("default configuration is not a map".to_string())),
        };
        for (name, value) in overrides.iter() {
            params.insert(name.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(params)).map_err(|e| ConfigError::Parameter(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_disc.is_finite() || self.time_disc <= 0.0 {
            return Err(ConfigError::InvalidDiscretization(self.time_disc));
        }
        for (class, value) in [(AircraftClass::Domestic, self.dom_turnover), (AircraftClass::International, self.int_turnover)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTurnaround { class, value });
            }
        }
        if self.num_dom_aircraft > 0 && self.num_dom_gates == 0 {
            return Err(ConfigError::NoGatesForClass { class: AircraftClass::Domestic, aircraft: self.num_dom_aircraft });
        }
        if self.num_int_aircraft > 0 && self.num_int_gates == 0 {
            return Err(ConfigError::NoGatesForClass { class: AircraftClass::International, aircraft: self.num_int_aircraft });
        }
        Ok(())
    }

    /// A fresh generator for this configuration; two calls yield the same stream.
    pub fn rng(&self) -> ChaChaRng {
        let init = self.seed;
        let mut seed = [0_u8; 32];
        seed.iter_mut().zip(init.to_be_bytes().into_iter()).for_each(|(s, i)| *s = i);
        seed.iter_mut().rev().zip(init.to_le_bytes().into_iter()).for_each(|(s, i)| *s = i);
        ChaChaRng::from_seed(seed)
    }

    pub fn generate(&self) -> Result<GapInstance, InstanceError> {
        self.validate()?;
        let mut rng = self.rng();

        info!(
            seed = self.seed,
            domestic = self.num_dom_aircraft,
            international = self.num_int_aircraft,
            policy = ?self.passenger_policy,
            "generating instance"
        );

        let mut windows = window::sample_windows(&mut rng, self.num_dom_aircraft, self.airport_window, self.time_disc, self.dom_turnover);
        windows.extend(window::sample_windows(&mut rng, self.num_int_aircraft, self.airport_window, self.time_disc, self.int_turnover));

        let PassengerData { transfers, early, late } = self.passenger_policy.generate(&mut rng, &windows, self.symmetric_transfers);

        let aircraft = self.fleet(&windows, &early, &late);
        let gates = self.gate_layout.gates(self.num_dom_gates, self.num_int_gates);

        InstanceBuilder::new(gates)
            .fleet(aircraft)
            .transfers(transfers)
            .build()
    }

    /// `dom1..domN` then `int1..intM`.
    fn fleet(&self, windows: &[(f64, f64)], early: &[u32], late: &[u32]) -> Vec<Aircraft> {
        let classes = std::iter::repeat((AircraftClass::Domestic, "dom")).take(self.num_dom_aircraft).enumerate()
            .chain(std::iter::repeat((AircraftClass::International, "int")).take(self.num_int_aircraft).enumerate());

        classes.zip(windows.iter())
            .enumerate()
            .map(|(i, ((nb, (class, prefix)), &(arrival, departure)))| {
                Aircraft::new(format!("{}{}", prefix, nb + 1), class, arrival, departure, early[i], late[i])
            })
            .collect()
    }

}

#[derive(Debug, Args)]
pub struct Generate {
    #[command(flatten)]
    pub config: GeneratorConfig,
    /// Name of the file where to generate the instance
    #[clap(short, long)]
    pub output: Option<String>,
}

impl Generate {

    pub fn generate(&self) -> anyhow::Result<()> {
        let instance = self.config.generate()?;
        let instance = serde_json::to_string_pretty(&instance)?;

        if let Some(output) = self.output.as_ref() {
            File::create(output)
                .and_then(|mut f| f.write_all(instance.as_bytes()))
                .with_context(|| format!("cannot write instance to {}", output))?;
        } else {
            println!("{instance}");
        }
        Ok(())
    }

}
