//! Parameter sweeps: the Cartesian product of parameter axes, each
//! combination solved over several seeded replications and averaged.

pub mod aggregate;
pub mod harness;
pub mod presets;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::generate::GeneratorConfig;

pub use aggregate::{Accumulator, AggregateRow, RunRecord};
pub use harness::{run_plan, Sweep};
pub use presets::Preset;

/// One or more parameters that vary together. A single-name axis varies on
/// its own; a zipped axis moves all its names in lockstep, one value per name
/// in every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterAxis {
    pub names: Vec<String>,
    pub values: Vec<Vec<Value>>,
}

impl ParameterAxis {

    pub fn single(name: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        ParameterAxis { names: vec![name.into()], values: values.into_iter().map(|v| vec![v]).collect() }
    }

    pub fn zip(names: &[&str], values: Vec<Vec<Value>>) -> Self {
        ParameterAxis { names: names.iter().map(|n| n.to_string()).collect(), values }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.names.is_empty() {
            return Err(ConfigError::Parameter("axis without parameter name".to_string()));
        }
        match self.values.iter().find(|step| step.len() != self.names.len()) {
            Some(step) => Err(ConfigError::Parameter(format!(
                "axis {:?} expects {} values per step, found {}", self.names, self.names.len(), step.len()
            ))),
            None => Ok(()),
        }
    }

}

fn default_replications() -> usize {
    1
}

fn default_time_limit() -> f64 {
    600.0
}

/// A full sweep description, readable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentPlan {
    pub axes: Vec<ParameterAxis>,
    /// Overrides shared by every combination.
    #[serde(default)]
    pub fixed: Map<String, Value>,
    #[serde(default = "default_replications")]
    pub replications: usize,
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: f64,
    /// Worker threads; rayon's global pool when absent.
    #[serde(default)]
    pub threads: Option<usize>,
}

/// The varying parameters of one combination, in axis order.
pub type Combination = Map<String, Value>;

impl ExperimentPlan {

    pub fn new(axes: Vec<ParameterAxis>) -> Self {
        ExperimentPlan { axes, fixed: Map::new(), replications: default_replications(), time_limit_secs: default_time_limit(), threads: None }
    }

    pub fn with_fixed(mut self, name: &str, value: Value) -> Self {
        self.fixed.insert(name.to_string(), value);
        self
    }

    pub fn with_replications(mut self, replications: usize) -> Self {
        self.replications = replications;
        self
    }

    pub fn with_time_limit(mut self, secs: f64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// The time limit of every solve. Negative, non-finite or overflowing
    /// values are rejected.
    pub fn time_limit(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.time_limit_secs)
            .map_err(|e| ConfigError::Parameter(format!("invalid time limit {}: {}", self.time_limit_secs, e)))
    }

    /// Every combination of the axes, the last axis varying fastest. A plan
    /// without axes has a single, empty combination.
    pub fn combinations(&self) -> Vec<Combination> {
        self.axes.iter().fold(vec![Map::new()], |acc, axis| {
            acc.iter()
                .flat_map(|prefix| axis.values.iter().map(move |step| {
                    let mut combo = prefix.clone();
                    for (name, value) in axis.names.iter().zip(step.iter()) {
                        combo.insert(name.clone(), value.clone());
                    }
                    combo
                }))
                .collect()
        })
    }

    /// The generator configuration of every combination, fixed parameters
    /// first and varying ones on top. Fails on the first invalid one.
    pub fn configs(&self) -> Result<Vec<(Combination, GeneratorConfig)>, ConfigError> {
        self.time_limit()?;
        for axis in self.axes.iter() {
            axis.check()?;
        }
        self.combinations()
            .into_iter()
            .map(|combo| {
                let mut params = self.fixed.clone();
                params.extend(combo.clone());
                let config = GeneratorConfig::from_parameters(&params)?;
                config.validate()?;
                Ok((combo, config))
            })
            .collect()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn combinations_are_a_cartesian_product() {
        let plan = ExperimentPlan::new(vec![
            ParameterAxis::single("num_dom_aircraft", [json!(3), json!(2)]),
            ParameterAxis::single("num_dom_gates", [json!(1), json!(2), json!(3)]),
        ]);
        let combos = plan.combinations();
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], json!({ "num_dom_aircraft": 3, "num_dom_gates": 1 }).as_object().unwrap().clone());
        assert_eq!(combos[5], json!({ "num_dom_aircraft": 2, "num_dom_gates": 3 }).as_object().unwrap().clone());
    }

    #[test]
    fn zipped_axes_move_together() {
        let plan = ExperimentPlan::new(vec![
            ParameterAxis::zip(&["num_dom_aircraft", "num_int_aircraft"], vec![vec![json!(15), json!(15)], vec![json!(20), json!(20)]]),
            ParameterAxis::zip(&["num_dom_gates", "num_int_gates"], vec![vec![json!(4), json!(4)], vec![json!(5), json!(5)]]),
        ]);
        let combos = plan.combinations();
        assert_eq!(combos.len(), 4);
        assert!(combos.iter().all(|c| c["num_dom_aircraft"] == c["num_int_aircraft"] && c["num_dom_gates"] == c["num_int_gates"]));
    }

    #[test]
    fn no_axis_means_one_combination() {
        assert_eq!(ExperimentPlan::new(vec![]).combinations(), vec![Map::new()]);
    }

    #[test]
    fn configs_layer_varying_over_fixed() {
        let plan = ExperimentPlan::new(vec![ParameterAxis::single("num_dom_gates", [json!(2)])])
            .with_fixed("num_dom_gates", json!(7))
            .with_fixed("num_dom_aircraft", json!(4));
        let configs = plan.configs().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].1.num_dom_gates, 2);
        assert_eq!(configs[0].1.num_dom_aircraft, 4);
        assert!(!configs[0].0.contains_key("num_dom_aircraft"));
    }

    #[test]
    fn malformed_plans_are_rejected() {
        let ragged = ExperimentPlan::new(vec![ParameterAxis::zip(&["num_dom_aircraft", "num_int_aircraft"], vec![vec![json!(1)]])]);
        assert!(matches!(ragged.configs(), Err(ConfigError::Parameter(_))));

        let unknown = ExperimentPlan::new(vec![ParameterAxis::single("airport_window", [json!("set7")])]);
        assert!(unknown.configs().is_err());

        let no_gate = ExperimentPlan::new(vec![ParameterAxis::single("num_dom_gates", [json!(0)])]);
        assert!(matches!(no_gate.configs(), Err(ConfigError::NoGatesForClass { .. })));
    }

    #[test]
    fn time_limits_must_fit_a_duration() {
        assert_eq!(ExperimentPlan::new(vec![]).with_time_limit(2.5).time_limit(), Ok(Duration::from_millis(2500)));
        for secs in [1e20, f64::NAN, f64::INFINITY, -1.0] {
            let plan = ExperimentPlan::new(vec![]).with_time_limit(secs);
            assert!(matches!(plan.time_limit(), Err(ConfigError::Parameter(_))), "{}", secs);
            assert!(matches!(plan.configs(), Err(ConfigError::Parameter(_))), "{}", secs);
        }
    }

    #[test]
    fn plans_read_from_json_use_defaults() {
        let plan: ExperimentPlan = serde_json::from_value(json!({
            "axes": [{ "names": ["time_disc"], "values": [[5.0], [10.0]] }],
            "fixed": { "num_dom_aircraft": 5 }
        })).unwrap();
        assert_eq!(plan.replications, 1);
        assert_eq!(plan.time_limit_secs, 600.0);
        assert_eq!(plan.threads, None);
        assert_eq!(plan.combinations().len(), 2);
    }
}
