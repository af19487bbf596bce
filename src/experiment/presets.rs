use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ExperimentPlan, ParameterAxis};

/// The analyses of the gate assignment study, ready to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Domestic aircraft 15..1 against domestic gates 7..1
    AircraftVsGates,
    /// 15 aircraft on 3 gates, time step from 1 to 59 minutes
    TimeDiscretization,
    /// 15 aircraft on 3 gates, turnaround from 2.9h down to 0.1h
    TurnaroundTime,
    /// Every passenger policy, domestic aircraft 15..2 on 3 gates
    PassengerTypes,
    /// Mixed traffic, both classes scaled together
    Validation,
    /// Both airport layouts with 6 domestic gates, domestic aircraft 14..1
    Layouts,
}

fn descending(from: u64, to: u64) -> impl Iterator<Item = Value> {
    (to..=from).rev().map(|v| json!(v))
}

impl Preset {

    pub fn plan(self) -> ExperimentPlan {
        match self {
            Preset::AircraftVsGates => ExperimentPlan::new(vec![
                ParameterAxis::single("num_dom_aircraft", descending(15, 1)),
                ParameterAxis::single("num_dom_gates", descending(7, 1)),
            ])
            .with_fixed("num_int_aircraft", json!(0))
            .with_fixed("num_int_gates", json!(0))
            .with_fixed("dom_turnover", json!(1.0)),

            Preset::TimeDiscretization => ExperimentPlan::new(vec![
                ParameterAxis::single("time_disc", (1..60).map(|m| json!(m as f64))),
            ])
            .with_fixed("num_dom_aircraft", json!(15))
            .with_fixed("num_dom_gates", json!(3)),

            Preset::TurnaroundTime => ExperimentPlan::new(vec![
                ParameterAxis::single("dom_turnover", (1..30).rev().map(|t| json!(t as f64 / 10.0))),
            ])
            .with_fixed("num_dom_aircraft", json!(15))
            .with_fixed("num_dom_gates", json!(3)),

            Preset::PassengerTypes => ExperimentPlan::new(vec![
                ParameterAxis::single("passenger_policy", ["no-transfer", "standard", "equal", "only-transfer"].map(|p| json!(p))),
                ParameterAxis::single("num_dom_aircraft", descending(15, 2)),
            ])
            .with_fixed("num_dom_gates", json!(3))
            .with_fixed("time_disc", json!(1.0))
            .with_fixed("dom_turnover", json!(1.0)),

            Preset::Validation => ExperimentPlan::new(vec![
                ParameterAxis::zip(
                    &["num_dom_aircraft", "num_int_aircraft"],
                    [15, 20, 25].iter().map(|&n| vec![json!(n), json!(n)]).collect(),
                ),
                ParameterAxis::zip(
                    &["num_dom_gates", "num_int_gates"],
                    [4, 5, 6].iter().map(|&n| vec![json!(n), json!(n)]).collect(),
                ),
            ])
            .with_fixed("time_disc", json!(1.0))
            .with_fixed("dom_turnover", json!(1.0))
            .with_fixed("int_turnover", json!(2.0))
            .with_fixed("passenger_policy", json!("standard")),

            Preset::Layouts => ExperimentPlan::new(vec![
                ParameterAxis::single("gate_layout", ["ber", "vie"].map(|l| json!(l))),
                ParameterAxis::single("num_dom_aircraft", descending(14, 1)),
            ])
            .with_fixed("num_dom_gates", json!(6))
            .with_fixed("passenger_policy", json!("standard")),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_a_valid_plan() {
        for preset in Preset::value_variants() {
            let plan = preset.plan();
            assert!(plan.configs().is_ok(), "{:?}", preset);
        }
    }

    #[test]
    fn preset_sizes() {
        assert_eq!(Preset::AircraftVsGates.plan().combinations().len(), 15 * 7);
        assert_eq!(Preset::TimeDiscretization.plan().combinations().len(), 59);
        assert_eq!(Preset::TurnaroundTime.plan().combinations().len(), 29);
        assert_eq!(Preset::PassengerTypes.plan().combinations().len(), 4 * 14);
        assert_eq!(Preset::Validation.plan().combinations().len(), 9);
        assert_eq!(Preset::Layouts.plan().combinations().len(), 2 * 14);
    }

    #[test]
    fn turnarounds_run_from_long_to_short() {
        let combos = Preset::TurnaroundTime.plan().combinations();
        assert_eq!(combos[0]["dom_turnover"], json!(2.9));
        assert_eq!(combos[28]["dom_turnover"], json!(0.1));
    }
}
