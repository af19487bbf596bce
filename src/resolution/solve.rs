use std::{fs::File, io::{BufReader, BufWriter, Write}, time::{Duration, Instant}};

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::generate::GeneratorConfig;
use crate::instance::{AircraftClass, Assignment, GapInstance};

use super::bnb::BranchAndBound;
use super::build::ModelBuilder;
use super::extract::{self, Violation};
use super::model::AssignmentModel;
use super::solver::{MilpSolver, Progress, SolveStatus};

/// Everything known about one solve of one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub gap: Option<f64>,
    /// Seconds spent building the model.
    pub build_time: f64,
    /// Seconds spent in the solver.
    pub solve_time: f64,
    pub total_time: f64,
    pub assignment: Option<Assignment>,
    pub violations: Vec<Violation>,
    pub iteration_log: Vec<Progress>,
    pub apron_floor: usize,
    pub total_passengers: u64,
    /// Zero when there is no objective or no passenger.
    pub objective_per_passenger: f64,
    pub message: Option<String>,
}

/// Builds the model of `instance` and solves it.
pub fn solve_instance(instance: &GapInstance, solver: &impl MilpSolver, time_limit: Duration) -> SolveReport {
    let start = Instant::now();
    let model = ModelBuilder::new(instance).build();
    let build_time = start.elapsed().as_secs_f64();
    solve_built(instance, &model, solver, time_limit, build_time)
}

/// Solves an already built model; `build_time` is carried into the report.
pub fn solve_built(
    instance: &GapInstance,
    model: &AssignmentModel,
    solver: &impl MilpSolver,
    time_limit: Duration,
    build_time: f64,
) -> SolveReport {
    let mut iteration_log = vec![];
    let start = Instant::now();
    let outcome = solver.solve(model, time_limit, &mut |p| iteration_log.push(*p));
    let solve_time = start.elapsed().as_secs_f64();

    let gap = outcome.gap();
    let objective = if outcome.status.may_have_incumbent() { outcome.objective } else { None };
    let assignment = match (objective, outcome.values.as_ref()) {
        (Some(_), Some(values)) => extract::decode(instance, model, values),
        _ => None,
    };
    let violations = assignment.as_ref()
        .map(|a| extract::verify(instance, a))
        .unwrap_or_default();

    let objective_per_passenger = match objective {
        Some(obj) if instance.total_passengers > 0 => obj / instance.total_passengers as f64,
        _ => 0.0,
    };

    debug!(status = %outcome.status, ?objective, ?gap, solve_time, "instance solved");

    SolveReport {
        status: outcome.status,
        objective,
        gap,
        build_time,
        solve_time,
        total_time: build_time + solve_time,
        assignment,
        violations,
        iteration_log,
        apron_floor: instance.apron_floor.total(),
        total_passengers: instance.total_passengers,
        objective_per_passenger,
        message: outcome.message,
    }
}

#[derive(Debug, Args)]
pub struct Solve {
    /// The path to the instance file; a fresh instance is generated when absent
    #[clap(short, long)]
    pub instance: Option<String>,
    #[command(flatten)]
    pub config: GeneratorConfig,
    /// timeout in seconds
    #[clap(short, long, default_value="60")]
    pub timeout: u64,
    /// If present, the path where to write the model in LP format
    #[clap(long)]
    pub lp: Option<String>,
    /// If present, the path where to write the report as json
    #[clap(short, long)]
    pub output: Option<String>,
}

impl Solve {

    fn load(&self) -> anyhow::Result<GapInstance> {
        match self.instance.as_ref() {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("cannot open {}", path))?;
                serde_json::from_reader(BufReader::new(file)).with_context(|| format!("cannot parse {}", path))
            },
            None => Ok(self.config.generate()?),
        }
    }

    pub fn solve(&self) -> anyhow::Result<()> {
        let instance = self.load()?;
        info!(aircraft = instance.nb_aircraft(), gates = instance.nb_gates(), apron_floor = instance.apron_floor.total(), "instance loaded");

        let start = Instant::now();
        let model = ModelBuilder::new(&instance).build();
        let build_time = start.elapsed().as_secs_f64();

        if let Some(path) = self.lp.as_ref() {
            let mut w = BufWriter::new(File::create(path).with_context(|| format!("cannot create {}", path))?);
            model.write_lp(&mut w).and_then(|_| w.flush()).with_context(|| format!("cannot write {}", path))?;
        }

        let report = solve_built(&instance, &model, &BranchAndBound::new(), Duration::from_secs(self.timeout), build_time);

        println!("status {}", report.status);
        match report.objective {
            Some(obj) => println!("best value {obj}"),
            None => println!("best value none"),
        }
        if let Some(gap) = report.gap {
            println!("gap {gap}");
        }
        println!("apron floor {}", report.apron_floor);
        for class in AircraftClass::ALL {
            let floor = instance.apron_floor.class(class);
            println!("  {} {} of {} aircraft on {} gates", class, floor.floor, floor.nb_aircraft, floor.nb_gates);
        }
        println!("objective per passenger {}", report.objective_per_passenger);
        if let Some(message) = report.message.as_ref() {
            println!("message {message}");
        }

        if let Some(assignment) = report.assignment.as_ref() {
            print_gates(&instance, assignment);
        }

        if let Some(output) = self.output.as_ref() {
            let json = serde_json::to_string_pretty(&report)?;
            File::create(output)
                .and_then(|mut f| f.write_all(json.as_bytes()))
                .with_context(|| format!("cannot write report to {}", output))?;
        }
        Ok(())
    }

}

/// One line per gate, aircraft in arrival order.
fn print_gates(instance: &GapInstance, assignment: &Assignment) {
    let mut per_gate = vec![vec![]; instance.nb_gates()];
    for (ac, &k) in assignment.gates.iter().enumerate() {
        per_gate[k].push(ac);
    }
    for (k, aircraft) in per_gate.iter_mut().enumerate() {
        aircraft.sort_by(|&a, &b| instance.aircraft[a].arrival.total_cmp(&instance.aircraft[b].arrival));
        let line = aircraft.iter()
            .map(|&ac| format!("{}@{:.2}", instance.aircraft[ac].id, instance.aircraft[ac].arrival))
            .collect::<Vec<String>>();
        println!("{:>6}: {:?}", instance.gates[k].id, line);
    }
}
