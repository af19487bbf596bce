use std::{fs::File, io::{BufReader, Write}, time::{Duration, Instant}};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Context};
use clap::Args;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, InstanceError};
use crate::generate::GeneratorConfig;
use crate::resolution::{solve_instance, BranchAndBound, MilpSolver, SolverOutcome};

use super::aggregate::{Accumulator, AggregateRow, RunRecord};
use super::presets::Preset;
use super::ExperimentPlan;

/// Builds and solves one replication. Its seed is the replication index.
/// A panicking solver is recorded as an error run.
fn run_unit(config: &GeneratorConfig, replication: usize, solver: &impl MilpSolver, time_limit: Duration) -> Result<RunRecord, InstanceError> {
    let config = GeneratorConfig { seed: replication as u64, ..config.clone() };
    let instance = config.generate()?;
    let start = Instant::now();
    match catch_unwind(AssertUnwindSafe(|| solve_instance(&instance, solver, time_limit))) {
        Ok(report) => Ok(RunRecord::from_report(replication, &report)),
        Err(_) => {
            warn!(replication, "solver panicked");
            let outcome = SolverOutcome::error("solver panicked", 0);
            Ok(RunRecord::from_outcome(
                replication,
                &outcome,
                start.elapsed().as_secs_f64(),
                instance.apron_floor.total(),
                instance.total_passengers,
            ))
        },
    }
}

/// Runs every (combination, replication) unit of the plan and returns one
/// aggregated row per combination, in combination order.
///
/// Every configuration is validated before anything runs. An instance that
/// cannot be built aborts the sweep; a failed or infeasible solve is
/// recorded and the sweep goes on.
pub fn run_plan<S: MilpSolver + Sync>(plan: &ExperimentPlan, solver: &S) -> Result<Vec<AggregateRow>, InstanceError> {
    let configs = plan.configs()?;
    let time_limit = plan.time_limit()?;
    let units = (0..configs.len())
        .flat_map(|c| (0..plan.replications).map(move |rep| (c, rep)))
        .collect::<Vec<(usize, usize)>>();
    let total = units.len();
    let done = AtomicUsize::new(0);

    info!(combinations = configs.len(), replications = plan.replications, "starting sweep");

    let work = || {
        units.into_par_iter()
            .map(|(c, rep)| -> Result<(usize, RunRecord), InstanceError> {
                let (combo, config) = &configs[c];
                let run = run_unit(config, rep, solver, time_limit).map_err(|e| {
                    warn!(parameters = ?combo, replication = rep, error = %e, "instance construction failed");
                    e
                })?;
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                info!(
                    run = finished,
                    total,
                    parameters = ?combo,
                    replication = rep,
                    status = %run.status,
                    objective = ?run.objective,
                    time = run.total_time,
                    "run finished"
                );
                Ok((c, run))
            })
            .collect::<Result<Vec<(usize, RunRecord)>, InstanceError>>()
    };

    let runs = match plan.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ConfigError::Parameter(format!("cannot start {} worker threads: {}", threads, e)))?;
            pool.install(work)?
        },
        None => work()?,
    };

    let mut accumulators = vec![Accumulator::default(); configs.len()];
    for (c, run) in runs.iter() {
        accumulators[*c].push(run);
    }

    let rows = configs.into_iter()
        .zip(accumulators)
        .map(|((combo, _), acc)| acc.finish(combo))
        .collect::<Vec<AggregateRow>>();
    debug!(rows = rows.len(), "sweep aggregated");
    Ok(rows)
}

#[derive(Debug, Args)]
pub struct Sweep {
    /// The path to a json experiment plan
    #[clap(long, conflicts_with="preset")]
    pub plan: Option<String>,
    /// A named analysis
    #[clap(long, value_enum)]
    pub preset: Option<Preset>,
    /// Overrides the number of replications
    #[clap(short, long)]
    pub replications: Option<usize>,
    /// Overrides the time limit of every solve, in seconds
    #[clap(short, long)]
    pub timeout: Option<f64>,
    /// Overrides the number of worker threads
    #[clap(long)]
    pub threads: Option<usize>,
    /// Name of the file where to write the rows as json
    #[clap(short, long)]
    pub output: Option<String>,
}

impl Sweep {

    fn plan(&self) -> anyhow::Result<ExperimentPlan> {
        let mut plan = match (self.plan.as_ref(), self.preset) {
            (Some(path), _) => {
                let file = File::open(path).with_context(|| format!("cannot open {}", path))?;
                serde_json::from_reader(BufReader::new(file)).with_context(|| format!("cannot parse {}", path))?
            },
            (None, Some(preset)) => preset.plan(),
            (None, None) => bail!("either --plan or --preset is required"),
        };
        if let Some(replications) = self.replications {
            plan.replications = replications;
        }
        if let Some(timeout) = self.timeout {
            plan.time_limit_secs = timeout;
        }
        if self.threads.is_some() {
            plan.threads = self.threads;
        }
        Ok(plan)
    }

    pub fn sweep(&self) -> anyhow::Result<()> {
        let plan = self.plan()?;
        let rows = run_plan(&plan, &BranchAndBound::new())?;
        let rows = serde_json::to_string_pretty(&rows)?;

        if let Some(output) = self.output.as_ref() {
            File::create(output)
                .and_then(|mut f| f.write_all(rows.as_bytes()))
                .with_context(|| format!("cannot write rows to {}", output))?;
        } else {
            println!("{rows}");
        }
        Ok(())
    }

}
