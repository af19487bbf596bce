use serde::{Deserialize, Serialize};

use crate::resolution::{SolveReport, SolveStatus, SolverOutcome};

use super::Combination;

/// The metrics kept from one replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub replication: usize,
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub gap: Option<f64>,
    pub build_time: f64,
    pub solve_time: f64,
    pub total_time: f64,
    pub apron_floor: usize,
    pub total_passengers: u64,
    pub objective_per_passenger: f64,
}

impl RunRecord {
    pub fn from_report(replication: usize, report: &SolveReport) -> Self {
        RunRecord {
            replication,
            status: report.status,
            objective: report.objective,
            gap: report.gap,
            build_time: report.build_time,
            solve_time: report.solve_time,
            total_time: report.total_time,
            apron_floor: report.apron_floor,
            total_passengers: report.total_passengers,
            objective_per_passenger: report.objective_per_passenger,
        }
    }

    /// A run whose solve never produced a report, timed from the outside.
    pub fn from_outcome(replication: usize, outcome: &SolverOutcome, elapsed: f64, apron_floor: usize, total_passengers: u64) -> Self {
        RunRecord {
            replication,
            status: outcome.status,
            objective: outcome.objective,
            gap: outcome.gap(),
            build_time: 0.0,
            solve_time: elapsed,
            total_time: elapsed,
            apron_floor,
            total_passengers,
            objective_per_passenger: 0.0,
        }
    }
}

/// One output row: the varying parameters of a combination and its averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    #[serde(flatten)]
    pub parameters: Combination,
    pub n_replications: usize,
    /// Mean over the runs that have one; `None` if no run does.
    pub objective: Option<f64>,
    pub gap: Option<f64>,
    pub build_time: f64,
    pub solve_time: f64,
    pub total_time: f64,
    /// Run statuses in replication order, comma separated.
    pub status_summary: String,
    pub apron_floor: f64,
    pub total_passengers: f64,
    pub objective_per_passenger: f64,
}

/// Running sums over any number of runs. Objective and gap are averaged
/// over the runs that define them, everything else over all runs.
///
/// Pushing and merging commute, so partial accumulators built on different
/// workers can be combined in any order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    runs: usize,
    objective: (f64, usize),
    gap: (f64, usize),
    build_time: f64,
    solve_time: f64,
    total_time: f64,
    apron_floor: f64,
    total_passengers: f64,
    objective_per_passenger: f64,
    statuses: Vec<(usize, SolveStatus)>,
}

impl Accumulator {

    pub fn push(&mut self, run: &RunRecord) {
        self.runs += 1;
        if let Some(obj) = run.objective {
            self.objective.0 += obj;
            self.objective.1 += 1;
        }
        if let Some(gap) = run.gap {
            self.gap.0 += gap;
            self.gap.1 += 1;
        }
        self.build_time += run.build_time;
        self.solve_time += run.solve_time;
        self.total_time += run.total_time;
        self.apron_floor += run.apron_floor as f64;
        self.total_passengers += run.total_passengers as f64;
        self.objective_per_passenger += run.objective_per_passenger;
        self.statuses.push((run.replication, run.status));
    }

    pub fn merge(mut self, other: Accumulator) -> Accumulator {
        self.runs += other.runs;
        self.objective = (self.objective.0 + other.objective.0, self.objective.1 + other.objective.1);
        self.gap = (self.gap.0 + other.gap.0, self.gap.1 + other.gap.1);
        self.build_time += other.build_time;
        self.solve_time += other.solve_time;
        self.total_time += other.total_time;
        self.apron_floor += other.apron_floor;
        self.total_passengers += other.total_passengers;
        self.objective_per_passenger += other.objective_per_passenger;
        self.statuses.extend(other.statuses);
        self
    }

    pub fn finish(mut self, parameters: Combination) -> AggregateRow {
        let mean = |(sum, count): (f64, usize)| if count > 0 { Some(sum / count as f64) } else { None };
        let n = self.runs.max(1) as f64;
        self.statuses.sort_by_key(|&(rep, _)| rep);

        AggregateRow {
            parameters,
            n_replications: self.runs,
            objective: mean(self.objective),
            gap: mean(self.gap),
            build_time: self.build_time / n,
            solve_time: self.solve_time / n,
            total_time: self.total_time / n,
            status_summary: self.statuses.iter().map(|(_, s)| s.to_string()).collect::<Vec<String>>().join(","),
            apron_floor: self.apron_floor / n,
            total_passengers: self.total_passengers / n,
            objective_per_passenger: self.objective_per_passenger / n,
        }
    }

}

impl<'a> FromIterator<&'a RunRecord> for Accumulator {
    fn from_iter<I: IntoIterator<Item = &'a RunRecord>>(iter: I) -> Self {
        let mut acc = Accumulator::default();
        iter.into_iter().for_each(|run| acc.push(run));
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(replication: usize, status: SolveStatus, objective: Option<f64>, solve_time: f64) -> RunRecord {
        RunRecord {
            replication,
            status,
            objective,
            gap: objective.map(|_| 0.0),
            build_time: 0.5,
            solve_time,
            total_time: 0.5 + solve_time,
            apron_floor: 2,
            total_passengers: 100,
            objective_per_passenger: objective.map_or(0.0, |o| o / 100.0),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn one_run_averages_to_itself() {
        let r = run(0, SolveStatus::Optimal, Some(420.0), 1.5);
        let row = Accumulator::from_iter([&r]).finish(Combination::new());
        assert_eq!(row.n_replications, 1);
        assert_eq!(row.objective, Some(420.0));
        assert_eq!(row.gap, Some(0.0));
        assert_eq!(row.build_time, 0.5);
        assert_eq!(row.solve_time, 1.5);
        assert_eq!(row.total_time, 2.0);
        assert_eq!(row.apron_floor, 2.0);
        assert_eq!(row.total_passengers, 100.0);
        assert_eq!(row.objective_per_passenger, 4.2);
        assert_eq!(row.status_summary, "optimal");
    }

    #[test]
    fn runs_without_objective_only_count_for_timing() {
        let runs = [
            run(0, SolveStatus::Optimal, Some(100.0), 1.0),
            run(1, SolveStatus::Infeasible, None, 3.0),
            run(2, SolveStatus::TimeLimit, Some(200.0), 5.0),
        ];
        let row = runs.iter().collect::<Accumulator>().finish(Combination::new());
        assert_eq!(row.objective, Some(150.0));
        assert_eq!(row.solve_time, 3.0);
        assert!(close(row.objective_per_passenger, 1.0));
        assert_eq!(row.status_summary, "optimal,infeasible,time-limit");
    }

    #[test]
    fn no_objective_at_all_stays_undefined() {
        let runs = [run(0, SolveStatus::Error, None, 1.0), run(1, SolveStatus::Infeasible, None, 1.0)];
        let row = runs.iter().collect::<Accumulator>().finish(Combination::new());
        assert_eq!(row.objective, None);
        assert_eq!(row.gap, None);
        assert_eq!(row.total_time, 1.5);
        assert_eq!(row.n_replications, 2);
    }

    #[test]
    fn merging_equals_the_weighted_combination() {
        let first = [run(0, SolveStatus::Optimal, Some(10.0), 1.0), run(1, SolveStatus::Optimal, Some(20.0), 2.0)];
        let second = [run(2, SolveStatus::Optimal, Some(60.0), 6.0)];

        let a = first.iter().collect::<Accumulator>();
        let b = second.iter().collect::<Accumulator>();
        let row_a = a.clone().finish(Combination::new());
        let row_b = b.clone().finish(Combination::new());

        let merged = b.merge(a).finish(Combination::new());
        let all = first.iter().chain(second.iter()).collect::<Accumulator>().finish(Combination::new());

        let weighted = (2.0 * row_a.objective.unwrap() + row_b.objective.unwrap()) / 3.0;
        assert!(close(merged.objective.unwrap(), weighted));
        assert!(close(merged.solve_time, (2.0 * row_a.solve_time + row_b.solve_time) / 3.0));
        assert!(close(merged.objective.unwrap(), all.objective.unwrap()));
        assert_eq!(merged.status_summary, all.status_summary);
        assert_eq!(merged.n_replications, 3);
    }
}
