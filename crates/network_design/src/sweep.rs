//! Sensitivity sweep over the number of open warehouses
//!
//! Each bound gets a fresh model and an independent solve. Entries are kept
//! in bound order whether the sweep ran sequentially or on the rayon pool.

use crate::data::NetworkData;
use crate::error::{NetDesignError, Result};
use crate::optimize::constraint::ConstraintTag;
use crate::optimize::extract::{CostSummary, SolveResult};
use crate::optimize::policy::{SolvePolicy, WarehouseCount};
use crate::optimize::solver::{MipSolver, SolveStatus};
use crate::optimize::{SolveOptions, solve_network_with};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    Solved(SolveResult),
    /// Infeasible or otherwise without an optimal solution
    NotOptimal {
        status: SolveStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        constraint: Option<ConstraintTag>,
    },
}

/// Result for a single bound
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepEntry {
    pub n_warehouses: usize,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

impl SweepEntry {
    pub fn status(&self) -> SolveStatus {
        match &self.outcome {
            SweepOutcome::Solved(result) => result.status,
            SweepOutcome::NotOptimal { status, .. } => *status,
        }
    }

    pub fn result(&self) -> Option<&SolveResult> {
        match &self.outcome {
            SweepOutcome::Solved(result) => Some(result),
            SweepOutcome::NotOptimal { .. } => None,
        }
    }

    pub fn costs(&self) -> Option<CostSummary> {
        self.result().map(|r| r.costs)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub created_at: DateTime<Utc>,
    pub force_open: Vec<String>,
    entries: Vec<SweepEntry>,
}

impl SweepReport {
    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn get(&self, n_warehouses: usize) -> Option<&SweepEntry> {
        self.entries.iter().find(|e| e.n_warehouses == n_warehouses)
    }

    /// Entry with the lowest total cost; the smallest bound wins ties
    pub fn best(&self) -> Option<&SweepEntry> {
        self.entries
            .iter()
            .filter_map(|e| e.costs().map(|c| (e, c.total)))
            .fold(None, |best: Option<(&SweepEntry, f64)>, (e, total)| match best {
                Some((_, best_total)) if best_total <= total => best,
                _ => Some((e, total)),
            })
            .map(|(e, _)| e)
    }

    /// (bound, costs) for every solved bound
    pub fn cost_series(&self) -> Vec<(usize, CostSummary)> {
        self.entries
            .iter()
            .filter_map(|e| e.costs().map(|c| (e.n_warehouses, c)))
            .collect()
    }

    pub fn feasible_bounds(&self) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|e| e.result().is_some())
            .map(|e| e.n_warehouses)
            .collect()
    }
}

pub struct SweepRunner<'a, S: MipSolver> {
    data: &'a NetworkData,
    solver: &'a S,
    options: SolveOptions,
    force_open: BTreeSet<String>,
    parallel: bool,
}

impl<'a, S: MipSolver> SweepRunner<'a, S> {
    pub fn new(data: &'a NetworkData, solver: &'a S, options: SolveOptions) -> Self {
        Self {
            data,
            solver,
            options,
            force_open: BTreeSet::new(),
            parallel: false,
        }
    }

    pub fn with_force_open<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.force_open = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Bounds from `min` to `max` inclusive. Missing ends default to the
    /// smallest count that can serve every region (`max(|force_open|, 1)`,
    /// or 0 without regions) and the number of warehouses.
    ///
    /// # Errors
    /// `Config` if the resolved range is empty
    pub fn bounds(&self, min: Option<usize>, max: Option<usize>) -> Result<Vec<usize>> {
        let lowest = if self.data.regions().is_empty() {
            0
        } else {
            self.force_open.len().max(1)
        };
        let min = min.unwrap_or(lowest);
        let max = max.unwrap_or(self.data.warehouses().len());
        if min > max {
            return Err(NetDesignError::Config(format!(
                "sweep range is empty: min {} is above max {} ({} warehouses)",
                min,
                max,
                self.data.warehouses().len()
            )));
        }
        Ok((min..=max).collect())
    }

    pub fn default_bounds(&self) -> Result<Vec<usize>> {
        self.bounds(None, None)
    }

    /// Solves every bound in order.
    ///
    /// # Errors
    /// - `Config` if `bounds` is not strictly increasing (nothing is solved)
    /// - `SweepBound` wrapping any data-integrity or consistency error
    pub fn run(&self, bounds: &[usize]) -> Result<SweepReport> {
        if let Some((a, b)) = bounds.iter().tuple_windows().find(|(a, b)| b <= a) {
            return Err(NetDesignError::Config(format!(
                "sweep bounds must be strictly increasing, got {} then {}",
                a, b
            )));
        }

        log::info!(
            "sweep over {} bounds [{}], parallel={}",
            bounds.len(),
            bounds.iter().join(", "),
            self.parallel
        );

        let entries: Vec<SweepEntry> = if self.parallel {
            bounds
                .par_iter()
                .map(|&bound| self.solve_bound(bound))
                .collect::<Vec<_>>()
                .into_iter()
                .collect::<Result<_>>()?
        } else {
            bounds
                .iter()
                .map(|&bound| self.solve_bound(bound))
                .collect::<Result<_>>()?
        };

        let report = SweepReport {
            created_at: Utc::now(),
            force_open: self.force_open.iter().cloned().collect(),
            entries,
        };
        match report.best() {
            Some(best) => log::info!(
                "best bound n_warehouses={} (total={:.2})",
                best.n_warehouses,
                best.costs().map_or(f64::NAN, |c| c.total)
            ),
            None => log::warn!("no bound in the sweep was feasible"),
        }
        Ok(report)
    }

    fn solve_bound(&self, bound: usize) -> Result<SweepEntry> {
        let policy = SolvePolicy {
            n_warehouses: WarehouseCount::Exactly(bound),
            force_open: self.force_open.clone(),
        };
        let outcome = match solve_network_with(self.data, &policy, &self.options, self.solver) {
            Ok(result) => SweepOutcome::Solved(result),
            Err(NetDesignError::NoFeasibleSolution {
                status, constraint, ..
            }) => {
                log::info!("n_warehouses={}: recorded as {}", bound, status);
                SweepOutcome::NotOptimal { status, constraint }
            }
            Err(e) => {
                return Err(NetDesignError::SweepBound {
                    bound,
                    source: Box::new(e),
                });
            }
        };
        Ok(SweepEntry {
            n_warehouses: bound,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;
    use crate::optimize::solver::GoodLpSolver;

    fn totals(report: &SweepReport) -> Vec<(usize, f64)> {
        report
            .cost_series()
            .into_iter()
            .map(|(n, c)| (n, (c.total * 1e6).round() / 1e6))
            .collect()
    }

    #[test]
    fn test_cost_falls_with_more_warehouses() {
        let data = fixtures::three_clusters();
        let solver = GoodLpSolver::default();
        let runner = SweepRunner::new(&data, &solver, SolveOptions::default());
        let report = runner.run(&runner.default_bounds().unwrap()).unwrap();

        assert_eq!(totals(&report), vec![(1, 211.0), (2, 122.0), (3, 33.0)]);
        for (prev, next) in report.cost_series().iter().tuple_windows() {
            assert!(next.1.total <= prev.1.total + 1e-6);
        }
        let best = report.best().unwrap();
        assert_eq!(best.n_warehouses, 3);
        assert_eq!(report.feasible_bounds(), vec![1, 2, 3]);
    }

    #[test]
    fn test_best_matches_unconstrained_solve() {
        let data = fixtures::two_competing();
        let solver = GoodLpSolver::default();
        let options = SolveOptions::default();
        let report = SweepRunner::new(&data, &solver, options)
            .run(&[1, 2])
            .unwrap();
        let free = crate::optimize::solve_network(&data, &SolvePolicy::unconstrained(), &options).unwrap();

        let best = report.best().unwrap();
        assert_eq!(best.n_warehouses, 1);
        assert!((best.costs().unwrap().total - free.costs.total).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_bounds_are_recorded() {
        let data = fixtures::three_clusters();
        let solver = GoodLpSolver::default();
        let runner = SweepRunner::new(&data, &solver, SolveOptions::default()).with_force_open(["W1", "W2"]);
        let report = runner.run(&[0, 1, 2, 3]).unwrap();

        assert_eq!(report.entries().len(), 4);
        assert_eq!(report.get(0).unwrap().status(), SolveStatus::Infeasible);
        assert_eq!(report.get(1).unwrap().status(), SolveStatus::Infeasible);
        assert!(report.get(1).unwrap().costs().is_none());
        assert_eq!(report.feasible_bounds(), vec![2, 3]);
        assert_eq!(report.force_open, vec!["W1".to_string(), "W2".to_string()]);
    }

    #[test]
    fn test_rejects_non_increasing_bounds() {
        let data = fixtures::three_clusters();
        let solver = GoodLpSolver::default();
        let runner = SweepRunner::new(&data, &solver, SolveOptions::default());
        assert!(matches!(runner.run(&[1, 3, 2]), Err(NetDesignError::Config(_))));
        assert!(matches!(runner.run(&[2, 2]), Err(NetDesignError::Config(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = fixtures::three_clusters();
        let solver = GoodLpSolver::default();
        let sequential = SweepRunner::new(&data, &solver, SolveOptions::default())
            .run(&[0, 1, 2, 3])
            .unwrap();
        let parallel = SweepRunner::new(&data, &solver, SolveOptions::default())
            .parallel(true)
            .run(&[0, 1, 2, 3])
            .unwrap();

        let bounds = |r: &SweepReport| r.entries().iter().map(|e| e.n_warehouses).collect::<Vec<_>>();
        assert_eq!(bounds(&sequential), bounds(&parallel));
        assert_eq!(totals(&sequential), totals(&parallel));
        assert_eq!(sequential.feasible_bounds(), parallel.feasible_bounds());
    }

    #[test]
    fn test_data_error_aborts_with_bound() {
        let data = fixtures::three_clusters();
        let solver = GoodLpSolver::default();
        let runner = SweepRunner::new(&data, &solver, SolveOptions::default()).with_force_open(["W7"]);
        let err = runner.run(&[1, 2]).unwrap_err();
        assert!(err.is_data_integrity());
        assert!(matches!(err, NetDesignError::SweepBound { bound: 1, .. }));
    }

    #[test]
    fn test_default_bounds() {
        let data = fixtures::three_clusters();
        let solver = GoodLpSolver::default();
        let runner = SweepRunner::new(&data, &solver, SolveOptions::default());
        assert_eq!(runner.default_bounds().unwrap(), vec![1, 2, 3]);
        assert_eq!(runner.bounds(Some(2), None).unwrap(), vec![2, 3]);

        let runner = runner.with_force_open(["W1", "W2"]);
        assert_eq!(runner.default_bounds().unwrap(), vec![2, 3]);

        let empty = NetworkData::default();
        let runner = SweepRunner::new(&empty, &solver, SolveOptions::default());
        assert_eq!(runner.default_bounds().unwrap(), vec![0]);
    }

    #[test]
    fn test_empty_range_rejected() {
        let data = fixtures::three_clusters();
        let solver = GoodLpSolver::default();
        let runner = SweepRunner::new(&data, &solver, SolveOptions::default());
        assert!(matches!(runner.bounds(Some(9), None), Err(NetDesignError::Config(_))));
        assert!(matches!(runner.bounds(Some(3), Some(2)), Err(NetDesignError::Config(_))));
        assert_eq!(runner.bounds(Some(3), Some(5)).unwrap(), vec![3, 4, 5]);
    }

    #[test]
    fn test_bounds_past_warehouse_count_are_recorded() {
        let data = fixtures::three_clusters();
        let solver = GoodLpSolver::default();
        let runner = SweepRunner::new(&data, &solver, SolveOptions::default());
        let report = runner.run(&runner.bounds(Some(2), Some(5)).unwrap()).unwrap();

        assert_eq!(report.entries().len(), 4);
        assert_eq!(report.feasible_bounds(), vec![2, 3]);
        for n in [4, 5] {
            let entry = report.get(n).unwrap();
            assert_eq!(entry.status(), SolveStatus::Infeasible);
            assert!(entry.costs().is_none());
        }
        assert_eq!(report.best().unwrap().n_warehouses, 3);
    }

    #[test]
    fn test_unlinked_region_recorded_with_constraint() {
        use crate::data::{Region, Shift, Warehouse};
        use crate::optimize::constraint::ConstraintKind;

        let data = NetworkData::new(
            vec![Warehouse::new("W1", 5.0, "a", 0.0, 0.0)],
            vec![Region::new("R1", "b", 0.0, 0.0), Region::new("R2", "c", 0.0, 0.0)],
            vec![Shift::new("W1", "R1", 1.0)],
        )
        .unwrap();
        let solver = GoodLpSolver::default();
        let report = SweepRunner::new(&data, &solver, SolveOptions::default())
            .run(&[1])
            .unwrap();
        match &report.entries()[0].outcome {
            SweepOutcome::NotOptimal {
                status,
                constraint: Some(tag),
            } => {
                assert_eq!(*status, SolveStatus::Infeasible);
                assert_eq!(*tag, ConstraintTag::new(ConstraintKind::Coverage, "R2"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_ties_pick_smallest_bound() {
        let solved = |n: usize, total: f64| SweepEntry {
            n_warehouses: n,
            outcome: SweepOutcome::Solved(SolveResult {
                status: SolveStatus::Optimal,
                costs: CostSummary::new(total, 0.0),
                objective: total,
                warehouses: vec![],
                regions: vec![],
            }),
        };
        let report = SweepReport {
            created_at: Utc::now(),
            force_open: vec![],
            entries: vec![
                solved(1, 30.0),
                solved(2, 20.0),
                solved(3, 20.0),
                SweepEntry {
                    n_warehouses: 4,
                    outcome: SweepOutcome::NotOptimal {
                        status: SolveStatus::NotSolved,
                        constraint: None,
                    },
                },
            ],
        };
        assert_eq!(report.best().unwrap().n_warehouses, 2);
    }
}
