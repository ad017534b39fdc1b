pub mod constraint;
pub mod extract;
pub mod model;
pub mod policy;
pub mod solver;

use crate::constants::{DEFAULT_OBJECTIVE_TOLERANCE, DEFAULT_SOLUTION_THRESHOLD};
use crate::data::NetworkData;
use crate::error::Result;

use extract::{SolveResult, extract_result};
use model::NetworkModel;
use policy::{SolvePolicy, apply_policy};
use solver::{Backend, GoodLpSolver, MipSolver};

/// Solver settings shared by every solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
    pub backend: Backend,
    /// Values strictly above this count as set
    pub solution_threshold: f64,
    pub objective_tolerance: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            solution_threshold: DEFAULT_SOLUTION_THRESHOLD,
            objective_tolerance: DEFAULT_OBJECTIVE_TOLERANCE,
        }
    }
}

/// Builds, constrains, solves and extracts one configuration with the
/// backend named in `options`.
pub fn solve_network(data: &NetworkData, policy: &SolvePolicy, options: &SolveOptions) -> Result<SolveResult> {
    let solver = GoodLpSolver::new(options.backend);
    solve_network_with(data, policy, options, &solver)
}

pub fn solve_network_with<S: MipSolver + ?Sized>(
    data: &NetworkData,
    policy: &SolvePolicy,
    options: &SolveOptions,
    solver: &S,
) -> Result<SolveResult> {
    let mut model = NetworkModel::build(data)?;
    apply_policy(&mut model, data, policy)?;
    log::debug!(
        "model built: {} variables, {} constraints",
        model.num_variables(),
        model.constraints().len()
    );

    let (problem, index) = model.into_problem();
    let output = solver.solve(problem)?;
    if !output.is_optimal() {
        log::info!("n_warehouses={}: solver status {}", policy.n_warehouses, output.status);
    }

    let result = extract_result(data, &index, &output, policy, options)?;
    log::info!(
        "n_warehouses={}: open={}, fixed={:.2}, variable={:.2}, total={:.2}",
        policy.n_warehouses,
        result.open_count(),
        result.costs.fixed,
        result.costs.variable,
        result.costs.total
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Region, Shift, Warehouse, fixtures};
    use crate::error::NetDesignError;
    use crate::optimize::constraint::{ConstraintKind, ConstraintTag};
    use crate::optimize::policy::WarehouseCount;
    use crate::optimize::solver::SolveStatus;

    fn assert_cost(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "expected {}, got {}", expected, actual);
    }

    fn assert_every_region_served_by_open(result: &SolveResult) {
        for region in &result.regions {
            assert!(result.is_open(&region.warehouse_id), "region {} served by closed warehouse", region.id);
        }
    }

    #[test]
    fn test_single_link() {
        let data = fixtures::single_link();
        let result = solve_network(&data, &SolvePolicy::unconstrained(), &SolveOptions::default()).unwrap();
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_cost(result.costs.total, 150.0);
        assert_cost(result.costs.fixed, 50.0);
        assert_cost(result.costs.variable, 100.0);
        assert!(result.is_open("W1"));
        assert_eq!(result.assignment("R1"), Some("W1"));
    }

    #[test]
    fn test_cheaper_total_wins() {
        let data = fixtures::two_competing();
        let result = solve_network(&data, &SolvePolicy::unconstrained(), &SolveOptions::default()).unwrap();
        assert_cost(result.costs.total, 150.0);
        assert!(result.is_open("A"));
        assert!(!result.is_open("B"));
    }

    #[test]
    fn test_forcing_dominated_warehouse() {
        let data = fixtures::two_competing();
        let options = SolveOptions::default();
        let free = solve_network(&data, &SolvePolicy::unconstrained(), &options).unwrap();
        let forced = solve_network(&data, &SolvePolicy::unconstrained().with_force_open(["B"]), &options).unwrap();

        assert!(forced.is_open("B"));
        assert!(forced.costs.total >= free.costs.total - 1e-6);
        // B open anyway, serving from B is cheaper than opening A as well
        assert_cost(forced.costs.total, 210.0);
        assert_every_region_served_by_open(&forced);
    }

    #[test]
    fn test_unlinked_region_is_infeasible() {
        let data = NetworkData::new(
            vec![Warehouse::new("W1", 50.0, "a", 0.0, 0.0)],
            vec![Region::new("R1", "b", 0.0, 0.0), Region::new("R2", "c", 0.0, 0.0)],
            vec![Shift::new("W1", "R1", 100.0)],
        )
        .unwrap();
        let err = solve_network(&data, &SolvePolicy::unconstrained(), &SolveOptions::default()).unwrap_err();
        assert!(err.is_infeasible());
        assert!(err.to_string().contains("coverage[R2]"), "{}", err);
        match err {
            NetDesignError::NoFeasibleSolution {
                status,
                n_warehouses,
                constraint: Some(tag),
            } => {
                assert_eq!(status, SolveStatus::Infeasible);
                assert_eq!(n_warehouses, WarehouseCount::Unconstrained);
                assert_eq!(tag, ConstraintTag::new(ConstraintKind::Coverage, "R2"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_exact_count() {
        let data = fixtures::three_clusters();
        let options = SolveOptions::default();
        for (k, expected) in [(1, 211.0), (2, 122.0), (3, 33.0)] {
            let policy = SolvePolicy::unconstrained().with_count(WarehouseCount::Exactly(k));
            let result = solve_network(&data, &policy, &options).unwrap();
            assert_eq!(result.open_count(), k);
            assert_cost(result.costs.total, expected);
            assert_every_region_served_by_open(&result);
        }
    }

    #[test]
    fn test_force_open_pair_and_count() {
        let data = fixtures::three_clusters();
        let policy = SolvePolicy::unconstrained()
            .with_count(WarehouseCount::Exactly(2))
            .with_force_open(["W1", "W3"]);
        let result = solve_network(&data, &policy, &SolveOptions::default()).unwrap();
        assert!(result.is_open("W1"));
        assert!(result.is_open("W3"));
        assert!(!result.is_open("W2"));
        assert_cost(result.costs.total, 122.0);
    }

    #[test]
    fn test_more_forced_than_bound() {
        let data = fixtures::three_clusters();
        let policy = SolvePolicy::unconstrained()
            .with_count(WarehouseCount::Exactly(2))
            .with_force_open(["W1", "W2", "W3"]);
        let err = solve_network(&data, &policy, &SolveOptions::default()).unwrap_err();
        assert!(err.is_infeasible());
    }

    #[test]
    fn test_bound_above_warehouse_count_is_infeasible() {
        let data = fixtures::three_clusters();
        let policy = SolvePolicy::unconstrained().with_count(WarehouseCount::Exactly(4));
        let err = solve_network(&data, &policy, &SolveOptions::default()).unwrap_err();
        assert!(err.is_infeasible());
        assert!(err.to_string().contains("n_warehouses = 4"), "{}", err);
    }

    #[test]
    fn test_zero_bound_with_regions_is_infeasible() {
        let data = fixtures::single_link();
        let policy = SolvePolicy::unconstrained().with_count(WarehouseCount::Exactly(0));
        let err = solve_network(&data, &policy, &SolveOptions::default()).unwrap_err();
        assert!(err.is_infeasible());
    }

    #[test]
    fn test_empty_network() {
        let data = NetworkData::default();
        let result = solve_network(&data, &SolvePolicy::unconstrained(), &SolveOptions::default()).unwrap();
        assert_eq!(result.costs.total, 0.0);
        assert!(result.warehouses.is_empty());
        assert!(result.regions.is_empty());
    }

    #[test]
    fn test_repeated_solves_agree() {
        let data = fixtures::three_clusters();
        let options = SolveOptions::default();
        let first = solve_network(&data, &SolvePolicy::unconstrained(), &options).unwrap();
        let second = solve_network(&data, &SolvePolicy::unconstrained(), &options).unwrap();
        assert_cost(first.costs.total, second.costs.total);
        assert_cost(first.costs.total, 33.0);
    }

    #[test]
    fn test_unknown_forced_id_fails_before_solving() {
        let data = fixtures::single_link();
        let policy = SolvePolicy::unconstrained().with_force_open(["W9"]);
        let err = solve_network(&data, &policy, &SolveOptions::default()).unwrap_err();
        assert!(err.is_data_integrity());
    }
}
