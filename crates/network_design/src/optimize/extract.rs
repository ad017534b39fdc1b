//! Reads a solved model back into per-warehouse and per-region records

use crate::data::NetworkData;
use crate::error::{NetDesignError, Result};
use crate::optimize::SolveOptions;
use crate::optimize::model::VariableIndex;
use crate::optimize::policy::SolvePolicy;
use crate::optimize::solver::{SolveStatus, SolverOutput};

use good_lp::Variable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cost split of one solution
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostSummary {
    pub fixed: f64,
    pub variable: f64,
    pub total: f64,
}

impl CostSummary {
    pub fn new(fixed: f64, variable: f64) -> Self {
        Self {
            fixed,
            variable,
            total: fixed + variable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseResult {
    #[serde(rename = "warehouseID")]
    pub id: String,
    pub open: bool,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub regions_served: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    #[serde(rename = "regionID")]
    pub id: String,
    #[serde(rename = "warehouseID")]
    pub warehouse_id: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub transportation_cost: f64,
}

/// Outcome of one optimal solve, records in input table order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub costs: CostSummary,
    /// Objective as reported by the solver
    pub objective: f64,
    pub warehouses: Vec<WarehouseResult>,
    pub regions: Vec<RegionResult>,
}

impl SolveResult {
    pub fn open_count(&self) -> usize {
        self.warehouses.iter().filter(|w| w.open).count()
    }

    pub fn open_warehouses(&self) -> impl Iterator<Item = &WarehouseResult> {
        self.warehouses.iter().filter(|w| w.open)
    }

    pub fn is_open(&self, warehouse_id: &str) -> bool {
        self.warehouses
            .iter()
            .any(|w| w.id == warehouse_id && w.open)
    }

    /// Warehouse serving `region_id`
    pub fn assignment(&self, region_id: &str) -> Option<&str> {
        self.regions
            .iter()
            .find(|r| r.id == region_id)
            .map(|r| r.warehouse_id.as_str())
    }
}

/// Turns solver values into a [`SolveResult`].
///
/// # Errors
/// - `NoFeasibleSolution` when the status is not optimal, carrying the bound
///   from `policy` and the violated constraint if the solver named one
/// - `InternalConsistency` when a region is not served by exactly one open
///   warehouse, or the recomputed total disagrees with the solver objective
pub fn extract_result(
    data: &NetworkData,
    index: &VariableIndex,
    output: &SolverOutput,
    policy: &SolvePolicy,
    options: &SolveOptions,
) -> Result<SolveResult> {
    let objective = match (output.status, output.objective) {
        (SolveStatus::Optimal, Some(objective)) => objective,
        (status, _) => {
            return Err(NetDesignError::NoFeasibleSolution {
                status,
                n_warehouses: policy.n_warehouses,
                constraint: output.constraint.clone(),
            });
        }
    };
    let is_set = |var: Variable| -> Result<bool> {
        let value = output.value(var).ok_or_else(|| {
            NetDesignError::InternalConsistency("solver returned no value for a declared variable".to_string())
        })?;
        Ok(value > options.solution_threshold)
    };

    let mut open: HashMap<&str, bool> = HashMap::with_capacity(data.warehouses().len());
    let mut fixed = 0.0;
    for warehouse in data.warehouses() {
        let y = index.open_var(&warehouse.id).ok_or_else(|| {
            NetDesignError::InternalConsistency(format!("no open variable for warehouse {}", warehouse.id))
        })?;
        let is_open = is_set(y)?;
        if is_open {
            fixed += warehouse.fixed_cost;
        }
        open.insert(warehouse.id.as_str(), is_open);
    }

    // region -> [(warehouse, cost)] of the links set in the solution
    let mut chosen: HashMap<&str, Vec<(&str, f64)>> = HashMap::new();
    for shift in data.shifts() {
        let Some(x) = index.assign_var(&shift.warehouse_id, &shift.region_id) else {
            continue;
        };
        if is_set(x)? {
            chosen
                .entry(shift.region_id.as_str())
                .or_default()
                .push((shift.warehouse_id.as_str(), shift.transportation_cost));
        }
    }

    let mut variable = 0.0;
    let mut served: HashMap<&str, Vec<String>> = HashMap::new();
    let mut regions = Vec::with_capacity(data.regions().len());
    for region in data.regions() {
        let links = chosen.get(region.id.as_str()).map(Vec::as_slice).unwrap_or_default();
        let &[(warehouse_id, cost)] = links else {
            return Err(NetDesignError::InternalConsistency(format!(
                "region {} has {} assignments, expected exactly one",
                region.id,
                links.len()
            )));
        };
        if !open.get(warehouse_id).copied().unwrap_or(false) {
            return Err(NetDesignError::InternalConsistency(format!(
                "region {} is assigned to closed warehouse {}",
                region.id, warehouse_id
            )));
        }

        variable += cost;
        served.entry(warehouse_id).or_default().push(region.id.clone());
        regions.push(RegionResult {
            id: region.id.clone(),
            warehouse_id: warehouse_id.to_string(),
            city: region.city.clone(),
            lat: region.lat,
            lon: region.lon,
            transportation_cost: cost,
        });
    }

    let costs = CostSummary::new(fixed, variable);
    let tolerance = options.objective_tolerance * objective.abs().max(1.0);
    if (costs.total - objective).abs() > tolerance {
        return Err(NetDesignError::InternalConsistency(format!(
            "extracted total {} differs from solver objective {}",
            costs.total, objective
        )));
    }

    let warehouses = data
        .warehouses()
        .iter()
        .map(|w| WarehouseResult {
            id: w.id.clone(),
            open: open.get(w.id.as_str()).copied().unwrap_or(false),
            city: w.city.clone(),
            lat: w.lat,
            lon: w.lon,
            regions_served: served.remove(w.id.as_str()).unwrap_or_default(),
        })
        .collect();

    Ok(SolveResult {
        status: output.status,
        costs,
        objective,
        warehouses,
        regions,
    })
}
