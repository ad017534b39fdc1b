//! Immutable input tables: warehouses, regions and the shifts linking them.

use crate::error::{NetDesignError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Candidate warehouse site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,
    pub fixed_cost: f64,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}

/// Customer region with unit demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}

/// Eligible warehouse -> region link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub warehouse_id: String,
    pub region_id: String,
    pub transportation_cost: f64,
}

impl Warehouse {
    pub fn new(id: &str, fixed_cost: f64, city: &str, lat: f64, lon: f64) -> Self {
        Self {
            id: id.to_string(),
            fixed_cost,
            city: city.to_string(),
            lat,
            lon,
        }
    }
}

impl Region {
    pub fn new(id: &str, city: &str, lat: f64, lon: f64) -> Self {
        Self {
            id: id.to_string(),
            city: city.to_string(),
            lat,
            lon,
        }
    }
}

impl Shift {
    pub fn new(warehouse_id: &str, region_id: &str, transportation_cost: f64) -> Self {
        Self {
            warehouse_id: warehouse_id.to_string(),
            region_id: region_id.to_string(),
            transportation_cost,
        }
    }

    fn describe(&self) -> String {
        format!("shift ({}, {})", self.warehouse_id, self.region_id)
    }
}

/// The three input tables, validated once and read-only afterwards.
///
/// Shifts are not checked against the other two tables here; the model
/// builder reports unknown ids so that every construction path gets the
/// same check.
#[derive(Debug, Clone, Default)]
pub struct NetworkData {
    warehouses: Vec<Warehouse>,
    regions: Vec<Region>,
    shifts: Vec<Shift>,
    warehouse_index: HashMap<String, usize>,
    region_index: HashMap<String, usize>,
}

impl NetworkData {
    /// Builds the tables, rejecting duplicate keys and negative or non-finite costs
    pub fn new(warehouses: Vec<Warehouse>, regions: Vec<Region>, shifts: Vec<Shift>) -> Result<Self> {
        let mut warehouse_index = HashMap::with_capacity(warehouses.len());
        for (i, w) in warehouses.iter().enumerate() {
            check_cost("warehouse", &w.id, w.fixed_cost)?;
            if warehouse_index.insert(w.id.clone(), i).is_some() {
                return Err(NetDesignError::DuplicateKey {
                    table: "warehouse",
                    key: w.id.clone(),
                });
            }
        }

        let mut region_index = HashMap::with_capacity(regions.len());
        for (i, r) in regions.iter().enumerate() {
            if region_index.insert(r.id.clone(), i).is_some() {
                return Err(NetDesignError::DuplicateKey {
                    table: "region",
                    key: r.id.clone(),
                });
            }
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(shifts.len());
        for s in &shifts {
            check_cost("shift", &s.describe(), s.transportation_cost)?;
            if !seen.insert((s.warehouse_id.as_str(), s.region_id.as_str())) {
                return Err(NetDesignError::DuplicateKey {
                    table: "shift",
                    key: format!("({}, {})", s.warehouse_id, s.region_id),
                });
            }
        }

        log::debug!(
            "network data: {} warehouses, {} regions, {} shifts",
            warehouses.len(),
            regions.len(),
            shifts.len()
        );

        Ok(Self {
            warehouses,
            regions,
            shifts,
            warehouse_index,
            region_index,
        })
    }

    pub fn warehouses(&self) -> &[Warehouse] {
        &self.warehouses
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    pub fn warehouse(&self, id: &str) -> Option<&Warehouse> {
        self.warehouse_index.get(id).map(|&i| &self.warehouses[i])
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.region_index.get(id).map(|&i| &self.regions[i])
    }

    /// Transportation cost of the (warehouse, region) link, if eligible
    pub fn shift_cost(&self, warehouse_id: &str, region_id: &str) -> Option<f64> {
        self.shifts
            .iter()
            .find(|s| s.warehouse_id == warehouse_id && s.region_id == region_id)
            .map(|s| s.transportation_cost)
    }

    /// Regions that have no eligible warehouse at all
    pub fn unreachable_regions(&self) -> Vec<&Region> {
        let linked: HashSet<&str> = self.shifts.iter().map(|s| s.region_id.as_str()).collect();
        self.regions
            .iter()
            .filter(|r| !linked.contains(r.id.as_str()))
            .collect()
    }
}

fn check_cost(table: &'static str, key: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(NetDesignError::InvalidCost {
            table,
            key: key.to_string(),
            value,
        });
    }
    Ok(())
}
