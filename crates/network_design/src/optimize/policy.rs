//! Structural and business constraints on top of [`NetworkModel`]

use crate::constants::UNCONSTRAINED_SENTINEL;
use crate::data::NetworkData;
use crate::error::{NetDesignError, Result};
use crate::optimize::constraint::{ConstraintKind, ConstraintTag, LinearConstraint};
use crate::optimize::model::{NetworkModel, VariableIndex};

use good_lp::Variable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

/// Bound on the number of open warehouses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseCount {
    #[default]
    Unconstrained,
    Exactly(usize),
}

impl WarehouseCount {
    /// `-1` means unconstrained, `n >= 0` fixes the count
    pub fn from_sentinel(value: i64) -> Result<Self> {
        match value {
            UNCONSTRAINED_SENTINEL => Ok(WarehouseCount::Unconstrained),
            n if n >= 0 => Ok(WarehouseCount::Exactly(n as usize)),
            n => Err(NetDesignError::Config(format!(
                "n_warehouses must be -1 (unconstrained) or >= 0, got {}",
                n
            ))),
        }
    }

    pub fn bound(&self) -> Option<usize> {
        match self {
            WarehouseCount::Unconstrained => None,
            WarehouseCount::Exactly(n) => Some(*n),
        }
    }
}

impl Display for WarehouseCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseCount::Unconstrained => write!(f, "unconstrained"),
            WarehouseCount::Exactly(n) => write!(f, "{}", n),
        }
    }
}

/// Optional business rules for one solve
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolvePolicy {
    pub n_warehouses: WarehouseCount,
    pub force_open: BTreeSet<String>,
}

impl SolvePolicy {
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, n_warehouses: WarehouseCount) -> Self {
        self.n_warehouses = n_warehouses;
        self
    }

    pub fn with_force_open<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.force_open = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Adds all constraints for `policy` to `model`.
///
/// Combinations that cannot hold together (more forced warehouses than the
/// bound allows, a bound above the number of warehouses) are not checked
/// here; the solver reports them as infeasible.
pub fn apply_policy(model: &mut NetworkModel, data: &NetworkData, policy: &SolvePolicy) -> Result<()> {
    let index = model.index();
    let mut constraints = linkage_constraints(index);
    constraints.extend(coverage_constraints(data, index));
    constraints.extend(forced_open_constraints(index, &policy.force_open)?);
    constraints.extend(count_bound_constraint(index, policy.n_warehouses));

    log::debug!(
        "policy n_warehouses={}, force_open={}: {} constraints",
        policy.n_warehouses,
        policy.force_open.len(),
        constraints.len()
    );
    model.add_constraints(constraints);
    Ok(())
}

/// x[w,r] - y[w] <= 0 for every eligible link
pub fn linkage_constraints(index: &VariableIndex) -> Vec<LinearConstraint> {
    index
        .assign_vars()
        .filter_map(|((w, r), x)| {
            let y = index.open_var(w)?;
            Some(LinearConstraint::less_or_equal(
                ConstraintTag::new(ConstraintKind::Linkage, format!("{},{}", w, r)),
                vec![(x, 1.0), (y, -1.0)],
                0.0,
            ))
        })
        .collect()
}

/// Σ_w x[w,r] = 1 for every region, in region table order.
/// Regions without links get an empty sum, which cannot hold.
pub fn coverage_constraints(data: &NetworkData, index: &VariableIndex) -> Vec<LinearConstraint> {
    let mut by_region: HashMap<&str, Vec<Variable>> = HashMap::new();
    for ((_, r), x) in index.assign_vars() {
        by_region.entry(r).or_default().push(x);
    }

    data.regions()
        .iter()
        .map(|region| {
            let terms: Vec<(Variable, f64)> = by_region
                .get(region.id.as_str())
                .map(|xs| xs.iter().map(|&x| (x, 1.0)).collect())
                .unwrap_or_default();
            LinearConstraint::equal(
                ConstraintTag::new(ConstraintKind::Coverage, region.id.clone()),
                terms,
                1.0,
            )
        })
        .collect()
}

/// y[w] = 1 for each forced id
///
/// # Errors
/// Data-integrity error for an id that is not a warehouse
pub fn forced_open_constraints(
    index: &VariableIndex,
    force_open: &BTreeSet<String>,
) -> Result<Vec<LinearConstraint>> {
    force_open
        .iter()
        .map(|id| {
            let y = index
                .open_var(id)
                .ok_or_else(|| NetDesignError::UnknownWarehouse {
                    id: id.clone(),
                    context: "force_open".to_string(),
                })?;
            Ok(LinearConstraint::equal(
                ConstraintTag::new(ConstraintKind::ForcedOpen, id.clone()),
                vec![(y, 1.0)],
                1.0,
            ))
        })
        .collect()
}

/// Σ_w y[w] = n, or nothing when unconstrained
pub fn count_bound_constraint(index: &VariableIndex, count: WarehouseCount) -> Option<LinearConstraint> {
    let n = count.bound()?;
    let terms: Vec<(Variable, f64)> = index.open_vars().map(|(_, y)| (y, 1.0)).collect();
    Some(LinearConstraint::equal(
        ConstraintTag::new(ConstraintKind::CountBound, n.to_string()),
        terms,
        n as f64,
    ))
}
