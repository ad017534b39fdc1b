//! Decision variables and objective of the warehouse location model
//!
//! - y[w] ∈ {0,1}: warehouse w is open (one per warehouse)
//! - x[w,r] ∈ {0,1}: region r is served by w (one per shift row)
//!
//! min Σ_{(w,r)} c_{wr}·x[w,r] + Σ_w f_w·y[w]

use crate::data::NetworkData;
use crate::error::{NetDesignError, Result};
use crate::optimize::constraint::LinearConstraint;

use good_lp::{Expression, ProblemVariables, Variable, variable};
use std::collections::BTreeMap;

/// Lookup from entity ids to decision variables; fixed once built
#[derive(Debug, Clone, Default)]
pub struct VariableIndex {
    open: BTreeMap<String, Variable>,
    assign: BTreeMap<(String, String), Variable>,
}

impl VariableIndex {
    pub fn open_var(&self, warehouse_id: &str) -> Option<Variable> {
        self.open.get(warehouse_id).copied()
    }

    pub fn assign_var(&self, warehouse_id: &str, region_id: &str) -> Option<Variable> {
        self.assign
            .get(&(warehouse_id.to_string(), region_id.to_string()))
            .copied()
    }

    pub fn open_vars(&self) -> impl Iterator<Item = (&str, Variable)> {
        self.open.iter().map(|(id, &v)| (id.as_str(), v))
    }

    /// ((warehouse, region), x) in key order
    pub fn assign_vars(&self) -> impl Iterator<Item = ((&str, &str), Variable)> {
        self.assign
            .iter()
            .map(|((w, r), &v)| ((w.as_str(), r.as_str()), v))
    }

    pub fn num_open_vars(&self) -> usize {
        self.open.len()
    }

    pub fn num_assign_vars(&self) -> usize {
        self.assign.len()
    }

    /// Every declared variable, y first then x
    pub fn all_vars(&self) -> Vec<Variable> {
        self.open
            .values()
            .chain(self.assign.values())
            .copied()
            .collect()
    }
}

/// A model ready to be handed to a [`MipSolver`](crate::optimize::solver::MipSolver)
pub struct MipProblem {
    pub variables: ProblemVariables,
    pub objective: Expression,
    pub constraints: Vec<LinearConstraint>,
    pub declared: Vec<Variable>,
}

/// Variables, objective and constraints for one solve. Built fresh each time.
pub struct NetworkModel {
    variables: ProblemVariables,
    objective: Expression,
    index: VariableIndex,
    constraints: Vec<LinearConstraint>,
}

impl NetworkModel {
    /// Declares y per warehouse and x per shift, and builds the cost objective.
    ///
    /// # Errors
    /// Data-integrity error if a shift names a warehouse or region missing from the tables
    pub fn build(data: &NetworkData) -> Result<Self> {
        for shift in data.shifts() {
            let context = format!("shift ({}, {})", shift.warehouse_id, shift.region_id);
            if data.warehouse(&shift.warehouse_id).is_none() {
                return Err(NetDesignError::UnknownWarehouse {
                    id: shift.warehouse_id.clone(),
                    context,
                });
            }
            if data.region(&shift.region_id).is_none() {
                return Err(NetDesignError::UnknownRegion {
                    id: shift.region_id.clone(),
                    context,
                });
            }
        }

        let mut variables = ProblemVariables::new();
        let mut objective = Expression::from(0.0);
        let mut index = VariableIndex::default();

        // y[w]: fixed cost term
        for warehouse in data.warehouses() {
            let y = variables.add(variable().binary());
            objective += warehouse.fixed_cost * y;
            index.open.insert(warehouse.id.clone(), y);
        }

        // x[w,r]: transportation cost term, only for eligible links
        for shift in data.shifts() {
            let x = variables.add(variable().binary());
            objective += shift.transportation_cost * x;
            index
                .assign
                .insert((shift.warehouse_id.clone(), shift.region_id.clone()), x);
        }

        log::debug!(
            "model variables: y={}, x={}",
            index.num_open_vars(),
            index.num_assign_vars()
        );

        Ok(Self {
            variables,
            objective,
            index,
            constraints: Vec::new(),
        })
    }

    pub fn index(&self) -> &VariableIndex {
        &self.index
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.index.num_open_vars() + self.index.num_assign_vars()
    }

    pub fn add_constraints<I: IntoIterator<Item = LinearConstraint>>(&mut self, constraints: I) {
        self.constraints.extend(constraints);
    }

    /// Splits into the solver input and the index needed to read the answer back
    pub fn into_problem(self) -> (MipProblem, VariableIndex) {
        let declared = self.index.all_vars();
        let problem = MipProblem {
            variables: self.variables,
            objective: self.objective,
            constraints: self.constraints,
            declared,
        };
        (problem, self.index)
    }
}
