//! MIP solver interface
//!
//! The model is handed over as a [`MipProblem`]; the answer comes back as a
//! [`SolverOutput`] holding a status and, when optimal, a value for every
//! declared variable.

use crate::error::{NetDesignError, Result};
use crate::optimize::constraint::{ConstraintTag, LinearConstraint};
use crate::optimize::model::MipProblem;

use good_lp::{Expression, ResolutionError, Solution, SolverModel, Variable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

/// Status of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// An optimal assignment was found
    Optimal,
    /// Constraints cannot hold together
    Infeasible,
    /// Objective is not bounded
    Unbounded,
    /// The solver stopped without a usable answer
    NotSolved,
}

/// MIP backend used by [`GoodLpSolver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Pure Rust branch and bound
    #[default]
    Microlp,
    /// HiGHS, requires the `highs` feature
    Highs,
}

/// Raw solver answer
#[derive(Debug, Clone)]
pub struct SolverOutput {
    pub status: SolveStatus,
    /// Objective at the returned point, only when optimal
    pub objective: Option<f64>,
    /// Constraint found unsatisfiable without calling the backend
    pub constraint: Option<ConstraintTag>,
    values: HashMap<Variable, f64>,
}

impl SolverOutput {
    pub fn optimal(objective: f64, values: HashMap<Variable, f64>) -> Self {
        Self {
            status: SolveStatus::Optimal,
            objective: Some(objective),
            constraint: None,
            values,
        }
    }

    pub fn with_status(status: SolveStatus) -> Self {
        Self {
            status,
            objective: None,
            constraint: None,
            values: HashMap::new(),
        }
    }

    /// Infeasible because `constraint` cannot hold
    pub fn violated(constraint: ConstraintTag) -> Self {
        Self {
            constraint: Some(constraint),
            ..Self::with_status(SolveStatus::Infeasible)
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    pub fn value(&self, var: Variable) -> Option<f64> {
        self.values.get(&var).copied()
    }
}

/// Solves an assembled model. One blocking call, no retries.
pub trait MipSolver: Send + Sync {
    fn solve(&self, problem: MipProblem) -> Result<SolverOutput>;
}

/// [`MipSolver`] backed by `good_lp`
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver {
    backend: Backend,
}

impl GoodLpSolver {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

impl MipSolver for GoodLpSolver {
    fn solve(&self, problem: MipProblem) -> Result<SolverOutput> {
        let MipProblem {
            variables,
            objective,
            constraints,
            declared,
        } = problem;

        // rows without terms never reach the backend
        if let Some(c) = constraints.iter().find(|c| c.is_trivially_violated()) {
            log::info!("{} cannot hold, model is infeasible", c);
            return Ok(SolverOutput::violated(c.tag.clone()));
        }
        let rows: Vec<good_lp::Constraint> = constraints
            .iter()
            .filter(|c| !c.terms.is_empty())
            .map(LinearConstraint::to_good_lp)
            .collect();

        if declared.is_empty() {
            return Ok(SolverOutput::optimal(0.0, HashMap::new()));
        }

        log::debug!(
            "solving with {}: {} variables, {} constraints",
            self.backend,
            declared.len(),
            rows.len()
        );

        let unsolved = variables.minimise(objective.clone());
        match self.backend {
            Backend::Microlp => Ok(finish(
                unsolved.using(good_lp::microlp),
                rows,
                &declared,
                objective,
            )),
            Backend::Highs => solve_highs(unsolved, rows, &declared, objective),
        }
    }
}

#[cfg(feature = "highs")]
fn solve_highs(
    unsolved: good_lp::variable::UnsolvedProblem,
    rows: Vec<good_lp::Constraint>,
    declared: &[Variable],
    objective: Expression,
) -> Result<SolverOutput> {
    let model = unsolved.using(good_lp::highs).set_verbose(false);
    Ok(finish(model, rows, declared, objective))
}

#[cfg(not(feature = "highs"))]
fn solve_highs(
    _unsolved: good_lp::variable::UnsolvedProblem,
    _rows: Vec<good_lp::Constraint>,
    _declared: &[Variable],
    _objective: Expression,
) -> Result<SolverOutput> {
    Err(NetDesignError::Solver(
        "the highs backend requires building with the `highs` feature".to_string(),
    ))
}

fn finish<M>(model: M, rows: Vec<good_lp::Constraint>, declared: &[Variable], objective: Expression) -> SolverOutput
where
    M: SolverModel<Error = ResolutionError>,
{
    let model = rows.into_iter().fold(model, |m, row| m.with(row));
    match model.solve() {
        Ok(solution) => {
            let values = declared
                .iter()
                .map(|&var| (var, solution.value(var)))
                .collect();
            SolverOutput::optimal(solution.eval(objective), values)
        }
        Err(ResolutionError::Infeasible) => SolverOutput::with_status(SolveStatus::Infeasible),
        Err(ResolutionError::Unbounded) => SolverOutput::with_status(SolveStatus::Unbounded),
        Err(e) => {
            log::warn!("solver stopped without a solution: {}", e);
            SolverOutput::with_status(SolveStatus::NotSolved)
        }
    }
}
