use crate::optimize::constraint::ConstraintTag;
use crate::optimize::policy::WarehouseCount;
use crate::optimize::solver::SolveStatus;
use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetDesignError>;

#[derive(Debug, Error)]
pub enum NetDesignError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid CSV header in {file}: {message}")]
    CsvHeader { file: String, message: String },

    #[error("Invalid CSV row {row} in {file}: expected at least {expected} columns, got {got}")]
    CsvRow {
        file: String,
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Empty value for '{column}' at row {row} in {file}")]
    EmptyField {
        file: String,
        row: usize,
        column: &'static str,
    },

    #[error("Invalid number for '{column}' at row {row} in {file}: {value}")]
    NumberParse {
        file: String,
        row: usize,
        column: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("Duplicate {table} key: {key}")]
    DuplicateKey { table: &'static str, key: String },

    #[error("Invalid {table} cost for {key}: {value}")]
    InvalidCost {
        table: &'static str,
        key: String,
        value: f64,
    },

    #[error("Unknown warehouse '{id}' referenced by {context}")]
    UnknownWarehouse { id: String, context: String },

    #[error("Unknown region '{id}' referenced by {context}")]
    UnknownRegion { id: String, context: String },

    #[error(
        "No feasible solution for n_warehouses = {n_warehouses}: solver status is {status}{}",
        violated_suffix(.constraint)
    )]
    NoFeasibleSolution {
        status: SolveStatus,
        n_warehouses: WarehouseCount,
        /// Constraint known to be unsatisfiable, when the model shows it directly
        constraint: Option<ConstraintTag>,
    },

    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("Sweep failed at n_warehouses = {bound}")]
    SweepBound {
        bound: usize,
        #[source]
        source: Box<NetDesignError>,
    },

    #[error("Optimization solver error: {0}")]
    Solver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetDesignError {
    /// True for errors caused by inconsistent input tables or policy ids.
    pub fn is_data_integrity(&self) -> bool {
        match self {
            NetDesignError::DuplicateKey { .. }
            | NetDesignError::InvalidCost { .. }
            | NetDesignError::UnknownWarehouse { .. }
            | NetDesignError::UnknownRegion { .. } => true,
            NetDesignError::SweepBound { source, .. } => source.is_data_integrity(),
            _ => false,
        }
    }

    /// True when the solver finished without an optimal assignment.
    pub fn is_infeasible(&self) -> bool {
        match self {
            NetDesignError::NoFeasibleSolution { .. } => true,
            NetDesignError::SweepBound { source, .. } => source.is_infeasible(),
            _ => false,
        }
    }
}

fn violated_suffix(constraint: &Option<ConstraintTag>) -> String {
    constraint
        .as_ref()
        .map(|tag| format!(", constraint {} cannot hold", tag))
        .unwrap_or_default()
}

impl From<toml::de::Error> for NetDesignError {
    fn from(err: toml::de::Error) -> Self {
        NetDesignError::Config(format!("TOML parse error: {}", err))
    }
}
