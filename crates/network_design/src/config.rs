use crate::{
    constants::{
        DEFAULT_OBJECTIVE_TOLERANCE, DEFAULT_SOLUTION_THRESHOLD, REGIONS_FILE, SHIFTS_FILE,
        UNCONSTRAINED_SENTINEL, WAREHOUSES_FILE,
    },
    csv_reader::DataFiles,
    error::{NetDesignError, Result},
    optimize::{
        SolveOptions,
        policy::{SolvePolicy, WarehouseCount},
        solver::Backend,
    },
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration, every section optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub solver: SolverConfig,
    pub policy: PolicyConfig,
    pub sweep: SweepConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub warehouses: String,
    pub regions: String,
    pub shifts: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            warehouses: WAREHOUSES_FILE.to_string(),
            regions: REGIONS_FILE.to_string(),
            shifts: SHIFTS_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: Backend,
    pub solution_threshold: f64, // values above this count as set
    pub objective_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            solution_threshold: DEFAULT_SOLUTION_THRESHOLD,
            objective_tolerance: DEFAULT_OBJECTIVE_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// -1 for unconstrained
    pub n_warehouses: i64,
    pub force_open: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            n_warehouses: UNCONSTRAINED_SENTINEL,
            force_open: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

impl Config {
    /// Reads and validates a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NetDesignError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            NetDesignError::Config(msg) => {
                NetDesignError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.solver.solution_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(NetDesignError::Config(format!(
                "solution_threshold must be in (0, 1), got {}",
                threshold
            )));
        }

        let tolerance = self.solver.objective_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(NetDesignError::Config(format!(
                "objective_tolerance must be a non-negative number, got {}",
                tolerance
            )));
        }

        WarehouseCount::from_sentinel(self.policy.n_warehouses)?;

        if let Some(id) = self.policy.force_open.iter().find(|id| id.trim().is_empty()) {
            return Err(NetDesignError::Config(format!(
                "force_open contains an empty id: '{}'",
                id
            )));
        }

        if let (Some(min), Some(max)) = (self.sweep.min, self.sweep.max) {
            if min > max {
                return Err(NetDesignError::Config(format!(
                    "sweep.min ({}) must not exceed sweep.max ({})",
                    min, max
                )));
            }
        }

        Ok(())
    }

    pub fn data_files(&self) -> DataFiles {
        DataFiles::in_dir(
            &self.data.dir,
            &self.data.warehouses,
            &self.data.regions,
            &self.data.shifts,
        )
    }

    pub fn to_solve_options(&self) -> SolveOptions {
        SolveOptions {
            backend: self.solver.backend,
            solution_threshold: self.solver.solution_threshold,
            objective_tolerance: self.solver.objective_tolerance,
        }
    }

    pub fn to_policy(&self) -> Result<SolvePolicy> {
        Ok(SolvePolicy::unconstrained()
            .with_count(WarehouseCount::from_sentinel(self.policy.n_warehouses)?)
            .with_force_open(self.policy.force_open.iter().map(|id| id.trim())))
    }
}
