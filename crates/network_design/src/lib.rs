pub mod config;
pub mod constants;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod export;
pub mod optimize;
pub mod sweep;

pub use config::Config;
pub use csv_reader::{DataFiles, read_network_data};
pub use data::{NetworkData, Region, Shift, Warehouse};
pub use error::{NetDesignError, Result};
pub use optimize::extract::{CostSummary, RegionResult, SolveResult, WarehouseResult};
pub use optimize::policy::{SolvePolicy, WarehouseCount};
pub use optimize::solver::{Backend, GoodLpSolver, MipSolver, SolveStatus};
pub use optimize::{SolveOptions, solve_network, solve_network_with};
pub use sweep::{SweepEntry, SweepOutcome, SweepReport, SweepRunner};
