use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use network_design::{
    Config, WarehouseCount,
    export::{export_region_results, export_warehouse_results},
    read_network_data, solve_network,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Solve the warehouse location model for one configuration", long_about = None)]
struct Args {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Directory holding warehouses.csv, regions.csv and shifts.csv
    #[arg(short = 'd', long = "data")]
    data_dir: Option<PathBuf>,

    /// Exact number of open warehouses, -1 for unconstrained
    #[arg(short = 'n', long = "n-warehouses", allow_negative_numbers = true)]
    n_warehouses: Option<i64>,

    /// Warehouse ids that must be open, comma separated
    #[arg(short = 'f', long = "force-open", value_delimiter = ',')]
    force_open: Option<Vec<String>>,

    /// Output directory for the result CSVs
    #[arg(short = 'o', long = "output")]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data.dir = dir;
    }
    if let Some(n) = args.n_warehouses {
        config.policy.n_warehouses = n;
    }
    if let Some(ids) = args.force_open {
        config.policy.force_open = ids;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    config.validate()?;

    let data = read_network_data(&config.data_files())
        .with_context(|| format!("failed to load tables from {}", config.data.dir.display()))?;
    for region in data.unreachable_regions() {
        warn!("region {} has no eligible warehouse", region.id);
    }

    let policy = config.to_policy()?;
    let options = config.to_solve_options();
    info!(
        "solving with backend={}, n_warehouses={}, force_open=[{}]",
        options.backend,
        policy.n_warehouses,
        policy.force_open.iter().cloned().collect::<Vec<_>>().join(", ")
    );

    let result = solve_network(&data, &policy, &options)?;
    if let WarehouseCount::Exactly(n) = policy.n_warehouses {
        info!("bound n_warehouses={} satisfied: {} open", n, result.open_count());
    }
    info!("fixed costs:          {:.2}", result.costs.fixed);
    info!("transportation costs: {:.2}", result.costs.variable);
    info!("total costs:          {:.2}", result.costs.total);
    for warehouse in result.open_warehouses() {
        info!(
            "open {} ({}): serves {}",
            warehouse.id,
            warehouse.city,
            warehouse.regions_served.join(", ")
        );
    }

    export_warehouse_results(&result, &config.output.dir, None)?;
    export_region_results(&result, &config.output.dir, None)?;
    Ok(())
}
