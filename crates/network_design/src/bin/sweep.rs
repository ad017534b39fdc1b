use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use network_design::{
    Config, GoodLpSolver, SweepRunner,
    export::{export_sweep_summary, save_sweep_report_json},
    read_network_data,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Trace total cost over the number of open warehouses", long_about = None)]
struct Args {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Directory holding warehouses.csv, regions.csv and shifts.csv
    #[arg(short = 'd', long = "data")]
    data_dir: Option<PathBuf>,

    /// Smallest bound to solve
    #[arg(long)]
    min: Option<usize>,

    /// Largest bound to solve
    #[arg(long)]
    max: Option<usize>,

    /// Solve bounds on the rayon thread pool
    #[arg(short = 'p', long)]
    parallel: bool,

    /// Output directory for the summary CSV and JSON report
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
    if args.min.is_some() {
        config.sweep.min = args.min;
    }
    if args.max.is_some() {
        config.sweep.max = args.max;
    }
    config.sweep.parallel |= args.parallel;
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    config.validate()?;

    let data = read_network_data(&config.data_files())
        .with_context(|| format!("failed to load tables from {}", config.data.dir.display()))?;

    let solver = GoodLpSolver::new(config.solver.backend);
    let runner = SweepRunner::new(&data, &solver, config.to_solve_options())
        .with_force_open(config.policy.force_open.iter().map(|id| id.trim()))
        .parallel(config.sweep.parallel);
    let bounds = runner.bounds(config.sweep.min, config.sweep.max)?;
    let report = runner.run(&bounds)?;

    for entry in report.entries() {
        match entry.costs() {
            Some(c) => info!(
                "n_warehouses={:>3}: fixed={:>12.2} variable={:>12.2} total={:>12.2}",
                entry.n_warehouses, c.fixed, c.variable, c.total
            ),
            None => info!("n_warehouses={:>3}: {}", entry.n_warehouses, entry.status()),
        }
    }
    match report.best() {
        Some(best) => info!("best number of warehouses: {}", best.n_warehouses),
        None => warn!("no feasible bound between {:?} and {:?}", bounds.first(), bounds.last()),
    }

    export_sweep_summary(&report, &config.output.dir, None)?;
    save_sweep_report_json(&report, &config.output.dir, None)?;
    Ok(())
}
