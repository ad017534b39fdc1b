use crate::constants::{
    CITY_HEADER, LAT_HEADER, LON_HEADER, OPEN_HEADER, REGION_ID_HEADER, SWEEP_SUMMARY_HEADERS,
    WAREHOUSE_ID_HEADER,
};
use crate::error::{NetDesignError, Result};
use crate::optimize::extract::SolveResult;
use crate::sweep::SweepReport;

use chrono::Local;
use csv::WriterBuilder;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// `dir/name` if a name is given, otherwise `dir/{stem}_{timestamp}.{ext}`.
/// Creates `dir` when missing.
pub fn output_path(dir: &Path, stem: &str, ext: &str, name: Option<&str>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| NetDesignError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let filename = match name {
        Some(name) => name.to_string(),
        None => {
            let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
            format!("{stem}_{timestamp}.{ext}")
        }
    };
    Ok(dir.join(filename))
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| NetDesignError::CreateFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    #[allow(unused_mut)]
    let mut builder = WriterBuilder::new();
    #[cfg(windows)]
    {
        use csv::Terminator;
        builder = builder.terminator(Terminator::CRLF);
    }
    builder.from_writer(writer)
}

/// `warehouseID,open,city,lat,lon`, `open` as 0/1
pub fn write_warehouse_results<W: Write>(result: &SolveResult, writer: W) -> Result<()> {
    let mut wtr = csv_writer(writer);
    wtr.write_record([WAREHOUSE_ID_HEADER, OPEN_HEADER, CITY_HEADER, LAT_HEADER, LON_HEADER])?;
    for w in &result.warehouses {
        let open = if w.open { "1" } else { "0" };
        let lat = w.lat.to_string();
        let lon = w.lon.to_string();
        wtr.write_record([w.id.as_str(), open, w.city.as_str(), lat.as_str(), lon.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// `regionID,warehouseID,city,lat,lon`
pub fn write_region_results<W: Write>(result: &SolveResult, writer: W) -> Result<()> {
    let mut wtr = csv_writer(writer);
    wtr.write_record([REGION_ID_HEADER, WAREHOUSE_ID_HEADER, CITY_HEADER, LAT_HEADER, LON_HEADER])?;
    for r in &result.regions {
        let lat = r.lat.to_string();
        let lon = r.lon.to_string();
        wtr.write_record([
            r.id.as_str(),
            r.warehouse_id.as_str(),
            r.city.as_str(),
            lat.as_str(),
            lon.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per bound; cost columns stay empty when the bound was not solved
pub fn write_sweep_summary<W: Write>(report: &SweepReport, writer: W) -> Result<()> {
    let mut wtr = csv_writer(writer);
    wtr.write_record(SWEEP_SUMMARY_HEADERS)?;
    for entry in report.entries() {
        let (fixed, variable, total) = match entry.costs() {
            Some(c) => (c.fixed.to_string(), c.variable.to_string(), c.total.to_string()),
            None => (String::new(), String::new(), String::new()),
        };
        wtr.write_record([
            entry.n_warehouses.to_string(),
            entry.status().to_string(),
            fixed,
            variable,
            total,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_warehouse_results(result: &SolveResult, output_dir: &Path, name: Option<&str>) -> Result<PathBuf> {
    let path = output_path(output_dir, "warehouse_results", "csv", name)?;
    write_warehouse_results(result, create_file(&path)?)?;
    log::info!("warehouse results saved to: {}", path.display());
    Ok(path)
}

pub fn export_region_results(result: &SolveResult, output_dir: &Path, name: Option<&str>) -> Result<PathBuf> {
    let path = output_path(output_dir, "region_results", "csv", name)?;
    write_region_results(result, create_file(&path)?)?;
    log::info!("region results saved to: {}", path.display());
    Ok(path)
}

pub fn export_sweep_summary(report: &SweepReport, output_dir: &Path, name: Option<&str>) -> Result<PathBuf> {
    let path = output_path(output_dir, "sweep_summary", "csv", name)?;
    write_sweep_summary(report, create_file(&path)?)?;
    log::info!("sweep summary saved to: {}", path.display());
    Ok(path)
}

/// Full report including both record sets of every solved bound
pub fn save_sweep_report_json(report: &SweepReport, output_dir: &Path, name: Option<&str>) -> Result<PathBuf> {
    let path = output_path(output_dir, "sweep_report", "json", name)?;
    let mut writer = create_file(&path)?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    log::info!("sweep report saved to: {}", path.display());
    Ok(path)
}
