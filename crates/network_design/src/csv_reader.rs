use crate::constants::{
    CITY_HEADER, FIXED_COSTS_HEADER, LAT_HEADER, LON_HEADER, REGION_ID_HEADER,
    TRANSPORTATION_COSTS_HEADER, WAREHOUSE_ID_HEADER,
};
use crate::data::{NetworkData, Region, Shift, Warehouse};
use crate::error::{NetDesignError, Result};

use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::{Path, PathBuf};

const WAREHOUSE_COLUMNS: [&str; 5] = [
    WAREHOUSE_ID_HEADER,
    FIXED_COSTS_HEADER,
    CITY_HEADER,
    LAT_HEADER,
    LON_HEADER,
];
const REGION_COLUMNS: [&str; 4] = [REGION_ID_HEADER, CITY_HEADER, LAT_HEADER, LON_HEADER];
const SHIFT_COLUMNS: [&str; 3] = [
    WAREHOUSE_ID_HEADER,
    REGION_ID_HEADER,
    TRANSPORTATION_COSTS_HEADER,
];

/// File names of the three input tables inside a data directory
#[derive(Debug, Clone)]
pub struct DataFiles {
    pub warehouses: PathBuf,
    pub regions: PathBuf,
    pub shifts: PathBuf,
}

impl DataFiles {
    pub fn in_dir<P: AsRef<Path>>(dir: P, warehouses: &str, regions: &str, shifts: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            warehouses: dir.join(warehouses),
            regions: dir.join(regions),
            shifts: dir.join(shifts),
        }
    }
}

/// Reads the three tables and validates them into [`NetworkData`]
pub fn read_network_data(files: &DataFiles) -> Result<NetworkData> {
    let warehouses = read_warehouses(&files.warehouses)?;
    let regions = read_regions(&files.regions)?;
    let shifts = read_shifts(&files.shifts)?;
    log::info!(
        "loaded {} warehouses, {} regions, {} shifts",
        warehouses.len(),
        regions.len(),
        shifts.len()
    );
    NetworkData::new(warehouses, regions, shifts)
}

pub fn read_warehouses<P: AsRef<Path>>(path: P) -> Result<Vec<Warehouse>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    read_warehouses_from_reader(file, &path.display().to_string())
}

pub fn read_regions<P: AsRef<Path>>(path: P) -> Result<Vec<Region>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    read_regions_from_reader(file, &path.display().to_string())
}

pub fn read_shifts<P: AsRef<Path>>(path: P) -> Result<Vec<Shift>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    read_shifts_from_reader(file, &path.display().to_string())
}

/// Read CSV with `warehouseID,fixedCosts,city,lat,lon` columns (any order).
pub fn read_warehouses_from_reader<R: Read>(reader: R, source: &str) -> Result<Vec<Warehouse>> {
    read_table(reader, source, &WAREHOUSE_COLUMNS, |row| {
        Ok(Warehouse {
            id: row.text(0)?,
            fixed_cost: row.number(1)?,
            city: row.raw(2).to_string(),
            lat: row.number(3)?,
            lon: row.number(4)?,
        })
    })
}

/// Read CSV with `regionID,city,lat,lon` columns (any order).
pub fn read_regions_from_reader<R: Read>(reader: R, source: &str) -> Result<Vec<Region>> {
    read_table(reader, source, &REGION_COLUMNS, |row| {
        Ok(Region {
            id: row.text(0)?,
            city: row.raw(1).to_string(),
            lat: row.number(2)?,
            lon: row.number(3)?,
        })
    })
}

/// Read CSV with `warehouseID,regionID,transportationCosts` columns (any order).
pub fn read_shifts_from_reader<R: Read>(reader: R, source: &str) -> Result<Vec<Shift>> {
    read_table(reader, source, &SHIFT_COLUMNS, |row| {
        Ok(Shift {
            warehouse_id: row.text(0)?,
            region_id: row.text(1)?,
            transportation_cost: row.number(2)?,
        })
    })
}

fn read_table<R, T, F>(reader: R, source: &str, expected: &[&'static str], parse: F) -> Result<Vec<T>>
where
    R: Read,
    F: Fn(&Row<'_>) -> Result<T>,
{
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true) // allow additional columns
        .from_reader(reader);

    let positions = resolve_columns(&mut rdr, source, expected)?;
    let needed = positions.iter().copied().max().map_or(0, |p| p + 1);

    let mut out = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        // file line, blank lines included; header is line 1
        let row_number = rec.position().map_or(i + 2, |p| p.line() as usize);

        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if rec.len() < needed {
            return Err(NetDesignError::CsvRow {
                file: source.to_string(),
                row: row_number,
                expected: needed,
                got: rec.len(),
            });
        }

        let row = Row {
            record: &rec,
            positions: &positions,
            columns: expected,
            source,
            row_number,
        };
        out.push(parse(&row)?);
    }

    log::debug!("read {} rows from {}", out.len(), source);
    Ok(out)
}

/// Maps each expected header (case-insensitive) to its column index
fn resolve_columns<R: Read>(
    csv_reader: &mut csv::Reader<R>,
    source: &str,
    expected: &[&'static str],
) -> Result<Vec<usize>> {
    let headers = csv_reader.headers().map_err(|e| NetDesignError::CsvHeader {
        file: source.to_string(),
        message: format!("Failed to read headers: {}", e),
    })?;

    expected
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| NetDesignError::CsvHeader {
                    file: source.to_string(),
                    message: format!("Missing column '{}'", name),
                })
        })
        .collect()
}

/// One data row with its header mapping
struct Row<'a> {
    record: &'a StringRecord,
    positions: &'a [usize],
    columns: &'a [&'static str],
    source: &'a str,
    row_number: usize,
}

impl Row<'_> {
    fn raw(&self, column: usize) -> &str {
        self.record
            .get(self.positions[column])
            .map(str::trim)
            .unwrap_or_default()
    }

    /// Non-empty string field
    fn text(&self, column: usize) -> Result<String> {
        let value = self.raw(column);
        if value.is_empty() {
            return Err(NetDesignError::EmptyField {
                file: self.source.to_string(),
                row: self.row_number,
                column: self.columns[column],
            });
        }
        Ok(value.to_string())
    }

    fn number(&self, column: usize) -> Result<f64> {
        let value = self.raw(column);
        value.parse().map_err(|source| NetDesignError::NumberParse {
            file: self.source.to_string(),
            row: self.row_number,
            column: self.columns[column],
            value: value.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_read_warehouses() {
        let csv = "warehouseID,fixedCosts,city,lat,lon\n\
                   W1,500,Hamburg,53.55,9.99\n\
                   W2, 750.5 ,Munich,48.14,11.58\n";
        let warehouses = read_warehouses_from_reader(Cursor::new(csv), "warehouses.csv").unwrap();
        assert_eq!(warehouses.len(), 2);
        assert_eq!(warehouses[0].id, "W1");
        assert_eq!(warehouses[1].fixed_cost, 750.5);
        assert_eq!(warehouses[1].city, "Munich");
    }

    #[test]
    fn test_columns_in_any_order_and_case() {
        let csv = "LON,regionid,City,Lat,extra\n\
                   8.80,R1,Bremen,53.08,ignored\n";
        let regions = read_regions_from_reader(Cursor::new(csv), "regions.csv").unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, "R1");
        assert_eq!(regions[0].city, "Bremen");
        assert_eq!(regions[0].lat, 53.08);
        assert_eq!(regions[0].lon, 8.80);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let csv = "warehouseID,regionID,transportationCosts\n\
                   W1,R1,12\n\
                   ,,\n\
                   W1,R2,7\n";
        let shifts = read_shifts_from_reader(Cursor::new(csv), "shifts.csv").unwrap();
        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[1].region_id, "R2");
    }

    #[test]
    fn test_missing_column() {
        let csv = "warehouseID,transportationCosts\nW1,12\n";
        let result = read_shifts_from_reader(Cursor::new(csv), "shifts.csv");
        match result {
            Err(NetDesignError::CsvHeader { message, .. }) => assert!(message.contains("regionID")),
            other => panic!("expected header error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_reports_row() {
        let csv = "warehouseID,regionID,transportationCosts\n\
                   W1,R1,12\n\
                   W1,R2,cheap\n";
        let result = read_shifts_from_reader(Cursor::new(csv), "shifts.csv");
        match result {
            Err(NetDesignError::NumberParse { row, column, value, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, TRANSPORTATION_COSTS_HEADER);
                assert_eq!(value, "cheap");
            }
            other => panic!("expected number error, got {:?}", other),
        }
    }

    #[test]
    fn test_row_number_counts_blank_lines() {
        let csv = "warehouseID,regionID,transportationCosts\n\
                   W1,R1,12\n\
                   \n\
                   W1,R2,cheap\n";
        let result = read_shifts_from_reader(Cursor::new(csv), "shifts.csv");
        match result {
            Err(e @ NetDesignError::NumberParse { row: 4, .. }) => assert!(e.to_string().contains("row 4")),
            other => panic!("expected number error on row 4, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_id_rejected() {
        let csv = "regionID,city,lat,lon\n ,Bremen,53.08,8.80\n";
        let result = read_regions_from_reader(Cursor::new(csv), "regions.csv");
        assert!(matches!(result, Err(NetDesignError::EmptyField { row: 2, .. })));
    }

    #[test]
    fn test_read_network_data_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("warehouses.csv"),
            "warehouseID,fixedCosts,city,lat,lon\nW1,50,Hamburg,53.55,9.99\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("regions.csv"),
            "regionID,city,lat,lon\nR1,Bremen,53.08,8.80\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("shifts.csv"),
            "warehouseID,regionID,transportationCosts\nW1,R1,100\n",
        )
        .unwrap();

        let files = DataFiles::in_dir(dir.path(), "warehouses.csv", "regions.csv", "shifts.csv");
        let data = read_network_data(&files).unwrap();
        assert_eq!(data.warehouses().len(), 1);
        assert_eq!(data.regions().len(), 1);
        assert_eq!(data.shift_cost("W1", "R1"), Some(100.0));
    }

    #[test]
    fn test_read_network_data_nonexistent() {
        let files = DataFiles::in_dir("nonexistent_directory", "w.csv", "r.csv", "s.csv");
        let result = read_network_data(&files);
        assert!(matches!(result, Err(NetDesignError::Io(_))));
    }
}
