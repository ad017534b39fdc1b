/// Solver values strictly above this are read as `true`
pub const DEFAULT_SOLUTION_THRESHOLD: f64 = 0.5;

/// Relative tolerance between extracted totals and the solver objective
pub const DEFAULT_OBJECTIVE_TOLERANCE: f64 = 1e-6;

/// Sentinel for "no warehouse-count bound" in config files and CLI flags
pub const UNCONSTRAINED_SENTINEL: i64 = -1;

/// Default input file names
pub const WAREHOUSES_FILE: &str = "warehouses.csv";
pub const REGIONS_FILE: &str = "regions.csv";
pub const SHIFTS_FILE: &str = "shifts.csv";

/// Expected headers in CSV files
pub const WAREHOUSE_ID_HEADER: &str = "warehouseID";
pub const REGION_ID_HEADER: &str = "regionID";
pub const FIXED_COSTS_HEADER: &str = "fixedCosts";
pub const TRANSPORTATION_COSTS_HEADER: &str = "transportationCosts";
pub const CITY_HEADER: &str = "city";
pub const LAT_HEADER: &str = "lat";
pub const LON_HEADER: &str = "lon";

/// Headers of exported result files
pub const OPEN_HEADER: &str = "open";
pub const SWEEP_SUMMARY_HEADERS: [&str; 5] = [
    "n_warehouses",
    "status",
    "fixed_costs",
    "variable_costs",
    "total_costs",
];
