use crate::config::{YEAR_COLUMN, YIELD_COLUMN};
use crate::error::EngineError;
use crate::types::{DistrictTable, Schema, YearRow};
use crate::util::{format_int, parse_f64_safe, parse_year_safe};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
    pub duplicate_years: usize,
}

/// Load one district from a CSV file. The district is named after the
/// file stem.
pub fn load_district<P: AsRef<Path>>(path: P) -> Result<(DistrictTable, LoadReport), EngineError> {
    let path = path.as_ref();
    let name = district_name(path);
    let file = std::fs::File::open(path)?;
    let (table, report) = read_district(&name, file)?;
    info!(
        "{}: {} rows loaded, {} kept, {} dropped as incomplete",
        name,
        format_int(report.total_rows),
        format_int(report.kept_rows),
        format_int(report.dropped_rows)
    );
    Ok((table, report))
}

/// Parse a district table from any CSV source.
///
/// The header must contain `year` and `yield`. A column whose non-empty cells
/// all parse as numbers is a value column; any other column (district or
/// state names, notes) is carried along as text and left out of the schema.
/// A row with an empty cell in any column is dropped.
pub fn read_district<R: Read>(name: &str, source: R) -> Result<(DistrictTable, LoadReport), EngineError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(source);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let year_idx = headers
        .iter()
        .position(|h| h == YEAR_COLUMN)
        .ok_or_else(|| EngineError::MissingColumn(YEAR_COLUMN.to_string()))?;
    let yield_idx = headers
        .iter()
        .position(|h| h == YIELD_COLUMN)
        .ok_or_else(|| EngineError::MissingColumn(YIELD_COLUMN.to_string()))?;

    let mut report = LoadReport::default();
    let mut records: Vec<StringRecord> = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        match result {
            // Short rows are incomplete rows.
            Ok(r) if r.len() >= headers.len() => records.push(r),
            Ok(_) => report.dropped_rows += 1,
            Err(e) => {
                warn!("{}: unreadable row {}: {}", name, report.total_rows, e);
                report.dropped_rows += 1;
            }
        }
    }

    let value_idx: Vec<usize> = (0..headers.len())
        .filter(|i| *i != year_idx && *i != yield_idx)
        .filter(|i| {
            let numeric = is_numeric_column(&records, *i);
            if !numeric {
                debug!("{}: column '{}' is not numeric, kept as text", name, headers[*i]);
            }
            numeric
        })
        .collect();
    let value_names: Vec<&str> = value_idx.iter().map(|i| headers[*i].as_str()).collect();
    let schema = Schema::from_columns(&value_names);

    let mut seen: HashSet<i32> = HashSet::new();
    let mut rows: Vec<YearRow> = Vec::new();

    for record in &records {
        if record.iter().any(|cell| cell.trim().is_empty()) {
            report.dropped_rows += 1;
            continue;
        }
        let Some(year) = parse_year_safe(record.get(year_idx)) else {
            report.dropped_rows += 1;
            continue;
        };
        let Some(crop_yield) = parse_f64_safe(record.get(yield_idx)) else {
            report.dropped_rows += 1;
            continue;
        };
        let values: Option<Vec<f64>> = value_idx
            .iter()
            .map(|i| parse_f64_safe(record.get(*i)))
            .collect();
        let Some(values) = values else {
            report.dropped_rows += 1;
            continue;
        };
        if !seen.insert(year) {
            warn!("{}: duplicate year {} skipped", name, year);
            report.duplicate_years += 1;
            continue;
        }
        rows.push(YearRow::new(year, crop_yield, values));
    }

    report.kept_rows = rows.len();
    Ok((DistrictTable::new(name, schema, rows), report))
}

/// True when every non-empty cell of column `idx` parses as a number.
fn is_numeric_column(records: &[StringRecord], idx: usize) -> bool {
    records
        .iter()
        .filter_map(|r| r.get(idx))
        .filter(|cell| !cell.trim().is_empty())
        .all(|cell| parse_f64_safe(Some(cell)).is_some())
}

/// Every `*.csv` file in `dir`, keyed by district name.
pub fn district_files<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, PathBuf>, EngineError> {
    let mut files = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if path.is_file() && is_csv {
            files.insert(district_name(&path), path);
        }
    }
    Ok(files)
}

/// Load every district in `dir` at once.
pub fn load_all_districts<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, DistrictTable>, EngineError> {
    let mut out = BTreeMap::new();
    for (name, path) in district_files(dir)? {
        let (table, _) = load_district(&path)?;
        out.insert(name, table);
    }
    Ok(out)
}

fn district_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
