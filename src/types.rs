use crate::error::EngineError;
use log::warn;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tabled::Tabled;

/// Column layout of a district table, resolved once from the header.
///
/// Monthly columns are named `<prefix>_<month>`; everything else is a plain
/// scalar column. `year` and `yield` are held on the row itself and never
/// appear here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    monthly: BTreeMap<String, BTreeMap<u8, usize>>,
}

impl Schema {
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        let mut schema = Schema::default();
        for (idx, name) in columns.iter().enumerate() {
            let name = name.as_ref().trim().to_string();
            if let Some((prefix, month)) = split_monthly(&name) {
                schema
                    .monthly
                    .entry(prefix.to_string())
                    .or_default()
                    .insert(month, idx);
            }
            schema.index.insert(name.clone(), idx);
            schema.columns.push(name);
        }
        schema
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn monthly_index(&self, prefix: &str, month: u8) -> Option<usize> {
        self.monthly.get(prefix)?.get(&month).copied()
    }

    pub fn has_month(&self, prefix: &str, month: u8) -> bool {
        self.monthly_index(prefix, month).is_some()
    }

    /// Variable prefixes with at least one monthly column, sorted.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.monthly.keys().map(|s| s.as_str())
    }

    /// Months present for `prefix`, ascending.
    pub fn months_for(&self, prefix: &str) -> Vec<u8> {
        self.monthly
            .get(prefix)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }
}

fn split_monthly(name: &str) -> Option<(&str, u8)> {
    let (prefix, suffix) = name.rsplit_once('_')?;
    if prefix.is_empty() {
        return None;
    }
    match suffix.parse::<u8>() {
        Ok(m) if (1..=12).contains(&m) => Some((prefix, m)),
        _ => None,
    }
}

/// One complete observation year for a district.
#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    pub year: i32,
    pub crop_yield: f64,
    values: Vec<f64>,
}

impl YearRow {
    pub fn new(year: i32, crop_yield: f64, values: Vec<f64>) -> Self {
        YearRow {
            year,
            crop_yield,
            values,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Immutable per-district table keyed by year.
///
/// Rows are sorted ascending by year with no duplicates; built once by the
/// loader and only ever read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictTable {
    name: String,
    schema: Schema,
    rows: Vec<YearRow>,
}

impl DistrictTable {
    /// Build a table, sorting rows by year and keeping the first row seen
    /// for any repeated year.
    pub fn new(name: impl Into<String>, schema: Schema, rows: Vec<YearRow>) -> Self {
        let name = name.into();
        let mut seen: HashSet<i32> = HashSet::new();
        let mut kept: Vec<YearRow> = Vec::with_capacity(rows.len());
        for row in rows {
            if !seen.insert(row.year) {
                warn!("{}: duplicate row for year {} ignored", name, row.year);
                continue;
            }
            kept.push(row);
        }
        kept.sort_by_key(|r| r.year);
        DistrictTable {
            name,
            schema,
            rows: kept,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[YearRow] {
        &self.rows
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }

    pub fn min_year(&self) -> Option<i32> {
        self.rows.first().map(|r| r.year)
    }

    pub fn max_year(&self) -> Option<i32> {
        self.rows.last().map(|r| r.year)
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.rows.binary_search_by_key(&year, |r| r.year).is_ok()
    }

    /// The single row for `year`; absence is a precondition violation.
    pub fn year_row(&self, year: i32) -> Result<&YearRow, EngineError> {
        self.rows
            .binary_search_by_key(&year, |r| r.year)
            .map(|idx| &self.rows[idx])
            .map_err(|_| EngineError::YearNotFound {
                district: self.name.clone(),
                year,
            })
    }

    /// Rows with `start <= year <= end`. Empty when `start > end`.
    pub fn window(&self, start: i32, end: i32) -> YearWindow<'_> {
        let rows = self
            .rows
            .iter()
            .filter(|r| r.year >= start && r.year <= end)
            .collect();
        YearWindow { start, end, rows }
    }

    pub fn value(&self, row: &YearRow, prefix: &str, month: u8) -> Option<f64> {
        let idx = self.schema.monthly_index(prefix, month)?;
        row.values.get(idx).copied()
    }

    /// A scalar field by name; `yield` resolves to the row's crop yield.
    pub fn scalar(&self, row: &YearRow, field: &str) -> Option<f64> {
        if field == crate::config::YIELD_COLUMN {
            return Some(row.crop_yield);
        }
        let idx = self.schema.column_index(field)?;
        row.values.get(idx).copied()
    }

    pub fn yield_series(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.crop_yield).collect()
    }
}

/// Read-only view of a table restricted to an inclusive year range.
#[derive(Debug, Clone)]
pub struct YearWindow<'a> {
    pub start: i32,
    pub end: i32,
    rows: Vec<&'a YearRow>,
}

impl<'a> YearWindow<'a> {
    pub fn rows(&self) -> &[&'a YearRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A labelled month value, the unit of every chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthValue {
    pub month: u8,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YieldStatusRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Yield")]
    #[tabled(rename = "Yield (tons/ha)")]
    pub crop_yield: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "BaselineAvg")]
    #[tabled(rename = "District Avg")]
    pub baseline_avg: String,
    #[serde(rename = "VsBaseline")]
    #[tabled(rename = "Vs Avg")]
    pub vs_baseline: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RainfallStatusRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Rainfall")]
    #[tabled(rename = "Rainfall")]
    pub rainfall: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SeasonComparisonRow {
    #[serde(rename = "Season")]
    #[tabled(rename = "Season")]
    pub season: String,
    #[serde(rename = "Reference")]
    #[tabled(rename = "Reference")]
    pub reference: String,
    #[serde(rename = "Current")]
    #[tabled(rename = "Current")]
    pub current: String,
    #[serde(rename = "ChangePct")]
    #[tabled(rename = "Change (%)")]
    pub change_pct: String,
    #[serde(rename = "Trend")]
    #[tabled(rename = "Trend")]
    pub trend: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ShareChangeRow {
    #[serde(rename = "Season")]
    #[tabled(rename = "Season")]
    pub season: String,
    #[serde(rename = "ReferenceShare")]
    #[tabled(rename = "Reference (%)")]
    pub reference_share: String,
    #[serde(rename = "CurrentShare")]
    #[tabled(rename = "Current (%)")]
    pub current_share: String,
    #[serde(rename = "Change")]
    #[tabled(rename = "Change")]
    pub change: String,
    #[serde(rename = "Trend")]
    #[tabled(rename = "Trend")]
    pub trend: String,
}


#[cfg(test)]
mod tests {
    use super::test_support::table;
    use super::*;

    #[test]
    fn schema_splits_monthly_columns() {
        let schema = Schema::from_columns(&["temp_6", "temp_7", "precip_flux_12", "area", "x_13"]);
        assert_eq!(schema.months_for("temp"), vec![6, 7]);
        assert!(schema.has_month("precip_flux", 12));
        assert!(!schema.has_month("precip_flux", 6));
        assert_eq!(schema.column_index("area"), Some(3));
        assert_eq!(schema.prefixes().collect::<Vec<_>>(), vec!["precip_flux", "temp"]);
        // month 13 is not a month
        assert!(schema.months_for("x").is_empty());
    }

    #[test]
    fn rows_sorted_and_deduplicated() {
        let t = table(
            &["temp_6"],
            &[(2002, 2.0, &[30.0]), (2001, 1.0, &[29.0]), (2002, 9.0, &[99.0])],
        );
        assert_eq!(t.years(), vec![2001, 2002]);
        assert_eq!(t.year_row(2002).unwrap().crop_yield, 2.0);
        assert_eq!(t.min_year(), Some(2001));
        assert_eq!(t.max_year(), Some(2002));
    }

    #[test]
    fn missing_year_is_precondition_error() {
        let t = table(&["temp_6"], &[(2001, 1.0, &[29.0])]);
        let err = t.year_row(1999).unwrap_err();
        assert!(err.is_precondition());
        assert!(matches!(err, EngineError::YearNotFound { year: 1999, .. }));
    }

    #[test]
    fn window_is_inclusive_and_empty_when_reversed() {
        let t = table(
            &["temp_6"],
            &[(2001, 1.0, &[1.0]), (2002, 2.0, &[2.0]), (2003, 3.0, &[3.0])],
        );
        assert_eq!(t.window(2001, 2002).len(), 2);
        assert!(t.window(2003, 2001).is_empty());
        assert!(t.window(1990, 1995).is_empty());
    }

    #[test]
    fn scalar_resolves_yield_and_plain_columns() {
        let t = table(&["temp_6", "area"], &[(2001, 1.5, &[25.0, 400.0])]);
        let row = t.year_row(2001).unwrap();
        assert_eq!(t.scalar(row, "yield"), Some(1.5));
        assert_eq!(t.scalar(row, "area"), Some(400.0));
        assert_eq!(t.scalar(row, "missing"), None);
        assert_eq!(t.value(row, "temp", 6), Some(25.0));
        assert_eq!(t.value(row, "temp", 7), None);
    }
}
