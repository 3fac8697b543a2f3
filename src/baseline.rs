use crate::config::{month_label, MONTHS, YIELD_COLUMN};
use crate::types::{DistrictTable, MonthValue, YearWindow};
use crate::util::mean;
use log::debug;
use std::collections::BTreeMap;

/// Means over an inclusive window of years.
///
/// Built for every `(prefix, month)` column and scalar column in the
/// schema. An empty window yields NaN everywhere rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub start: i32,
    pub end: i32,
    pub years: usize,
    monthly: BTreeMap<(String, u8), f64>,
    scalars: BTreeMap<String, f64>,
}

impl Baseline {
    /// Mean of `prefix_month` over the window; `None` if the column does
    /// not exist, NaN if the window is empty.
    pub fn monthly_mean(&self, prefix: &str, month: u8) -> Option<f64> {
        self.monthly.get(&(prefix.to_string(), month)).copied()
    }

    /// Mean of a scalar field such as `yield`.
    pub fn scalar_mean(&self, field: &str) -> Option<f64> {
        self.scalars.get(field).copied()
    }

    pub fn yield_mean(&self) -> f64 {
        self.scalar_mean(YIELD_COLUMN).unwrap_or(f64::NAN)
    }

    /// Per-month means of `prefix`, June through December, omitting
    /// months without a column.
    pub fn monthly_series(&self, prefix: &str) -> Vec<MonthValue> {
        MONTHS
            .iter()
            .filter_map(|m| {
                self.monthly_mean(prefix, *m).map(|value| MonthValue {
                    month: *m,
                    label: month_label(*m),
                    value,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.years == 0
    }
}

/// Aggregate `table` over `start..=end`.
pub fn aggregate(table: &DistrictTable, start: i32, end: i32) -> Baseline {
    let window = table.window(start, end);
    aggregate_window(table, &window)
}

pub fn aggregate_window(table: &DistrictTable, window: &YearWindow<'_>) -> Baseline {
    let schema = table.schema();
    let column_mean = |idx: usize| -> f64 {
        let vals: Vec<f64> = window
            .rows()
            .iter()
            .filter_map(|r| r.values().get(idx).copied())
            .collect();
        mean(&vals)
    };

    let mut monthly = BTreeMap::new();
    for prefix in schema.prefixes() {
        for month in schema.months_for(prefix) {
            if let Some(idx) = schema.monthly_index(prefix, month) {
                monthly.insert((prefix.to_string(), month), column_mean(idx));
            }
        }
    }

    let mut scalars = BTreeMap::new();
    for (idx, name) in schema.columns().iter().enumerate() {
        scalars.insert(name.clone(), column_mean(idx));
    }
    let yields: Vec<f64> = window.rows().iter().map(|r| r.crop_yield).collect();
    scalars.insert(YIELD_COLUMN.to_string(), mean(&yields));

    if window.is_empty() {
        debug!(
            "{}: baseline {}-{} has no rows, means are undefined",
            table.name(),
            window.start,
            window.end
        );
    }

    Baseline {
        start: window.start,
        end: window.end,
        years: window.len(),
        monthly,
        scalars,
    }
}
