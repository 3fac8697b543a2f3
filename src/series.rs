use crate::config::{month_label, MONTHS};
use crate::error::EngineError;
use crate::types::{DistrictTable, MonthValue};
use crate::util::cumulative;

/// Per-month values of `prefix` for `year`, June through December.
///
/// Months whose column does not exist are omitted, not zero-filled, so the
/// result can be shorter than seven entries. Only a missing year is an
/// error.
pub fn extract(table: &DistrictTable, year: i32, prefix: &str) -> Result<Vec<MonthValue>, EngineError> {
    let row = table.year_row(year)?;
    Ok(MONTHS
        .iter()
        .filter_map(|m| {
            table.value(row, prefix, *m).map(|value| MonthValue {
                month: *m,
                label: month_label(*m),
                value,
            })
        })
        .collect())
}

/// Bare values of `extract`, in month order.
pub fn extract_values(table: &DistrictTable, year: i32, prefix: &str) -> Result<Vec<f64>, EngineError> {
    Ok(extract(table, year, prefix)?.into_iter().map(|mv| mv.value).collect())
}

/// Running totals over a month series, keeping the month labels.
pub fn accumulate(series: &[MonthValue]) -> Vec<MonthValue> {
    let values: Vec<f64> = series.iter().map(|mv| mv.value).collect();
    series
        .iter()
        .zip(cumulative(&values))
        .map(|(mv, value)| MonthValue {
            month: mv.month,
            label: mv.label.clone(),
            value,
        })
        .collect()
}
