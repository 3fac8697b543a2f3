use crate::baseline::aggregate;
use crate::config::{month_label, MONTHS, PRECIP_FLUX};
use crate::deviation::relative_deviation;
use crate::error::EngineError;
use crate::types::{DistrictTable, MonthValue};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonsoonCheck {
    pub year: i32,
    pub window_start: i32,
    pub window_end: i32,
    pub window_years: usize,
    /// Absolute relative deviation per month against the trailing mean.
    pub deviations: Vec<MonthValue>,
    pub warning: bool,
}

/// Per-month absolute deviation of precip flux in `year` from its mean over
/// the `window` years strictly before it.
///
/// With an empty trailing window every deviation is NaN, and NaN never
/// exceeds a threshold.
pub fn check_monsoon(
    table: &DistrictTable,
    year: i32,
    window: u32,
    threshold: f64,
) -> Result<MonsoonCheck, EngineError> {
    let row = table.year_row(year)?;
    let (start, end) = (year.saturating_sub_unsigned(window), year.saturating_sub(1));
    let trailing = aggregate(table, start, end);

    let deviations: Vec<MonthValue> = MONTHS
        .iter()
        .filter_map(|m| {
            let current = table.value(row, PRECIP_FLUX, *m)?;
            let past = trailing.monthly_mean(PRECIP_FLUX, *m)?;
            Some(MonthValue {
                month: *m,
                label: month_label(*m),
                value: relative_deviation(current, past).abs(),
            })
        })
        .collect();

    let warning = deviations.iter().any(|d| d.value > threshold);
    debug!(
        "{} {}: trailing {}-{} ({} years), warning={}",
        table.name(),
        year,
        start,
        end,
        trailing.years,
        warning
    );

    Ok(MonsoonCheck {
        year,
        window_start: start,
        window_end: end,
        window_years: trailing.years,
        deviations,
        warning,
    })
}

/// True if any June-December month deviates from the trailing mean by
/// more than `threshold`.
pub fn detect_monsoon_anomaly(
    table: &DistrictTable,
    year: i32,
    window: u32,
    threshold: f64,
) -> Result<bool, EngineError> {
    Ok(check_monsoon(table, year, window, threshold)?.warning)
}
