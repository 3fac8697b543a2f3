use crate::config::{SeasonDefinition, EPSILON};
use crate::deviation::ThreeWay;
use crate::error::EngineError;
use crate::seasons::{
    seasonal_shares, seasonal_totals, shares_of_observed, window_mean_shares, window_mean_totals,
    SeasonTotals,
};
use crate::types::DistrictTable;
use log::debug;
use serde::Serialize;

/// One season of a current-vs-reference rainfall comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonChange {
    pub season: String,
    pub reference: f64,
    pub current: f64,
    pub percent_change: f64,
    pub trend: String,
}

/// One season of a share comparison, in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareChange {
    pub season: String,
    pub reference_share: f64,
    pub current_share: f64,
    pub change: f64,
    pub trend: String,
}

/// Percent change from `reference` to `current`.
///
/// Zero unless the reference is strictly positive; a NaN reference also
/// gives zero. Unlike `relative_deviation` this does not rely on the
/// epsilon alone to guard the division.
pub fn percent_change(current: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        100.0 * (current - reference) / (reference + EPSILON)
    } else {
        0.0
    }
}

/// Compare season totals, in the order of `current`. A season missing from
/// `reference` compares against NaN.
pub fn compare(current: &SeasonTotals, reference: &SeasonTotals, trend: &ThreeWay) -> Vec<SeasonChange> {
    current
        .iter()
        .map(|c| {
            let reference = reference.get(&c.season).unwrap_or(f64::NAN);
            let pct = percent_change(c.value, reference);
            SeasonChange {
                season: c.season.clone(),
                reference,
                current: c.value,
                percent_change: pct,
                trend: trend.bucket(pct).to_string(),
            }
        })
        .collect()
}

/// Whether the year before `year` is in the table. Callers check this
/// before asking for a previous-year comparison.
pub fn has_prior_year(table: &DistrictTable, year: i32) -> bool {
    table.contains_year(year - 1)
}

/// Season totals of `year` against `year - 1`; `None` without a prior year.
pub fn compare_previous_year(
    table: &DistrictTable,
    year: i32,
    seasons: &[SeasonDefinition],
    trend: &ThreeWay,
) -> Result<Option<Vec<SeasonChange>>, EngineError> {
    let current = seasonal_totals(table, year, seasons)?;
    if !has_prior_year(table, year) {
        debug!("{}: no year before {}", table.name(), year);
        return Ok(None);
    }
    let previous = seasonal_totals(table, year - 1, seasons)?;
    Ok(Some(compare(&current, &previous, trend)))
}

/// Season totals of `year` against their mean over `start..=end`.
pub fn compare_baseline(
    table: &DistrictTable,
    year: i32,
    start: i32,
    end: i32,
    seasons: &[SeasonDefinition],
    trend: &ThreeWay,
) -> Result<Vec<SeasonChange>, EngineError> {
    let current = seasonal_totals(table, year, seasons)?;
    let reference = window_mean_totals(table, start, end, seasons);
    Ok(compare(&current, &reference, trend))
}

fn share_changes(current: &SeasonTotals, reference: &SeasonTotals, trend: &ThreeWay) -> Vec<ShareChange> {
    current
        .iter()
        .map(|c| {
            let reference_share = reference.get(&c.season).unwrap_or(f64::NAN);
            let change = c.value - reference_share;
            ShareChange {
                season: c.season.clone(),
                reference_share,
                current_share: c.value,
                change,
                trend: trend.bucket(change).to_string(),
            }
        })
        .collect()
}

/// Current season shares against last year's share of its whole
/// June-December rainfall; `None` without a prior year.
pub fn share_change_previous_year(
    table: &DistrictTable,
    year: i32,
    seasons: &[SeasonDefinition],
    trend: &ThreeWay,
) -> Result<Option<Vec<ShareChange>>, EngineError> {
    let current = seasonal_shares(&seasonal_totals(table, year, seasons)?);
    if !has_prior_year(table, year) {
        return Ok(None);
    }
    let previous = shares_of_observed(table, year - 1, seasons)?;
    Ok(Some(share_changes(&current, &previous, trend)))
}

/// Current season shares against the mean share over every year from the
/// first on record up to `year - 1`. Needs at least two earlier years.
pub fn share_change_cumulative(
    table: &DistrictTable,
    year: i32,
    seasons: &[SeasonDefinition],
    trend: &ThreeWay,
) -> Result<Option<Vec<ShareChange>>, EngineError> {
    let current = seasonal_shares(&seasonal_totals(table, year, seasons)?);
    let Some(first) = table.min_year() else {
        return Ok(None);
    };
    if year <= first + 1 {
        return Ok(None);
    }
    let reference = window_mean_shares(table, first, year - 1, seasons);
    Ok(Some(share_changes(&current, &reference, trend)))
}
