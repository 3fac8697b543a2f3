use crate::config::{SeasonDefinition, MONTHS, PRECIP_FLUX};
use crate::error::EngineError;
use crate::types::{DistrictTable, YearRow};
use crate::util::mean;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonValue {
    pub season: String,
    pub value: f64,
}

/// Season name to value, in season-definition order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct SeasonTotals(Vec<SeasonValue>);

impl SeasonTotals {
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        SeasonTotals(
            pairs
                .into_iter()
                .map(|(season, value)| SeasonValue {
                    season: season.into(),
                    value,
                })
                .collect(),
        )
    }

    pub fn get(&self, season: &str) -> Option<f64> {
        self.0.iter().find(|s| s.season == season).map(|s| s.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeasonValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().map(|s| s.value).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearShares {
    pub year: i32,
    pub shares: SeasonTotals,
}

/// Precip flux summed over the months of one season; absent month columns
/// are left out of the sum.
fn season_sum(table: &DistrictTable, row: &YearRow, season: &SeasonDefinition) -> f64 {
    season
        .months
        .iter()
        .filter_map(|m| table.value(row, PRECIP_FLUX, *m))
        .sum()
}

/// Precip flux summed over every observed month, June through December.
fn season_wide_sum(table: &DistrictTable, row: &YearRow) -> f64 {
    MONTHS
        .iter()
        .filter_map(|m| table.value(row, PRECIP_FLUX, *m))
        .sum()
}

fn row_totals(table: &DistrictTable, row: &YearRow, seasons: &[SeasonDefinition]) -> SeasonTotals {
    SeasonTotals::from_pairs(seasons.iter().map(|s| (s.name, season_sum(table, row, s))))
}

/// Rainfall total per season for `year`.
pub fn seasonal_totals(
    table: &DistrictTable,
    year: i32,
    seasons: &[SeasonDefinition],
) -> Result<SeasonTotals, EngineError> {
    let row = table.year_row(year)?;
    Ok(row_totals(table, row, seasons))
}

/// Each season's percentage of the summed totals. All zeros when the sum
/// is zero.
pub fn seasonal_shares(totals: &SeasonTotals) -> SeasonTotals {
    let total = totals.sum();
    SeasonTotals::from_pairs(totals.iter().map(|s| {
        let share = if total == 0.0 {
            0.0
        } else {
            100.0 * s.value / total
        };
        (s.season.clone(), share)
    }))
}

/// Each season's percentage of the whole June-December rainfall for `year`,
/// so shares need not add up to 100 when some months belong to no season.
pub fn shares_of_observed(
    table: &DistrictTable,
    year: i32,
    seasons: &[SeasonDefinition],
) -> Result<SeasonTotals, EngineError> {
    let row = table.year_row(year)?;
    let all = season_wide_sum(table, row);
    Ok(SeasonTotals::from_pairs(seasons.iter().map(|s| {
        let share = if all == 0.0 {
            0.0
        } else {
            100.0 * season_sum(table, row, s) / all
        };
        (s.name, share)
    })))
}

/// Mean of each season's yearly total over `start..=end`; NaN for an
/// empty window.
pub fn window_mean_totals(
    table: &DistrictTable,
    start: i32,
    end: i32,
    seasons: &[SeasonDefinition],
) -> SeasonTotals {
    let window = table.window(start, end);
    SeasonTotals::from_pairs(seasons.iter().map(|s| {
        let yearly: Vec<f64> = window
            .rows()
            .iter()
            .map(|r| season_sum(table, r, s))
            .collect();
        (s.name, mean(&yearly))
    }))
}

/// Mean over `start..=end` of each year's season share of the June-December
/// total. Years with no rainfall at all are skipped; NaN if none remain.
pub fn window_mean_shares(
    table: &DistrictTable,
    start: i32,
    end: i32,
    seasons: &[SeasonDefinition],
) -> SeasonTotals {
    let window = table.window(start, end);
    SeasonTotals::from_pairs(seasons.iter().map(|s| {
        let ratios: Vec<f64> = window
            .rows()
            .iter()
            .filter_map(|r| {
                let all = season_wide_sum(table, r);
                (all != 0.0).then(|| season_sum(table, r, s) / all)
            })
            .collect();
        (s.name, mean(&ratios) * 100.0)
    }))
}

/// Season shares for every year in the table, oldest first.
pub fn share_trend(table: &DistrictTable, seasons: &[SeasonDefinition]) -> Vec<YearShares> {
    table
        .rows()
        .iter()
        .map(|r| YearShares {
            year: r.year,
            shares: seasonal_shares(&row_totals(table, r, seasons)),
        })
        .collect()
}
