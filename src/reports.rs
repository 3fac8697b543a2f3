use crate::baseline::{aggregate, Baseline};
use crate::compare::{
    compare_baseline, compare_previous_year, share_change_cumulative, share_change_previous_year,
    SeasonChange, ShareChange,
};
use crate::config::{variable_label, EngineConfig, PRECIP_FLUX, SEASONS, VARIABLES};
use crate::deviation::{
    classify_yield, relative_deviation, Quartiles, YieldStatus, RAINFALL_STATUS, SEASON_TREND,
    SHARE_TREND, YIELD_VS_BASELINE,
};
use crate::error::EngineError;
use crate::seasons::{seasonal_shares, seasonal_totals, share_trend, window_mean_totals, SeasonTotals, YearShares};
use crate::series::{accumulate, extract};
use crate::summary::summary_lines;
use crate::types::{
    DistrictTable, MonthValue, RainfallStatusRow, SeasonComparisonRow, ShareChangeRow,
    YieldStatusRow,
};
use crate::util::{format_number, format_signed};
use crate::warning::{check_monsoon, MonsoonCheck};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldSummary {
    pub value: f64,
    pub status: YieldStatus,
    pub quartiles: Quartiles,
    pub baseline_mean: f64,
    pub vs_baseline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSeries {
    pub prefix: String,
    pub label: String,
    pub current: Vec<MonthValue>,
    pub baseline: Vec<MonthValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainfallStatus {
    pub month: u8,
    pub label: String,
    pub rainfall: f64,
    pub baseline: f64,
    pub deviation: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccumulatedRainfall {
    pub current: Vec<MonthValue>,
    pub baseline: Vec<MonthValue>,
}

/// Everything shown for one district and year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub district: String,
    pub state: String,
    pub year: i32,
    pub baseline_start: i32,
    pub baseline_end: i32,
    pub baseline_years: usize,
    pub crop_yield: YieldSummary,
    pub monsoon: MonsoonCheck,
    pub climate: Vec<VariableSeries>,
    pub rainfall_status: Vec<RainfallStatus>,
    pub accumulated_rainfall: AccumulatedRainfall,
    pub season_totals: SeasonTotals,
    pub season_shares: SeasonTotals,
    pub baseline_season_totals: SeasonTotals,
    pub vs_previous_year: Option<Vec<SeasonChange>>,
    pub vs_baseline: Vec<SeasonChange>,
    pub share_vs_previous_year: Option<Vec<ShareChange>>,
    pub share_vs_history: Option<Vec<ShareChange>>,
    pub share_trend: Vec<YearShares>,
    pub summary: Vec<String>,
}

pub fn build_dashboard(table: &DistrictTable, year: i32, cfg: &EngineConfig) -> Result<Dashboard, EngineError> {
    let row = table.year_row(year)?;
    let baseline = aggregate(table, cfg.baseline_start, cfg.baseline_end);
    let season_trend = SEASON_TREND.with_threshold(cfg.trend_threshold);
    let share_trend_bands = SHARE_TREND.with_threshold(cfg.share_point_threshold);

    let history = table.yield_series();
    let quartiles = Quartiles::of(&history);
    let baseline_yield = baseline.yield_mean();
    let crop_yield = YieldSummary {
        value: row.crop_yield,
        status: classify_yield(row.crop_yield, &history),
        quartiles,
        baseline_mean: baseline_yield,
        vs_baseline: YIELD_VS_BASELINE
            .classify(row.crop_yield, baseline_yield)
            .to_string(),
    };

    let monsoon = check_monsoon(table, year, cfg.trailing_window, cfg.monsoon_threshold)?;
    let climate = climate_series(table, year, &baseline)?;
    let rainfall_status = rainfall_status(table, year, &baseline, cfg)?;

    let accumulated_rainfall = AccumulatedRainfall {
        current: accumulate(&extract(table, year, PRECIP_FLUX)?),
        baseline: accumulate(&baseline.monthly_series(PRECIP_FLUX)),
    };

    let season_totals = seasonal_totals(table, year, &SEASONS)?;
    let season_shares = seasonal_shares(&season_totals);
    let baseline_season_totals = window_mean_totals(table, cfg.baseline_start, cfg.baseline_end, &SEASONS);

    let dashboard = Dashboard {
        district: table.name().to_string(),
        state: cfg.state.clone(),
        year,
        baseline_start: cfg.baseline_start,
        baseline_end: cfg.baseline_end,
        baseline_years: baseline.years,
        crop_yield,
        monsoon,
        climate,
        rainfall_status,
        accumulated_rainfall,
        season_totals,
        season_shares,
        baseline_season_totals,
        vs_previous_year: compare_previous_year(table, year, &SEASONS, &season_trend)?,
        vs_baseline: compare_baseline(
            table,
            year,
            cfg.baseline_start,
            cfg.baseline_end,
            &SEASONS,
            &season_trend,
        )?,
        share_vs_previous_year: share_change_previous_year(table, year, &SEASONS, &share_trend_bands)?,
        share_vs_history: share_change_cumulative(table, year, &SEASONS, &share_trend_bands)?,
        share_trend: share_trend(table, &SEASONS),
        summary: summary_lines(table, year, &SEASONS)?,
    };
    debug!(
        "{} {}: dashboard built, baseline {} years, warning={}",
        dashboard.district, year, dashboard.baseline_years, dashboard.monsoon.warning
    );
    Ok(dashboard)
}

/// Current and baseline month series for every variable in the table,
/// known variables first in their display order.
fn climate_series(table: &DistrictTable, year: i32, baseline: &Baseline) -> Result<Vec<VariableSeries>, EngineError> {
    let schema = table.schema();
    let mut prefixes: Vec<&str> = VARIABLES
        .iter()
        .map(|(p, _)| *p)
        .filter(|p| !schema.months_for(p).is_empty())
        .collect();
    for p in schema.prefixes() {
        if !prefixes.contains(&p) {
            prefixes.push(p);
        }
    }

    prefixes
        .into_iter()
        .map(|prefix| {
            Ok(VariableSeries {
                prefix: prefix.to_string(),
                label: variable_label(prefix).to_string(),
                current: extract(table, year, prefix)?,
                baseline: baseline.monthly_series(prefix),
            })
        })
        .collect()
}

fn rainfall_status(
    table: &DistrictTable,
    year: i32,
    baseline: &Baseline,
    cfg: &EngineConfig,
) -> Result<Vec<RainfallStatus>, EngineError> {
    let bands = RAINFALL_STATUS.with_threshold(cfg.rainfall_threshold);
    Ok(extract(table, year, PRECIP_FLUX)?
        .into_iter()
        .filter_map(|mv| {
            let avg = baseline.monthly_mean(PRECIP_FLUX, mv.month)?;
            let deviation = relative_deviation(mv.value, avg);
            Some(RainfallStatus {
                month: mv.month,
                label: mv.label,
                rainfall: mv.value,
                baseline: avg,
                deviation,
                status: bands.bucket(deviation).to_string(),
            })
        })
        .collect())
}

pub fn yield_rows(d: &Dashboard) -> Vec<YieldStatusRow> {
    vec![YieldStatusRow {
        year: d.year,
        crop_yield: format_number(d.crop_yield.value, 2),
        category: d.crop_yield.status.to_string(),
        baseline_avg: format_number(d.crop_yield.baseline_mean, 2),
        vs_baseline: d.crop_yield.vs_baseline.clone(),
    }]
}

pub fn rainfall_rows(d: &Dashboard) -> Vec<RainfallStatusRow> {
    d.rainfall_status
        .iter()
        .map(|r| RainfallStatusRow {
            month: r.label.clone(),
            rainfall: format!("{} mm", format_number(r.rainfall, 1)),
            status: r.status.clone(),
        })
        .collect()
}

pub fn season_rows(changes: &[SeasonChange]) -> Vec<SeasonComparisonRow> {
    changes
        .iter()
        .map(|c| SeasonComparisonRow {
            season: c.season.clone(),
            reference: format_number(c.reference, 1),
            current: format_number(c.current, 1),
            change_pct: format_signed(c.percent_change, 1),
            trend: c.trend.clone(),
        })
        .collect()
}

pub fn share_rows(changes: &[ShareChange]) -> Vec<ShareChangeRow> {
    changes
        .iter()
        .map(|c| ShareChangeRow {
            season: c.season.clone(),
            reference_share: format!("{}%", format_number(c.reference_share, 1)),
            current_share: format!("{}%", format_number(c.current_share, 1)),
            change: format!("{}%", format_signed(c.change, 1)),
            trend: c.trend.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::table;

    fn sample() -> DistrictTable {
        let cols = [
            "precip_flux_6",
            "precip_flux_7",
            "precip_flux_10",
            "temp_6",
            "temp_7",
            "humidity_6",
        ];
        table(
            &cols,
            &[
                (2014, 1.0, &[100.0, 100.0, 20.0, 28.0, 29.0, 80.0]),
                (2015, 2.0, &[100.0, 100.0, 20.0, 28.0, 29.0, 80.0]),
                (2016, 3.0, &[100.0, 100.0, 20.0, 28.0, 29.0, 80.0]),
                (2017, 4.0, &[100.0, 100.0, 20.0, 28.0, 29.0, 80.0]),
                (2018, 5.0, &[100.0, 100.0, 20.0, 28.0, 29.0, 80.0]),
                (2019, 2.5, &[150.0, 70.0, 20.0, 30.0, 31.0, 85.0]),
            ],
        )
    }

    #[test]
    fn dashboard_for_a_year() {
        let d = build_dashboard(&sample(), 2019, &EngineConfig::default()).unwrap();
        assert_eq!(d.district, "Testpur");
        assert_eq!(d.baseline_years, 5);
        assert_eq!(d.crop_yield.status, YieldStatus::Moderate);
        // 2.5 against a 2015-2019 mean of 3.3
        assert_eq!(d.crop_yield.vs_baseline, "Below average");
        assert!(d.monsoon.warning);

        let statuses: Vec<&str> = d.rainfall_status.iter().map(|r| r.status.as_str()).collect();
        // baseline 2015-2019 includes 2019 itself: June mean 110, July 94
        assert_eq!(statuses, ["High", "Low", "Normal"]);

        let prefixes: Vec<&str> = d.climate.iter().map(|v| v.prefix.as_str()).collect();
        assert_eq!(prefixes, ["temp", "humidity", "precip_flux"]);
        assert_eq!(d.climate[0].label, "Temperature (°C)");

        assert_eq!(d.accumulated_rainfall.current.last().unwrap().value, 240.0);
        assert_eq!(d.season_totals.get("Monsoon"), Some(220.0));
        assert!(d.vs_previous_year.is_some());
        assert!(d.share_vs_history.is_some());
        assert_eq!(d.share_trend.len(), 6);
        assert_eq!(d.summary.len(), 6);
    }

    #[test]
    fn first_year_has_no_previous_tables() {
        let d = build_dashboard(&sample(), 2014, &EngineConfig::default()).unwrap();
        assert!(d.vs_previous_year.is_none());
        assert!(d.share_vs_previous_year.is_none());
        assert!(d.share_vs_history.is_none());
        assert!(!d.monsoon.warning);
    }

    #[test]
    fn empty_baseline_renders_na() {
        let cfg = EngineConfig {
            baseline_start: 1990,
            baseline_end: 1995,
            ..EngineConfig::default()
        };
        let d = build_dashboard(&sample(), 2019, &cfg).unwrap();
        assert_eq!(d.baseline_years, 0);
        assert_eq!(yield_rows(&d)[0].baseline_avg, "N/A");
        let rows = season_rows(&d.vs_baseline);
        assert_eq!(rows[0].reference, "N/A");
        assert_eq!(rows[0].trend, "no change");
        assert!(d.rainfall_status.iter().all(|r| r.status == "Normal"));
    }

    #[test]
    fn formatted_rows() {
        let d = build_dashboard(&sample(), 2019, &EngineConfig::default()).unwrap();
        let rows = rainfall_rows(&d);
        assert_eq!(rows[0].month, "June");
        assert_eq!(rows[0].rainfall, "150.0 mm");
        let shares = share_rows(d.share_vs_previous_year.as_ref().unwrap());
        assert!(shares[0].current_share.ends_with('%'));
    }

    #[test]
    fn rebuilding_is_identical() {
        let t = sample();
        let cfg = EngineConfig::default();
        let a = serde_json::to_string(&build_dashboard(&t, 2019, &cfg).unwrap()).unwrap();
        let b = serde_json::to_string(&build_dashboard(&t, 2019, &cfg).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
