// Fixed constants and tunable engine settings.
//
// The constants here are tuned together: thresholds were calibrated
// against deviations that include `EPSILON` in the denominator, so it is
// never dropped even when the reference is non-zero.
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smoothing term added to every relative-deviation denominator.
pub const EPSILON: f64 = 1e-5;

/// Observed season months, June through December.
pub const MONTHS: [u8; 7] = [6, 7, 8, 9, 10, 11, 12];

pub const YEAR_COLUMN: &str = "year";
pub const YIELD_COLUMN: &str = "yield";

pub const PRECIP_FLUX: &str = "precip_flux";
pub const TEMPERATURE: &str = "temp";

/// Yield below this is "low" for the narrative recommendation.
pub const LOW_YIELD_CUTOFF: f64 = 2.0;
/// Yield below this (and at least `LOW_YIELD_CUTOFF`) is "average".
pub const MODERATE_YIELD_CUTOFF: f64 = 3.0;

/// Display label for a month number in the observed season.
pub fn month_label(month: u8) -> String {
    match month {
        6 => "June".to_string(),
        7 => "July".to_string(),
        8 => "Aug".to_string(),
        9 => "Sept".to_string(),
        10 => "Oct".to_string(),
        11 => "Nov".to_string(),
        12 => "Dec".to_string(),
        m => format!("Month {}", m),
    }
}

/// Climate variables shown on the dashboard, by column prefix.
pub const VARIABLES: [(&str, &str); 7] = [
    ("temp", "Temperature (°C)"),
    ("humidity", "Humidity (%)"),
    ("et0", "ET₀ (mm/day)"),
    ("precip_frac", "Precipitation Fraction"),
    ("precip_flux", "Rainfall (mm/day)"),
    ("tmax", "Max Temp (°C)"),
    ("tmin", "Min Temp (°C)"),
];

pub fn variable_label(prefix: &str) -> &str {
    VARIABLES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, label)| *label)
        .unwrap_or(prefix)
}

/// A named group of months whose rainfall is summed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonDefinition {
    pub name: &'static str,
    pub months: &'static [u8],
}

pub const MONSOON: SeasonDefinition = SeasonDefinition {
    name: "Monsoon",
    months: &[6, 7, 8, 9],
};

pub const POST_MONSOON: SeasonDefinition = SeasonDefinition {
    name: "Post-monsoon",
    months: &[10, 11],
};

pub const SEASONS: [SeasonDefinition; 2] = [MONSOON, POST_MONSOON];

/// Years averaged before the selected year for the monsoon check.
pub const DEFAULT_TRAILING_WINDOW: u32 = 5;
/// Absolute relative deviation above which a monsoon month is flagged.
pub const DEFAULT_MONSOON_THRESHOLD: f64 = 0.25;

/// Tunable settings, loadable from JSON and overridable from the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub state: String,
    pub baseline_start: i32,
    pub baseline_end: i32,
    pub trailing_window: u32,
    pub monsoon_threshold: f64,
    pub rainfall_threshold: f64,
    pub trend_threshold: f64,
    pub share_point_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            state: "Assam".to_string(),
            baseline_start: 2015,
            baseline_end: 2019,
            trailing_window: DEFAULT_TRAILING_WINDOW,
            monsoon_threshold: DEFAULT_MONSOON_THRESHOLD,
            rainfall_threshold: 0.20,
            trend_threshold: 5.0,
            share_point_threshold: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: EngineConfig = serde_json::from_str(&raw)?;
        if cfg.trailing_window == 0 {
            return Err(EngineError::InvalidConfig(
                "trailing_window must be at least 1".to_string(),
            ));
        }
        Ok(cfg)
    }

    pub fn baseline_label(&self) -> String {
        format!("{}–{}", self.baseline_start, self.baseline_end)
    }
}
