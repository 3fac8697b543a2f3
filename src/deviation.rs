// Relative deviation and the qualitative buckets built on it.
//
// Every classifier in the crate goes through `relative_deviation` so
// they share one set of numeric semantics.

use crate::config::EPSILON;
use crate::util::quantile;
use serde::Serialize;
use std::fmt;

/// `(current - reference) / (reference + EPSILON)`.
///
/// The epsilon is added even when the reference is non-zero. NaN inputs
/// propagate.
pub fn relative_deviation(current: f64, reference: f64) -> f64 {
    (current - reference) / (reference + EPSILON)
}

/// Position of a value relative to a symmetric band around zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Band {
    Low,
    Normal,
    High,
}

impl Band {
    /// `Low` below `-threshold`, `High` above `+threshold`, else `Normal`.
    /// NaN compares false both ways and lands in `Normal`.
    pub fn of(value: f64, threshold: f64) -> Band {
        if value < -threshold {
            Band::Low
        } else if value > threshold {
            Band::High
        } else {
            Band::Normal
        }
    }
}

/// Threshold plus the label each band is shown with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeWay {
    pub threshold: f64,
    pub low: &'static str,
    pub normal: &'static str,
    pub high: &'static str,
}

impl ThreeWay {
    pub const fn new(threshold: f64, low: &'static str, normal: &'static str, high: &'static str) -> Self {
        ThreeWay {
            threshold,
            low,
            normal,
            high,
        }
    }

    pub fn with_threshold(self, threshold: f64) -> Self {
        ThreeWay { threshold, ..self }
    }

    pub fn label(&self, band: Band) -> &'static str {
        match band {
            Band::Low => self.low,
            Band::Normal => self.normal,
            Band::High => self.high,
        }
    }

    /// Bucket an already computed deviation or change.
    pub fn bucket(&self, value: f64) -> &'static str {
        self.label(Band::of(value, self.threshold))
    }

    /// Bucket the relative deviation of `current` from `reference`.
    pub fn classify(&self, current: f64, reference: f64) -> &'static str {
        self.bucket(relative_deviation(current, reference))
    }
}

/// Monthly rainfall against its baseline mean; a fraction.
pub const RAINFALL_STATUS: ThreeWay = ThreeWay::new(0.20, "Low", "Normal", "High");

/// Yield against the baseline mean yield; a fraction.
pub const YIELD_VS_BASELINE: ThreeWay = ThreeWay::new(0.20, "Below average", "Near average", "Above average");

/// Season total change; a percentage, not a fraction.
pub const SEASON_TREND: ThreeWay = ThreeWay::new(5.0, "decrease", "no change", "increase");

/// Season share change in percentage points.
pub const SHARE_TREND: ThreeWay = ThreeWay::new(1.0, "down", "flat", "up");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum YieldStatus {
    Good,
    Moderate,
    Risk,
}

impl fmt::Display for YieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            YieldStatus::Good => "Good",
            YieldStatus::Moderate => "Moderate",
            YieldStatus::Risk => "Risk",
        };
        f.write_str(s)
    }
}

/// Lower and upper quartile of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub p25: f64,
    pub p75: f64,
}

impl Quartiles {
    pub fn of(series: &[f64]) -> Self {
        Quartiles {
            p25: quantile(series, 0.25),
            p75: quantile(series, 0.75),
        }
    }

    /// `>= p75` is Good, then `<= p25` is Risk, otherwise Moderate.
    pub fn classify(&self, current: f64) -> YieldStatus {
        if current >= self.p75 {
            YieldStatus::Good
        } else if current <= self.p25 {
            YieldStatus::Risk
        } else {
            YieldStatus::Moderate
        }
    }
}

/// Yield status of `current` against the district's full yield history.
pub fn classify_yield(current: f64, history: &[f64]) -> YieldStatus {
    Quartiles::of(history).classify(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_always_applied() {
        let d = relative_deviation(110.0, 100.0);
        assert!(d < 0.1);
        assert!((d - 0.1).abs() < 1e-7);
        // zero reference does not blow up
        assert!(relative_deviation(1.0, 0.0).is_finite());
    }

    #[test]
    fn rainfall_bands() {
        assert_eq!(RAINFALL_STATUS.classify(110.0, 100.0), "Normal");
        assert_eq!(RAINFALL_STATUS.classify(70.0, 100.0), "Low");
        assert_eq!(RAINFALL_STATUS.classify(130.0, 100.0), "High");
    }

    #[test]
    fn band_edges_are_normal() {
        assert_eq!(Band::of(0.2, 0.2), Band::Normal);
        assert_eq!(Band::of(-0.2, 0.2), Band::Normal);
        assert_eq!(Band::of(f64::NAN, 0.2), Band::Normal);
    }

    #[test]
    fn trend_threshold_is_in_percent() {
        assert_eq!(SEASON_TREND.bucket(4.9), "no change");
        assert_eq!(SEASON_TREND.bucket(5.1), "increase");
        assert_eq!(SEASON_TREND.bucket(-6.0), "decrease");
        // a 0.3 fraction is nowhere near 5 percent
        assert_eq!(SEASON_TREND.bucket(0.3), "no change");
    }

    #[test]
    fn with_threshold_keeps_labels() {
        let loose = RAINFALL_STATUS.with_threshold(0.5);
        assert_eq!(loose.classify(70.0, 100.0), "Normal");
        assert_eq!(loose.low, "Low");
    }

    #[test]
    fn yield_quartiles() {
        let history = [1.0, 2.0, 3.0, 4.0, 5.0];
        let q = Quartiles::of(&history);
        assert_eq!(q.p25, 2.0);
        assert_eq!(q.p75, 4.0);
        assert_eq!(classify_yield(4.0, &history), YieldStatus::Good);
        assert_eq!(classify_yield(2.0, &history), YieldStatus::Risk);
        assert_eq!(classify_yield(3.0, &history), YieldStatus::Moderate);
        assert_eq!(YieldStatus::Moderate.to_string(), "Moderate");
    }

    #[test]
    fn flat_history_is_good() {
        // p25 == p75, and Good is checked first
        assert_eq!(classify_yield(2.0, &[2.0, 2.0, 2.0]), YieldStatus::Good);
    }
}
