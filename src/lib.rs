// Derived climate and yield metrics for a district dashboard.
//
// A `DistrictTable` holds one row per year of monthly climate variables
// and crop yield. The engine modules turn it into month series, baseline
// means, deviation buckets, season totals and shares, year-over-year
// comparisons and a monsoon anomaly flag. Every function is pure over an
// immutable table; `cache::DistrictCache` shares loaded tables.
pub mod baseline;
pub mod cache;
pub mod compare;
pub mod config;
pub mod deviation;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod seasons;
pub mod series;
pub mod summary;
pub mod types;
pub mod util;
pub mod warning;

pub use config::EngineConfig;
pub use error::EngineError;
pub use reports::{build_dashboard, Dashboard};
pub use types::{DistrictTable, Schema, YearRow};
