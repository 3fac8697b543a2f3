use agro_dashboard::cache::DistrictCache;
use agro_dashboard::config::SEASONS;
use agro_dashboard::loader::{load_all_districts, load_district};
use agro_dashboard::output::export_dashboard;
use agro_dashboard::summary::summary_document;
use agro_dashboard::{build_dashboard, EngineConfig, EngineError};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

const MONTHS: [u8; 7] = [6, 7, 8, 9, 10, 11, 12];

/// A district CSV covering 2010..=2020 with steady climate, one wet year
/// and one incomplete row.
fn district_csv() -> String {
    let mut header = vec!["year".to_string(), "yield".to_string()];
    for prefix in ["temp", "humidity", "precip_flux"] {
        for m in MONTHS {
            header.push(format!("{}_{}", prefix, m));
        }
    }
    let mut out = header.join(",");
    out.push('\n');
    for year in 2010..=2020 {
        let crop_yield = 1.5 + (year - 2010) as f64 * 0.2;
        let rain = if year == 2018 { 180.0 } else { 100.0 };
        let mut cells = vec![year.to_string(), format!("{:.2}", crop_yield)];
        cells.extend(MONTHS.iter().map(|_| "28.0".to_string()));
        cells.extend(MONTHS.iter().map(|_| "80".to_string()));
        cells.extend(MONTHS.iter().map(|m| {
            if *m >= 10 {
                "20.0".to_string()
            } else {
                format!("{:.1}", rain)
            }
        }));
        writeln!(out, "{}", cells.join(",")).unwrap();
    }
    // incomplete: empty yield
    let mut partial = vec!["2021".to_string(), String::new()];
    partial.extend((0..21).map(|_| "1.0".to_string()));
    writeln!(out, "{}", partial.join(",")).unwrap();
    out
}

fn write_district(dir: &Path, name: &str) {
    std::fs::write(dir.join(format!("{}.csv", name)), district_csv()).unwrap();
}

#[test]
fn loads_every_district_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_district(dir.path(), "Jorhat");
    write_district(dir.path(), "Barpeta");
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let all = load_all_districts(dir.path()).unwrap();
    assert_eq!(all.keys().cloned().collect::<Vec<_>>(), ["Barpeta", "Jorhat"]);

    let (table, report) = load_district(dir.path().join("Jorhat.csv")).unwrap();
    assert_eq!(report.total_rows, 12);
    assert_eq!(report.kept_rows, 11);
    assert_eq!(report.dropped_rows, 1);
    assert_eq!(table.min_year(), Some(2010));
    assert_eq!(table.max_year(), Some(2020));
    assert!(!table.contains_year(2021));
}

#[test]
fn cache_loads_once_and_shares() {
    let dir = tempfile::tempdir().unwrap();
    write_district(dir.path(), "Jorhat");
    let cache = DistrictCache::new(dir.path());

    assert_eq!(cache.districts().unwrap(), ["Jorhat"]);
    assert!(!cache.is_cached("Jorhat"));
    let a = cache.get("Jorhat").unwrap();
    assert!(cache.is_cached("Jorhat"));
    let b = cache.get("Jorhat").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let err = cache.get("Nowhere").unwrap_err();
    assert!(err.is_precondition());
    assert!(matches!(err, EngineError::DistrictNotFound(_)));
}

#[test]
fn cache_serves_concurrent_readers() {
    let dir = tempfile::tempdir().unwrap();
    write_district(dir.path(), "Jorhat");
    let cache = Arc::new(DistrictCache::new(dir.path()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || cache.get("Jorhat").unwrap().years().len())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 11);
    }
}

#[test]
fn dashboard_flags_wet_year() {
    let dir = tempfile::tempdir().unwrap();
    write_district(dir.path(), "Jorhat");
    let cache = DistrictCache::new(dir.path());
    let table = cache.get("Jorhat").unwrap();
    let cfg = EngineConfig::default();

    let wet = build_dashboard(&table, 2018, &cfg).unwrap();
    assert!(wet.monsoon.warning);
    let prev = wet.vs_previous_year.as_ref().unwrap();
    assert_eq!(prev[0].season, "Monsoon");
    assert_eq!(prev[0].trend, "increase");
    assert_eq!(prev[1].trend, "no change");

    let calm = build_dashboard(&table, 2016, &cfg).unwrap();
    assert!(!calm.monsoon.warning);

    // Same inputs, same output.
    assert_eq!(build_dashboard(&table, 2018, &cfg).unwrap(), wet);

    let err = build_dashboard(&table, 2030, &cfg).unwrap_err();
    assert!(err.is_precondition());
}

#[test]
fn exports_tables_json_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_district(dir.path(), "Jorhat");
    let out = dir.path().join("out");
    let cache = DistrictCache::new(dir.path());
    let table = cache.get("Jorhat").unwrap();
    let cfg = EngineConfig::default();

    let d = build_dashboard(&table, 2018, &cfg).unwrap();
    let summary = summary_document(&table, &cfg.state, 2018, &SEASONS).unwrap();
    let written = export_dashboard(&out, &d, &summary).unwrap();
    assert_eq!(written.len(), 6);
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
    }

    let csv = std::fs::read_to_string(out.join("Jorhat_2018_season_vs_previous_year.csv")).unwrap();
    assert!(csv.starts_with("Season,Reference,Current,ChangePct,Trend"));
    assert!(csv.contains("Monsoon"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("Jorhat_2018_dashboard.json")).unwrap())
            .unwrap();
    assert_eq!(json["district"], "Jorhat");
    assert_eq!(json["year"], 2018);
    assert!(json["generated_at"].is_string());

    let text = std::fs::read_to_string(out.join("Jorhat_2018_summary.txt")).unwrap();
    assert!(text.starts_with("Farmer Summary Report - Jorhat, Assam - 2018"));
    assert!(text.contains("Monsoon rainfall has increased by 320.0 mm compared to last year."));
    assert!(text.is_ascii());
}

#[test]
fn first_year_exports_without_previous_tables() {
    let dir = tempfile::tempdir().unwrap();
    write_district(dir.path(), "Jorhat");
    let cache = DistrictCache::new(dir.path());
    let table = cache.get("Jorhat").unwrap();
    let d = build_dashboard(&table, 2010, &EngineConfig::default()).unwrap();
    let written = export_dashboard(dir.path().join("out"), &d, "summary").unwrap();
    // only the baseline table, json and summary
    assert_eq!(written.len(), 3);
}
