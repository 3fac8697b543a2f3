use crate::error::EngineError;
use crate::reports::{season_rows, share_rows, Dashboard};
use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<(), EngineError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<(), EngineError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn write_text<P: AsRef<Path>>(path: P, text: &str) -> Result<(), EngineError> {
    std::fs::write(path, text)?;
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows, or `(no rows)`.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
}

#[derive(Debug, Serialize)]
struct DashboardExport<'a> {
    generated_at: DateTime<Local>,
    #[serde(flatten)]
    dashboard: &'a Dashboard,
}

/// Write the comparison tables, the dashboard JSON and the narrative
/// summary into `dir`. Tables that do not apply to the year are skipped.
pub fn export_dashboard<P: AsRef<Path>>(
    dir: P,
    dashboard: &Dashboard,
    summary: &str,
) -> Result<Vec<PathBuf>, EngineError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let stem = format!("{}_{}", dashboard.district, dashboard.year);
    let mut written = Vec::new();

    if let Some(prev) = &dashboard.vs_previous_year {
        let path = dir.join(format!("{}_season_vs_previous_year.csv", stem));
        write_csv(&path, &season_rows(prev))?;
        written.push(path);
    }

    let path = dir.join(format!("{}_season_vs_baseline.csv", stem));
    write_csv(&path, &season_rows(&dashboard.vs_baseline))?;
    written.push(path);

    if let Some(prev) = &dashboard.share_vs_previous_year {
        let path = dir.join(format!("{}_share_vs_previous_year.csv", stem));
        write_csv(&path, &share_rows(prev))?;
        written.push(path);
    }
    if let Some(hist) = &dashboard.share_vs_history {
        let path = dir.join(format!("{}_share_vs_history.csv", stem));
        write_csv(&path, &share_rows(hist))?;
        written.push(path);
    }

    let path = dir.join(format!("{}_dashboard.json", stem));
    let export = DashboardExport {
        generated_at: Local::now(),
        dashboard,
    };
    write_json(&path, &export)?;
    written.push(path);

    let path = dir.join(format!("{}_summary.txt", stem));
    write_text(&path, summary)?;
    written.push(path);

    info!("{} file(s) exported to {}", written.len(), dir.display());
    Ok(written)
}
