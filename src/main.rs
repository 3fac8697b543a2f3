// Entry point and console flow.
//
// Either renders one dashboard for `--district` and `--year`, or runs a
// small menu: pick a district, pick a year, generate the dashboard and its
// exports, repeat. District tables are loaded once and reused.
use agro_dashboard::cache::{init_global, DistrictCache};
use agro_dashboard::config::{SEASONS, VARIABLES};
use agro_dashboard::output::{export_dashboard, preview_table, render_table};
use agro_dashboard::reports::{rainfall_rows, season_rows, share_rows, yield_rows};
use agro_dashboard::summary::summary_document;
use agro_dashboard::util::{format_int, format_number, format_signed};
use agro_dashboard::{build_dashboard, EngineConfig};
use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "agro-dashboard",
    version,
    about = "District climate and crop yield dashboard"
)]
struct Cli {
    /// Directory with one CSV file per district
    #[arg(long, default_value = "data")]
    data: PathBuf,

    #[arg(long)]
    district: Option<String>,

    #[arg(long)]
    year: Option<i32>,

    /// JSON file with engine settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where exported tables and summaries are written
    #[arg(long, default_value = "reports")]
    out: PathBuf,

    #[arg(long)]
    baseline_start: Option<i32>,

    #[arg(long)]
    baseline_end: Option<i32>,

    #[arg(long)]
    state: Option<String>,
}

#[derive(Default)]
struct Selection {
    district: Option<String>,
    year: Option<i32>,
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Print a numbered list and return the chosen index.
fn choose<T: std::fmt::Display>(title: &str, items: &[T]) -> Option<usize> {
    println!("{}", title);
    for (i, item) in items.iter().enumerate() {
        println!("[{}] {}", i + 1, item);
    }
    match read_line("Enter choice: ").parse::<usize>() {
        Ok(n) if (1..=items.len()).contains(&n) => Some(n - 1),
        _ => {
            println!("Invalid choice.\n");
            None
        }
    }
}

fn handle_choose_district(cache: &DistrictCache, sel: &mut Selection) -> anyhow::Result<()> {
    let districts = cache.districts()?;
    if districts.is_empty() {
        println!("No district files found in {}.\n", cache.dir().display());
        return Ok(());
    }
    if let Some(idx) = choose("Select District:", &districts) {
        let name = districts[idx].clone();
        // Loads the table now so a bad file is reported straight away.
        let table = cache.get(&name)?;
        println!(
            "{}: {} years on record ({}–{})\n",
            name,
            format_int(table.rows().len()),
            table.min_year().unwrap_or_default(),
            table.max_year().unwrap_or_default()
        );
        sel.district = Some(name);
        sel.year = None;
    }
    Ok(())
}

fn handle_choose_year(cache: &DistrictCache, sel: &mut Selection) -> anyhow::Result<()> {
    let Some(district) = sel.district.as_deref() else {
        println!("Error: choose a district first (option 1).\n");
        return Ok(());
    };
    let years = cache.get(district)?.years();
    if let Some(idx) = choose("Select Year:", &years) {
        sel.year = Some(years[idx]);
        println!();
    }
    Ok(())
}

fn run_dashboard(
    cache: &DistrictCache,
    district: &str,
    year: i32,
    cfg: &EngineConfig,
    out: &Path,
) -> anyhow::Result<()> {
    let table = cache.get(district)?;
    if !table.contains_year(year) {
        bail!("{} has no data for {}", district, year);
    }
    let d = build_dashboard(&table, year, cfg)?;

    println!("{}, {} - Farmer Dashboard for {}\n", d.district, d.state, d.year);

    preview_table("Yield Status", None, &yield_rows(&d), 1);

    if d.monsoon.warning {
        println!("Warning: significant deviation in monsoon climate detected!\n");
    } else {
        println!("No abnormal weather during monsoon months.\n");
    }

    println!("Season Rainfall Share");
    for s in d.season_shares.iter() {
        println!("  {}: {}%", s.season, format_number(s.value, 1));
    }
    println!();

    let baseline = cfg.baseline_label();
    if let Some(prev) = &d.vs_previous_year {
        let note = format!("{} → {}", year - 1, year);
        preview_table("Season Rainfall vs Previous Year", Some(&note), &season_rows(prev), 10);
    }
    preview_table(
        "Season Rainfall vs Baseline",
        Some(&format!("Average {}", baseline)),
        &season_rows(&d.vs_baseline),
        10,
    );
    if let Some(prev) = &d.share_vs_previous_year {
        preview_table("Season Share vs Previous Year", None, &share_rows(prev), 10);
    }
    if let Some(hist) = &d.share_vs_history {
        let note = format!("Average of all years up to {}", year - 1);
        preview_table("Season Share vs History", Some(&note), &share_rows(hist), 10);
    }

    preview_table(
        "Monthly Rainfall Status",
        Some(&format!("Against {} average", baseline)),
        &rainfall_rows(&d),
        12,
    );

    println!("Yield vs District Average ({})", baseline);
    println!(
        "  Your yield: {} tons/ha, district average: {} tons/ha\n",
        format_number(d.crop_yield.value, 2),
        format_number(d.crop_yield.baseline_mean, 2)
    );

    for v in &d.climate {
        if !VARIABLES.iter().any(|(p, _)| *p == v.prefix) {
            continue;
        }
        let line: Vec<String> = v
            .current
            .iter()
            .map(|m| format!("{} {}", m.label, format_number(m.value, 1)))
            .collect();
        println!("{}: {}", v.label, line.join(", "));
    }
    println!();

    if let (Some(cur), Some(avg)) = (
        d.accumulated_rainfall.current.last(),
        d.accumulated_rainfall.baseline.last(),
    ) {
        println!(
            "Accumulated rainfall by {}: {} (average {}, {})\n",
            cur.label,
            format_number(cur.value, 1),
            format_number(avg.value, 1),
            format_signed(cur.value - avg.value, 1)
        );
    }

    let summary = summary_document(&table, &d.state, year, &SEASONS)?;
    println!("{}", summary);

    let written = export_dashboard(out, &d, &summary)
        .with_context(|| format!("exporting to {}", out.display()))?;
    println!("(Exported {} files to {})\n", written.len(), out.display());
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(y) = cli.baseline_start {
        cfg.baseline_start = y;
    }
    if let Some(y) = cli.baseline_end {
        cfg.baseline_end = y;
    }
    if let Some(s) = &cli.state {
        cfg.state = s.clone();
    }
    Ok(cfg)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    let cache = init_global(&cli.data);
    info!("data directory: {}", cache.dir().display());

    if let (Some(district), Some(year)) = (&cli.district, cli.year) {
        return run_dashboard(cache, district, year, &cfg, &cli.out);
    }

    let mut sel = Selection {
        district: cli.district.clone(),
        year: cli.year,
    };
    loop {
        println!("State: {}", cfg.state);
        println!(
            "District: {}   Year: {}",
            sel.district.as_deref().unwrap_or("-"),
            sel.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())
        );
        println!("[1] Select district");
        println!("[2] Select year");
        println!("[3] Generate dashboard");
        println!("[4] List districts");
        println!("[5] Exit\n");
        let result = match read_line("Enter choice: ").as_str() {
            "1" => handle_choose_district(cache, &mut sel),
            "2" => handle_choose_year(cache, &mut sel),
            "3" => match (sel.district.clone(), sel.year) {
                (Some(d), Some(y)) => run_dashboard(cache, &d, y, &cfg, &cli.out),
                _ => {
                    println!("Error: select a district and a year first.\n");
                    Ok(())
                }
            },
            "4" => cache.districts().map_err(anyhow::Error::from).map(|names| {
                println!("{}\n", render_districts(&names));
            }),
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 1 to 5.\n");
                Ok(())
            }
        };
        if let Err(e) = result {
            eprintln!("Error: {:#}\n", e);
        }
    }
    Ok(())
}

fn render_districts(names: &[String]) -> String {
    #[derive(tabled::Tabled, Clone)]
    struct DistrictRow {
        #[tabled(rename = "District")]
        name: String,
    }
    let rows: Vec<DistrictRow> = names
        .iter()
        .map(|n| DistrictRow { name: n.clone() })
        .collect();
    render_table(&rows, rows.len().max(1))
}
