// Plain-language season summary for farmers.
//
// Produces the lines of the exported report: yield, rainfall change against
// last year, mean season temperature and a yield-tier recommendation.
use crate::compare::has_prior_year;
use crate::config::{
    SeasonDefinition, LOW_YIELD_CUTOFF, MODERATE_YIELD_CUTOFF, MONSOON, TEMPERATURE,
};
use crate::error::EngineError;
use crate::seasons::seasonal_totals;
use crate::series::extract_values;
use crate::types::DistrictTable;
use crate::util::{format_number, mean};

pub const CLOSING_LINE: &str =
    "This is an automated summary to help you understand your farming season better.";

/// Advice keyed on the yield tier.
pub fn recommendation(crop_yield: f64) -> &'static str {
    if crop_yield < LOW_YIELD_CUTOFF {
        "Yield is low. Try consulting experts and check irrigation or fertilizer issues."
    } else if crop_yield < MODERATE_YIELD_CUTOFF {
        "Yield is average. Keep monitoring rainfall and temperature closely."
    } else {
        "Good yield! Weather conditions seem favorable this season."
    }
}

pub fn report_title(district: &str, state: &str, year: i32) -> String {
    format!("Farmer Summary Report - {}, {} - {}", district, state, year)
}

/// Mean June-December temperature for `year`; NaN without temperature
/// columns.
pub fn mean_season_temperature(table: &DistrictTable, year: i32) -> Result<f64, EngineError> {
    Ok(mean(&extract_values(table, year, TEMPERATURE)?))
}

pub fn summary_lines(
    table: &DistrictTable,
    year: i32,
    seasons: &[SeasonDefinition],
) -> Result<Vec<String>, EngineError> {
    let row = table.year_row(year)?;
    let mut lines = Vec::new();

    lines.push(format!(
        "This year ({}), the crop yield in {} is {} tons per hectare.",
        year,
        table.name(),
        format_number(row.crop_yield, 2)
    ));

    if has_prior_year(table, year) {
        let current = seasonal_totals(table, year, seasons)?;
        let previous = seasonal_totals(table, year - 1, seasons)?;
        for season in current.iter() {
            let before = previous.get(&season.season).unwrap_or(f64::NAN);
            let change = season.value - before;
            let direction = if change > 0.0 { "increased" } else { "decreased" };
            // Only the monsoon sentence names the reference year.
            let suffix = if season.season == MONSOON.name {
                " compared to last year"
            } else {
                ""
            };
            lines.push(format!(
                "{} rainfall has {} by {} mm{}.",
                season.season,
                direction,
                format_number(change.abs(), 1),
                suffix
            ));
        }
    } else {
        lines.push("No previous year data available for rainfall comparison.".to_string());
    }

    let temp = mean_season_temperature(table, year)?;
    lines.push(format!(
        "The average temperature this season was around {}°C.",
        format_number(temp, 1)
    ));

    lines.push(recommendation(row.crop_yield).to_string());
    lines.push(CLOSING_LINE.to_string());
    Ok(lines)
}

/// Strip everything outside printable ASCII so the text survives
/// Latin-1-only document writers; `°C` becomes `C`.
pub fn ascii_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii()).collect()
}

/// Title and body, paragraphs separated by blank lines, ASCII-only.
pub fn summary_document(
    table: &DistrictTable,
    state: &str,
    year: i32,
    seasons: &[SeasonDefinition],
) -> Result<String, EngineError> {
    let lines = summary_lines(table, year, seasons)?;
    let mut doc = report_title(table.name(), state, year);
    doc.push_str("\n\n");
    doc.push_str(&lines.join("\n\n"));
    doc.push('\n');
    Ok(ascii_only(&doc))
}
