use thiserror::Error;

/// Failures surfaced by the engine and its data source.
///
/// Empty baseline or trailing windows are not represented here: they
/// degrade to NaN values which the presentation layer renders as "N/A".
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Year {year} not present for district {district}")]
    YearNotFound { district: String, year: i32 },

    #[error("District not found: {0}")]
    DistrictNotFound(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// True for the two precondition violations callers are expected to
    /// prevent by only offering known districts and years.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EngineError::YearNotFound { .. } | EngineError::DistrictNotFound(_)
        )
    }
}
