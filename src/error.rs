use thiserror::Error;

/// Everything that can abort a load → filter → aggregate cycle.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("failed to fetch case data from {location}: {reason}")]
    DataFetch { location: String, reason: String },
    #[error("malformed case data: {0}")]
    DataFormat(String),
    #[error("annual target must be greater than zero (got {0})")]
    InvalidTarget(f64),
    #[error("no case data loaded; load the data first")]
    NoData,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    pub fn fetch(location: &str, reason: impl ToString) -> Self {
        DashboardError::DataFetch {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}
