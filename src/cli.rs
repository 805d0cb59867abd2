//! Command-line interface argument parsing.

use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

/// Legal cases report - intake statistics from a spreadsheet export
///
/// Loads the case CSV, applies date/category/partner filters and prints
/// breakdowns by partner, category and month, progress toward the annual
/// target, and a comparison with last year.
///
/// Examples:
///   legal_cases_report
///   legal_cases_report --source cases.csv --start 2024-01-01 --end 2024-06-30
///   legal_cases_report --category Housing,Family --partner "Legal Aid" --format json
///   legal_cases_report --interactive
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV export URL or local file path
    #[arg(short, long, value_name = "URL|FILE", env = "LEGAL_CASES_SOURCE")]
    pub source: Option<String>,

    /// Path to configuration file (defaults to ./legal_cases.toml if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// First received date to include (YYYY-MM-DD); defaults to the earliest in the data
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last received date to include (YYYY-MM-DD); defaults to the latest in the data
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Categories to include (comma-separated, repeatable)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub category: Vec<String>,

    /// Partners (Received From) to include (comma-separated, repeatable)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub partner: Vec<String>,

    /// Annual target number of cases
    #[arg(short, long, value_name = "CASES")]
    pub target: Option<f64>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,

    /// Directory to export CSV/JSON files into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Console output format
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Number of filtered rows to preview
    #[arg(long, value_name = "ROWS")]
    pub preview_rows: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Run the interactive menu instead of a single report
    #[arg(short, long)]
    pub interactive: bool,

    /// Enable verbose logging output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Write a default legal_cases.toml and exit
    #[arg(long)]
    pub init_config: bool,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown tables (default)
    #[default]
    Table,
    /// JSON report on stdout
    Json,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(target) = self.target {
            if !target.is_finite() || target < 0.0 {
                return Err(format!("--target must be zero or more (got {})", target));
            }
        }
        Ok(())
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::ERROR
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters() {
        let args = Args::try_parse_from([
            "legal_cases_report",
            "--start",
            "2024-01-01",
            "--end",
            "2024-06-30",
            "--category",
            "Housing,Family",
            "--category",
            "Debt",
            "--partner",
            "Legal Aid",
        ])
        .unwrap();
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.end, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(args.category, vec!["Housing", "Family", "Debt"]);
        assert_eq!(args.partner, vec!["Legal Aid"]);
        assert!(!args.interactive);
        assert_eq!(args.log_level(), Level::INFO);
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Args::try_parse_from(["legal_cases_report", "--start", "01/02/2024"]).is_err());
    }

    #[test]
    fn test_negative_target_fails_validation() {
        let args = Args::try_parse_from(["legal_cases_report", "--target=-5"]).unwrap();
        assert!(args.validate().is_err());
        let args = Args::try_parse_from(["legal_cases_report", "--target", "0"]).unwrap();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["legal_cases_report", "-v", "-q"]).is_err());
    }
}
