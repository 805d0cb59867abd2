//! Configuration file handling.
//!
//! Settings come from an optional `legal_cases.toml`; CLI flags override
//! whatever the file says.

use crate::cli::{Args, OutputFormat};
use crate::loader::{LoadOptions, DEFAULT_SOURCE_URL};
use crate::util::default_date_formats;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "legal_cases.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the case data lives and how to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// CSV export URL or local path.
    #[serde(default = "default_location")]
    pub location: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// chrono formats tried in order for `Received Date`.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            timeout_seconds: default_timeout(),
            date_formats: default_date_formats(),
        }
    }
}

fn default_location() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_target")]
    pub annual_target: f64,

    /// Filtered rows shown in the console preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            annual_target: default_target(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_target() -> f64 {
    2000.0
}

fn default_preview_rows() -> usize {
    10
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Export directory; nothing is written when unset.
    #[serde(default)]
    pub dir: Option<String>,

    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Returns `Ok(None)` when there is no config file in the working directory.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref source) = args.source {
            self.source.location = source.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
        if let Some(target) = args.target {
            self.dashboard.annual_target = target;
        }
        if let Some(rows) = args.preview_rows {
            self.dashboard.preview_rows = rows;
        }
        if let Some(ref dir) = args.output_dir {
            self.output.dir = Some(dir.display().to_string());
        }
        if let Some(format) = args.format {
            self.output.format = format;
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            timeout: Duration::from_secs(self.source.timeout_seconds),
            date_formats: self.source.date_formats.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.dashboard.annual_target.is_finite() || self.dashboard.annual_target < 0.0 {
            return Err(format!(
                "annual_target must be zero or more (got {})",
                self.dashboard.annual_target
            ));
        }
        if self.source.date_formats.is_empty() {
            return Err("date_formats must list at least one format".to_string());
        }
        Ok(())
    }

    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.location, DEFAULT_SOURCE_URL);
        assert_eq!(config.dashboard.annual_target, 2000.0);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert!(config.output.dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[source]
location = "cases.csv"
date_formats = ["%d/%m/%Y"]

[dashboard]
annual_target = 1500
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.source.location, "cases.csv");
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.source.date_formats, vec!["%d/%m/%Y"]);
        assert_eq!(config.dashboard.annual_target, 1500.0);
        assert_eq!(config.dashboard.preview_rows, 10);
    }

    #[test]
    fn test_args_override_file() {
        let mut config = Config::default();
        let args = Args::try_parse_from([
            "legal_cases_report",
            "--source",
            "local.csv",
            "--target",
            "250",
            "--output-dir",
            "out",
            "--format",
            "json",
        ])
        .unwrap();
        config.merge_with_args(&args);
        assert_eq!(config.source.location, "local.csv");
        assert_eq!(config.dashboard.annual_target, 250.0);
        assert_eq!(config.output.dir.as_deref(), Some("out"));
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_validate_rejects_negative_target() {
        let mut config = Config::default();
        config.dashboard.annual_target = -1.0;
        assert!(config.validate().is_err());
        config.dashboard.annual_target = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[dashboard]"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.dashboard.preview_rows, 10);
    }
}
