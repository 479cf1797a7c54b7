use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{OlapError, Result};
use crate::time_utils::DEFAULT_DATE_FORMAT;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Star-schema and OLAP cube statistics for company layoff data
#[derive(Parser, Debug, Clone)]
#[command(
    name = "layoffs-olap",
    about = "Star-schema and OLAP cube statistics for company layoff data",
    version
)]
pub struct Settings {
    /// Input CSV file
    #[arg(long, default_value = "layoffs.csv")]
    pub input: PathBuf,

    /// Which outputs to produce
    #[arg(long, default_value = "all", value_parser = ["etl", "cube", "all"])]
    pub view: String,

    /// Write the JSON report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// JSON file with cube parameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// strftime-style format of the `date` column
    #[arg(long)]
    pub date_format: Option<String>,

    /// Number of countries kept in the country × year heat-map
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub top_countries: Option<u32>,

    /// Year sliced by the industry × quarter view
    #[arg(long)]
    pub cube_year: Option<i32>,

    /// Number of industries kept in the industry × quarter view
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub top_industries: Option<u32>,

    /// Industry whose monthly layoffs get a rolling sum
    #[arg(long)]
    pub rolling_industry: Option<String>,

    /// Rolling window size, in available months
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub rolling_window: Option<u32>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Effective log level, with `--debug` taking precedence.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// Whether the star-schema outputs were requested.
    pub fn wants_etl(&self) -> bool {
        matches!(self.view.as_str(), "etl" | "all")
    }

    /// Whether the cube outputs were requested.
    pub fn wants_cube(&self) -> bool {
        matches!(self.view.as_str(), "cube" | "all")
    }

    /// Resolve cube parameters: defaults, then `--config` file, then CLI flags.
    pub fn cube_config(&self) -> Result<CubeConfig> {
        let mut config = match &self.config {
            Some(path) => CubeConfig::load_from(path)?,
            None => CubeConfig::default(),
        };

        if let Some(v) = &self.date_format {
            config.date_format = v.clone();
        }
        if let Some(v) = self.top_countries {
            config.top_countries = v as usize;
        }
        if let Some(v) = self.cube_year {
            config.cube_year = v;
        }
        if let Some(v) = self.top_industries {
            config.top_industries = v as usize;
        }
        if let Some(v) = &self.rolling_industry {
            config.rolling_industry = v.clone();
        }
        if let Some(v) = self.rolling_window {
            config.rolling_window = v as usize;
        }

        config.validate()?;
        Ok(config)
    }
}

// ── CubeConfig ─────────────────────────────────────────────────────────────────

/// Parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    /// Format of the `date` column.
    pub date_format: String,
    /// Countries kept in the heat-map.
    pub top_countries: usize,
    /// Year of the industry × quarter slice.
    pub cube_year: i32,
    /// Industries kept in the industry × quarter slice.
    pub top_industries: usize,
    /// Industry of the rolling series.
    pub rolling_industry: String,
    /// Rolling window length in available months.
    pub rolling_window: usize,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            top_countries: 15,
            cube_year: 2024,
            top_industries: 10,
            rolling_industry: "AI".to_string(),
            rolling_window: 12,
        }
    }
}

impl CubeConfig {
    /// Read a JSON config file. Absent keys keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| OlapError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Reject values no run can work with.
    pub fn validate(&self) -> Result<()> {
        if self.top_countries == 0 {
            return Err(OlapError::Config("top_countries must be at least 1".into()));
        }
        if self.top_industries == 0 {
            return Err(OlapError::Config("top_industries must be at least 1".into()));
        }
        if self.rolling_window == 0 {
            return Err(OlapError::Config("rolling_window must be at least 1".into()));
        }
        if self.date_format.trim().is_empty() {
            return Err(OlapError::Config("date_format must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Settings {
        let mut full = vec!["layoffs-olap"];
        full.extend_from_slice(args);
        Settings::parse_from(full)
    }

    // ── Settings ──────────────────────────────────────────────────────────────

    #[test]
    fn test_settings_defaults() {
        let s = parse(&[]);
        assert_eq!(s.input, PathBuf::from("layoffs.csv"));
        assert_eq!(s.view, "all");
        assert_eq!(s.log_level, "INFO");
        assert!(s.wants_etl());
        assert!(s.wants_cube());
        assert_eq!(s.cube_config().unwrap(), CubeConfig::default());
    }

    #[test]
    fn test_settings_view_selection() {
        let s = parse(&["--view", "etl"]);
        assert!(s.wants_etl());
        assert!(!s.wants_cube());
        let s = parse(&["--view", "cube"]);
        assert!(!s.wants_etl());
        assert!(s.wants_cube());
    }

    #[test]
    fn test_settings_rejects_unknown_view() {
        let result = Settings::try_parse_from(["layoffs-olap", "--view", "sankey"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_rejects_zero_window() {
        let result = Settings::try_parse_from(["layoffs-olap", "--rolling-window", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let s = parse(&["--log-level", "ERROR", "--debug"]);
        assert_eq!(s.effective_log_level(), "DEBUG");
        let s = parse(&["--log-level", "ERROR"]);
        assert_eq!(s.effective_log_level(), "ERROR");
    }

    #[test]
    fn test_cli_overrides_apply() {
        let s = parse(&[
            "--top-countries",
            "5",
            "--cube-year",
            "2023",
            "--rolling-industry",
            "Retail",
            "--rolling-window",
            "3",
            "--date-format",
            "%d/%m/%Y",
        ]);
        let config = s.cube_config().unwrap();
        assert_eq!(config.top_countries, 5);
        assert_eq!(config.cube_year, 2023);
        assert_eq!(config.top_industries, 10);
        assert_eq!(config.rolling_industry, "Retail");
        assert_eq!(config.rolling_window, 3);
        assert_eq!(config.date_format, "%d/%m/%Y");
    }

    // ── CubeConfig ────────────────────────────────────────────────────────────

    #[test]
    fn test_config_file_partial_keys_keep_defaults() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("cube.json");
        std::fs::write(&path, r#"{"cube_year": 2022, "top_industries": 3}"#).unwrap();

        let config = CubeConfig::load_from(&path).unwrap();
        assert_eq!(config.cube_year, 2022);
        assert_eq!(config.top_industries, 3);
        assert_eq!(config.top_countries, 15);
        assert_eq!(config.rolling_industry, "AI");
    }

    #[test]
    fn test_cli_wins_over_config_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("cube.json");
        std::fs::write(&path, r#"{"cube_year": 2022, "rolling_window": 6}"#).unwrap();

        let s = parse(&["--config", path.to_str().unwrap(), "--cube-year", "2021"]);
        let config = s.cube_config().unwrap();
        assert_eq!(config.cube_year, 2021);
        assert_eq!(config.rolling_window, 6);
    }

    #[test]
    fn test_config_file_missing() {
        let err = CubeConfig::load_from(Path::new("/nonexistent/cube.json")).unwrap_err();
        assert!(matches!(err, OlapError::FileRead { .. }));
    }

    #[test]
    fn test_config_file_invalid_json() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("cube.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = CubeConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, OlapError::JsonParse(_)));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = CubeConfig {
            rolling_window: 0,
            ..CubeConfig::default()
        };
        assert!(matches!(config.validate(), Err(OlapError::Config(_))));

        let config = CubeConfig {
            top_countries: 0,
            ..CubeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
