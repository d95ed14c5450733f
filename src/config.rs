//! Pipeline settings.
//!
//! Built-in defaults are layered under an optional TOML file and
//! `DICEGAME_*` environment variables (`DICEGAME_QUALITY__MIN_SCORE=80`).

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::quality::Severity;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityConfig,
    pub transform: TransformConfig,
    pub analytics: AnalyticsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Minimum fraction of non-null required fields per table
    pub completeness_threshold: f64,
    /// Score a report needs to pass
    pub min_score: f64,
    pub deductions: Deductions,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            completeness_threshold: 0.95,
            min_score: 90.0,
            deductions: Deductions::default(),
        }
    }
}

/// Points subtracted from the score per finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deductions {
    pub info: f64,
    pub warning: f64,
    pub critical: f64,
}

impl Deductions {
    pub fn for_severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Critical => self.critical,
        }
    }
}

impl Default for Deductions {
    fn default() -> Self {
        Self {
            info: 1.0,
            warning: 5.0,
            critical: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Enumerate every calendar day between the first and last observed date
    pub fill_date_gaps: bool,
    /// Plan end dates in or after this year mean the plan is still active
    pub open_end_sentinel_year: i32,
    /// End date assumed when measuring the duration of an active plan
    pub open_plan_horizon: NaiveDate,
    /// Latest end year the calendar covers; later end dates count as open
    pub max_end_year: i32,
}

impl TransformConfig {
    /// Whether a plan ending on `end` is still active
    pub fn is_open_end(&self, end: NaiveDate) -> bool {
        end.year() >= self.open_end_sentinel_year || self.is_out_of_range(end)
    }

    /// End dates past the calendar range that are not the sentinel
    pub fn is_out_of_range(&self, end: NaiveDate) -> bool {
        end.year() > self.max_end_year && end.year() < self.open_end_sentinel_year
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            fill_date_gaps: true,
            open_end_sentinel_year: 9999,
            open_plan_horizon: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            max_end_year: 2262,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub projection_year: i32,
    pub user_growth_rate: f64,
    pub registration_improvement: f64,
    pub max_registration_rate: f64,
    pub revenue_growth_rate: f64,
    pub transaction_growth_rate: f64,
    pub session_growth_rate: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            projection_year: 2025,
            user_growth_rate: 0.25,
            registration_improvement: 0.15,
            max_registration_rate: 0.80,
            revenue_growth_rate: 0.30,
            transaction_growth_rate: 0.25,
            session_growth_rate: 0.35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional TOML file and the environment.
    ///
    /// Without an explicit path the per-user config file is used when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Settings::default())
            .context("Failed to encode default settings")?;

        let mut builder = config::Config::builder().add_source(defaults);

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(path) = Self::default_config_path() {
                    builder = builder.add_source(config::File::from(path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("DICEGAME")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize settings")
    }

    /// `config.toml` in the platform config directory
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dicegame-warehouse")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.quality.min_score, 90.0);
        assert_eq!(settings.quality.deductions.for_severity(Severity::Critical), 25.0);
        assert!(settings.transform.fill_date_gaps);
        assert_eq!(
            settings.transform.open_plan_horizon,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_open_end_dates() {
        let config = TransformConfig::default();
        let day = |y| NaiveDate::from_ymd_opt(y, 12, 31).unwrap();

        assert!(!config.is_open_end(day(2030)));
        assert!(!config.is_open_end(day(2262)));
        assert!(config.is_open_end(day(2263)));
        assert!(config.is_out_of_range(day(9998)));
        assert!(config.is_open_end(day(9999)));
        assert!(!config.is_out_of_range(day(9999)));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[quality]\nmin_score = 75.0\n\n[quality.deductions]\ncritical = 150.0\n\n[transform]\nfill_date_gaps = false"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.quality.min_score, 75.0);
        assert_eq!(settings.quality.deductions.critical, 150.0);
        // Untouched values keep their defaults
        assert_eq!(settings.quality.deductions.warning, 5.0);
        assert_eq!(settings.quality.completeness_threshold, 0.95);
        assert!(!settings.transform.fill_date_gaps);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/dicegame.toml")));
        assert!(result.is_err());
    }
}
