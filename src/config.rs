use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::data::aggregate::DEFAULT_TOP_N;

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "SALES_DASHBOARD_CONFIG";
/// Env var overriding [`DashboardConfig::current_file`].
pub const CURRENT_FILE_ENV: &str = "SALES_DASHBOARD_CURRENT";
/// Env var overriding [`DashboardConfig::prior_file`].
pub const PRIOR_FILE_ENV: &str = "SALES_DASHBOARD_PRIOR";

const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Startup settings.  Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Current fiscal-year-to-date sales.
    pub current_file: PathBuf,
    /// Last fiscal year's sales; must have a `Month` column.
    pub prior_file: PathBuf,
    /// Optional header logo (PNG).
    pub logo_file: PathBuf,
    pub title: String,
    /// Groups per top-N chart.
    pub top_n: usize,
    /// Suggested name in the download dialog.
    pub export_file_name: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            current_file: PathBuf::from("ALL_DIVISION_DATA_1ST_SEP_24TH_SEP_25_CBO.xlsx"),
            prior_file: PathBuf::from("LY_FY24_25_CBO_DATA.xlsx"),
            logo_file: PathBuf::from("logo.png"),
            title: "Sales Dashboard".to_string(),
            top_n: DEFAULT_TOP_N,
            export_file_name: "filtered.csv".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file from `SALES_DASHBOARD_CONFIG` or `./dashboard.json` when
    /// present, defaults otherwise; data paths may then be overridden by env.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if explicit.is_some() || path.exists() {
            info!("Reading config from {}", path.display());
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_overrides(
            std::env::var_os(CURRENT_FILE_ENV).map(PathBuf::from),
            std::env::var_os(PRIOR_FILE_ENV).map(PathBuf::from),
        );
        Ok(config)
    }

    fn apply_overrides(&mut self, current: Option<PathBuf>, prior: Option<PathBuf>) {
        if let Some(path) = current {
            self.current_file = path;
        }
        if let Some(path) = prior {
            self.prior_file = path;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_object_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(
            DashboardConfig::from_file(&path).unwrap(),
            DashboardConfig::default()
        );
    }

    #[test]
    fn partial_file_overrides_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(
            &path,
            r#"{ "current_file": "cur.csv", "prior_file": "prior.parquet", "top_n": 5 }"#,
        )
        .unwrap();

        let config = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(config.current_file, PathBuf::from("cur.csv"));
        assert_eq!(config.prior_file, PathBuf::from("prior.parquet"));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.export_file_name, "filtered.csv");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(DashboardConfig::from_file(&path).is_err());
    }

    #[test]
    fn env_paths_override_file_paths() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(Some(PathBuf::from("a.csv")), None);
        assert_eq!(config.current_file, PathBuf::from("a.csv"));
        assert_eq!(config.prior_file, DashboardConfig::default().prior_file);
    }
}
