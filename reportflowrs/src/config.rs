//! Configuration system for Reportflow.
//!
//! Supports TOML-based configuration with global defaults and per-report overrides.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportflowConfig {
    /// Global defaults applied to every report unless overridden.
    pub defaults: GlobalDefaults,

    /// Per-report configuration overrides (keyed by report name).
    #[serde(default)]
    pub reports: HashMap<String, ReportConfig>,
}

/// Global default settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalDefaults {
    pub pagination: PaginationConfig,
    pub locale: LocaleConfig,
    pub financial: FinancialConfig,
    pub duckdb: DuckDbConfig,
}

/// How result pages are bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStrategyKind {
    /// `ROWNUM >= offset AND ROWNUM <= offset + limit` predicate.
    RowNumber,
    /// `LIMIT n OFFSET m` suffix.
    LimitOffset,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Rows per page when a request asks for a limit of 0 (default: 100).
    pub page_size: u64,
    pub strategy: PaginationStrategyKind,
}

/// Locale used by the default column mapping.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Language code used for translated lookups (default: en_US).
    pub language: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    /// chrono format strings.
    pub date_pattern: String,
    pub date_time_pattern: String,
    pub time_pattern: String,
    pub yes_label: String,
    pub no_label: String,
}

/// Temporary table populated by financial report processes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FinancialConfig {
    pub table_name: String,
    pub level_column: String,
    pub sequence_column: String,
}

/// DuckDB-specific configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DuckDbConfig {
    /// Maximum concurrent queries (default: 16).
    pub max_concurrency: usize,
}

/// Per-report configuration (can override globals).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    pub pagination: Option<PaginationConfig>,
    pub locale: Option<LocaleConfig>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            strategy: PaginationStrategyKind::RowNumber,
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: "en_US".to_string(),
            decimal_separator: '.',
            grouping_separator: ',',
            date_pattern: "%m/%d/%Y".to_string(),
            date_time_pattern: "%m/%d/%Y %H:%M:%S".to_string(),
            time_pattern: "%H:%M:%S".to_string(),
            yes_label: "Y".to_string(),
            no_label: "N".to_string(),
        }
    }
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            table_name: "T_Report".to_string(),
            level_column: "LevelNo".to_string(),
            sequence_column: "SeqNo".to_string(),
        }
    }
}

impl Default for DuckDbConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
        }
    }
}

impl ReportflowConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ReportError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| ReportError::Config(format!("failed to parse config: {e}")))
    }

    /// Load from default locations (env var, cwd, user config dir, or defaults).
    ///
    /// Search order:
    /// 1. `REPORTFLOW_CONFIG` environment variable
    /// 2. `./reportflow.toml` (current directory)
    /// 3. `~/.config/reportflow/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("REPORTFLOW_CONFIG") {
            if let Ok(cfg) = Self::from_file(&path) {
                tracing::info!(path = %path, "loaded config from REPORTFLOW_CONFIG");
                return cfg;
            }
        }

        if let Ok(cfg) = Self::from_file("reportflow.toml") {
            tracing::info!("loaded config from ./reportflow.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("reportflow").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }

    /// Get resolved config for a specific report (merges global defaults).
    pub fn for_report(&self, name: &str) -> ResolvedReportConfig {
        ResolvedReportConfig::merge(&self.defaults, self.reports.get(name))
    }
}

/// Fully resolved configuration for one report (no Option fields).
#[derive(Debug, Clone)]
pub struct ResolvedReportConfig {
    pub pagination: PaginationConfig,
    pub locale: LocaleConfig,
    pub financial: FinancialConfig,
}

impl Default for ResolvedReportConfig {
    fn default() -> Self {
        ReportflowConfig::default().for_report("")
    }
}

impl ResolvedReportConfig {
    fn merge(defaults: &GlobalDefaults, override_cfg: Option<&ReportConfig>) -> Self {
        let pagination = override_cfg
            .and_then(|r| r.pagination.clone())
            .unwrap_or_else(|| defaults.pagination.clone());
        let locale = override_cfg
            .and_then(|r| r.locale.clone())
            .unwrap_or_else(|| defaults.locale.clone());
        Self {
            pagination,
            locale,
            financial: defaults.financial.clone(),
        }
    }
}
