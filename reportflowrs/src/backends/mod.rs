//! Execution backends.
//!
//! Each backend is implemented in its own file and gated behind a feature flag.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ReportflowConfig, ResolvedReportConfig};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::executor::RecordStream;
use crate::value::ParamValue;

/// Execution collaborator for built report queries.
#[async_trait]
pub trait BackendConnection: Send + Sync {
    fn dialect(&self) -> &(dyn Dialect + Send + Sync);

    /// Run `sql` with positional `params` and stream its records.
    ///
    /// An error here means the query itself could not run and is fatal;
    /// unreadable records surface through the stream instead.
    async fn execute(&self, sql: &str, params: &[ParamValue]) -> Result<Box<dyn RecordStream>>;

    /// Run a `SELECT COUNT(*)` query and return the single count.
    async fn count(&self, sql: &str, params: &[ParamValue]) -> Result<u64>;
}

/// Connections keyed by data source name, plus the loaded configuration.
#[derive(Clone, Default)]
pub struct ConnectionManager {
    connections: HashMap<String, Arc<dyn BackendConnection>>,
    config: Option<ReportflowConfig>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            config: None,
        }
    }

    pub fn with_config(config: ReportflowConfig) -> Self {
        Self {
            connections: HashMap::new(),
            config: Some(config),
        }
    }

    pub fn config(&self) -> Option<&ReportflowConfig> {
        self.config.as_ref()
    }

    /// Defaults merged with the per-report overrides of `report_name`.
    pub fn config_for(&self, report_name: &str) -> ResolvedReportConfig {
        match &self.config {
            Some(cfg) => cfg.for_report(report_name),
            None => ReportflowConfig::default().for_report(report_name),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, conn: Arc<dyn BackendConnection>) {
        self.connections.insert(name.into(), conn);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn BackendConnection>> {
        self.connections.get(name)
    }
}

#[cfg(feature = "duckdb")]
mod duckdb;
#[cfg(feature = "duckdb")]
pub use duckdb::DuckDbConnection;
