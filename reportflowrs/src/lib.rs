pub mod backends;
pub mod config;
pub mod data;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod models;
pub mod pagination;
pub mod query_builder;
pub mod registry;
pub mod runtime;
pub mod sql_ast;
pub mod value;

use std::path::Path;

use crate::error::Result;
use crate::registry::ReportRegistry;

/// Load report definitions and references from `root`.
pub fn load_registry<P: AsRef<Path>>(root: P) -> Result<ReportRegistry> {
    ReportRegistry::load_from_dir(root)
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Returns false when a global subscriber is already set.
pub fn init_tracing() -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

pub use backends::{BackendConnection, ConnectionManager};
#[cfg(feature = "duckdb")]
pub use backends::DuckDbConnection;
pub use config::ReportflowConfig;
pub use data::{Cell, ColumnInfo, ReportInfo, Row, SummaryFunction};
pub use error::{ReportError, Result as ReportResult};
pub use mapper::{ColumnMapping, DefaultMapping, Language, MappingRegistry};
pub use models::{Filter, FilterOperator, ReferenceType, ReportDefinition, ReportItem, ReportRequest};
pub use query_builder::{QueryBuilder, QueryDefinition};
pub use runtime::{run_report, CancellationFlag, ReportOutput};
