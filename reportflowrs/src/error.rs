use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Report metadata is unusable; raised before any query runs.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A single record or lookup could not be read.
    #[error("data access error: {0}")]
    DataAccess(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("report build cancelled")]
    Cancelled,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("config error: {0}")]
    Config(String),
    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] duckdb::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    /// Localizable message key carried to the caller.
    pub fn message_key(&self) -> String {
        match self {
            ReportError::Configuration(key) => key.clone(),
            ReportError::Cancelled => "@Cancelled@".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the build must abort rather than skip the current record.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ReportError::DataAccess(_))
    }
}
