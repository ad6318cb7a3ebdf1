//! DuckDB backend implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use duckdb::types::{TimeUnit, Value as DuckValue};
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};

use crate::config::DuckDbConfig;
use crate::dialect::{Dialect, DuckDbDialect};
use crate::error::{ReportError, Result};
use crate::executor::{duck_value_to_cell, BufferedRecords, Record, RecordStream};
use crate::value::{CellValue, ParamValue};

use super::BackendConnection;

/// Pooled DuckDB database implementing the backend trait.
#[derive(Clone)]
pub struct DuckDbConnection {
    database_path: PathBuf,
    dialect: DuckDbDialect,
    limiter: Arc<Semaphore>,
    pool: Arc<Mutex<Vec<duckdb::Connection>>>,
}

impl DuckDbConnection {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_config(path, &DuckDbConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: &DuckDbConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        tracing::info!(
            path = %path.display(),
            max_concurrency = config.max_concurrency,
            "creating DuckDB connection"
        );
        Self {
            database_path: path,
            dialect: DuckDbDialect,
            limiter: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            pool: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn acquire_slot(&self) -> Result<SemaphorePermit<'_>> {
        if self.limiter.available_permits() == 0 {
            tracing::debug!("all DuckDB slots in use, waiting for permit");
        }
        self.limiter
            .acquire()
            .await
            .map_err(|e| ReportError::Execution(format!("limiter closed: {e}")))
    }

    async fn checkout_connection(&self) -> Result<duckdb::Connection> {
        let mut guard = self.pool.lock().await;
        if let Some(conn) = guard.pop() {
            let pool_size = guard.len();
            drop(guard);
            tracing::trace!(pool_remaining = pool_size, "reusing pooled DuckDB connection");
            return Ok(conn);
        }
        drop(guard);
        tracing::debug!(path = %self.database_path.display(), "opening new DuckDB connection");
        duckdb::Connection::open(self.database_path.clone())
            .map_err(|e| ReportError::Execution(format!("open duckdb: {e}")))
    }

    async fn checkin_connection(&self, conn: duckdb::Connection) {
        self.pool.lock().await.push(conn);
    }

    /// Run `work` on a pooled connection off the async runtime.
    async fn with_connection<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&duckdb::Connection) -> Result<T> + Send + 'static,
    {
        let _permit = self.acquire_slot().await?;
        let conn = self.checkout_connection().await?;
        let (result, conn) = tokio::task::spawn_blocking(move || {
            let result = work(&conn);
            (result, conn)
        })
        .await
        .map_err(|e| ReportError::Execution(format!("task join error: {e}")))?;
        self.checkin_connection(conn).await;
        result
    }
}

fn to_duck_value(value: &ParamValue) -> DuckValue {
    match value {
        ParamValue::Null => DuckValue::Null,
        ParamValue::Text(s) => DuckValue::Text(s.clone()),
        ParamValue::Integer(i) => DuckValue::BigInt(*i),
        ParamValue::Number(n) => n.to_f64().map(DuckValue::Double).unwrap_or(DuckValue::Null),
        ParamValue::Boolean(b) => DuckValue::Boolean(*b),
        ParamValue::Timestamp(ts) => {
            DuckValue::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
        }
    }
}

/// Reads every column of one row. An unreadable column becomes null and the
/// rest of the record is kept.
fn read_record<E, F>(column_names: &Arc<Vec<String>>, mut read: F) -> Record
where
    E: std::fmt::Display,
    F: FnMut(usize) -> std::result::Result<DuckValue, E>,
{
    let mut values = Vec::with_capacity(column_names.len());
    for (idx, name) in column_names.iter().enumerate() {
        match read(idx) {
            Ok(value) => values.push(duck_value_to_cell(value)),
            Err(e) => {
                tracing::warn!(column = %name, error = %e, "unreadable column, keeping partial record");
                values.push(CellValue::Null);
            }
        }
    }
    Record::new(Arc::clone(column_names), values)
}

fn bind(params: &[ParamValue]) -> Vec<DuckValue> {
    params.iter().map(to_duck_value).collect()
}

#[async_trait]
impl BackendConnection for DuckDbConnection {
    fn dialect(&self) -> &(dyn Dialect + Send + Sync) {
        &self.dialect
    }

    async fn execute(&self, sql: &str, params: &[ParamValue]) -> Result<Box<dyn RecordStream>> {
        let sql = sql.to_string();
        let values = bind(params);
        let records = self
            .with_connection(move |conn| -> Result<BufferedRecords> {
                let start = Instant::now();
                let mut stmt = conn.prepare(&sql)?;
                let mut rows_iter = stmt.query(duckdb::params_from_iter(values))?;
                let stmt_ref = rows_iter
                    .as_ref()
                    .ok_or_else(|| ReportError::Execution("statement missing".to_string()))?;
                let mut column_names = Vec::new();
                for idx in 0..stmt_ref.column_count() {
                    let name = stmt_ref
                        .column_name(idx)
                        .map_err(|e| ReportError::Execution(e.to_string()))?;
                    column_names.push(name.to_string());
                }
                let column_names = Arc::new(column_names);

                let mut records = Vec::new();
                loop {
                    let row = match rows_iter.next() {
                        Ok(Some(row)) => row,
                        Ok(None) => break,
                        Err(e) => {
                            records.push(Err(ReportError::DataAccess(e.to_string())));
                            break;
                        }
                    };
                    let record = read_record(&column_names, |idx| {
                        row.get_ref(idx).map(|value| value.to_owned())
                    });
                    records.push(Ok(record));
                }

                tracing::debug!(
                    rows = records.len(),
                    columns = column_names.len(),
                    ms = start.elapsed().as_millis(),
                    "duckdb execute"
                );
                Ok(BufferedRecords::from_results(records))
            })
            .await?;
        Ok(Box::new(records))
    }

    async fn count(&self, sql: &str, params: &[ParamValue]) -> Result<u64> {
        let sql = sql.to_string();
        let values = bind(params);
        self.with_connection(move |conn| -> Result<u64> {
            let start = Instant::now();
            let mut stmt = conn.prepare(&sql)?;
            let total: i64 = stmt.query_row(duckdb::params_from_iter(values), |row| row.get(0))?;
            tracing::debug!(total, ms = start.elapsed().as_millis(), "duckdb count");
            Ok(total.max(0) as u64)
        })
        .await
    }
}
