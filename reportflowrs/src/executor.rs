//! Result-set records and the pull-based stream the assembler consumes.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
#[cfg(feature = "duckdb")]
use chrono::NaiveDate;
#[cfg(feature = "duckdb")]
use duckdb::types::{TimeUnit, Value as DuckValue};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::value::CellValue;

/// One result-set row; column lookups ignore case.
#[derive(Debug, Clone)]
pub struct Record {
    columns: Arc<Vec<String>>,
    values: Vec<CellValue>,
}

impl Record {
    pub fn new(columns: Arc<Vec<String>>, values: Vec<CellValue>) -> Self {
        Self { columns, values }
    }

    /// Convenience for tests and in-memory sources.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<CellValue>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self::new(Arc::new(columns), values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))
            .and_then(|idx| self.values.get(idx))
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(CellValue::as_i64)
    }

    pub fn get_decimal(&self, column: &str) -> Option<Decimal> {
        self.get(column).and_then(CellValue::as_decimal)
    }

    pub fn get_string(&self, column: &str) -> Option<String> {
        self.get(column)
            .filter(|value| !value.is_null())
            .map(ToString::to_string)
    }
}

/// Blocking pull over the records of one executed query.
pub trait RecordStream: Send {
    /// `Some(Err(_))` reports a record that could not be read; the
    /// stream may still yield further records afterwards.
    fn next_record(&mut self) -> Option<Result<Record>>;
}

/// Fully materialized result set.
#[derive(Debug, Default)]
pub struct BufferedRecords {
    records: VecDeque<Result<Record>>,
}

impl BufferedRecords {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter().map(Ok).collect(),
        }
    }

    pub fn from_results(records: Vec<Result<Record>>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStream for BufferedRecords {
    fn next_record(&mut self) -> Option<Result<Record>> {
        self.records.pop_front()
    }
}

#[cfg(feature = "duckdb")]
fn micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn timestamp_from_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|ts| ts.naive_utc())
}

#[cfg(feature = "duckdb")]
pub(crate) fn duck_value_to_cell(value: DuckValue) -> CellValue {
    match value {
        DuckValue::Null => CellValue::Null,
        DuckValue::Boolean(b) => CellValue::Boolean(b),
        DuckValue::TinyInt(i) => CellValue::from(i64::from(i)),
        DuckValue::SmallInt(i) => CellValue::from(i64::from(i)),
        DuckValue::Int(i) => CellValue::from(i64::from(i)),
        DuckValue::BigInt(i) => CellValue::from(i),
        DuckValue::HugeInt(i) => Decimal::try_from_i128_with_scale(i, 0)
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::Text(i.to_string())),
        DuckValue::UTinyInt(i) => CellValue::from(i64::from(i)),
        DuckValue::USmallInt(i) => CellValue::from(i64::from(i)),
        DuckValue::UInt(i) => CellValue::from(i64::from(i)),
        DuckValue::UBigInt(i) => CellValue::Number(Decimal::from(i)),
        DuckValue::Float(f) => CellValue::from_f64(f64::from(f)),
        DuckValue::Double(f) => CellValue::from_f64(f),
        DuckValue::Decimal(d) => d
            .to_string()
            .parse::<Decimal>()
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::Text(d.to_string())),
        DuckValue::Timestamp(unit, t) => timestamp_from_micros(micros(unit, t))
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Null),
        DuckValue::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Null),
        DuckValue::Time64(unit, t) => timestamp_from_micros(micros(unit, t))
            .map(|ts| CellValue::Text(ts.time().format("%H:%M:%S").to_string()))
            .unwrap_or(CellValue::Null),
        DuckValue::Text(s) => CellValue::Text(s),
        DuckValue::Enum(s) => CellValue::Text(s),
        DuckValue::Blob(bytes) => CellValue::Text(hex::encode(bytes)),
        DuckValue::Union(inner) => duck_value_to_cell(*inner),
        other => CellValue::Text(format!("{other:?}")),
    }
}

/// Days between 0001-01-01 and 1970-01-01.
#[cfg(feature = "duckdb")]
const EPOCH_DAYS_FROM_CE: i32 = 719_163;
