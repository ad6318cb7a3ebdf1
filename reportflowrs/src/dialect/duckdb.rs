//! DuckDB dialect implementation.

use crate::value::ParamValue;

use super::Dialect;

#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbDialect;

impl Dialect for DuckDbDialect {
    fn render_literal(&self, value: &ParamValue) -> String {
        match value {
            ParamValue::Boolean(b) => b.to_string(),
            ParamValue::Timestamp(ts) => {
                format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S"))
            }
            ParamValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            ParamValue::Integer(i) => i.to_string(),
            ParamValue::Number(n) => n.to_string(),
            ParamValue::Null => "NULL".to_string(),
        }
    }
}
