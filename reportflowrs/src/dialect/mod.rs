//! SQL dialect abstractions for different database backends.
//!
//! A dialect only maps identifiers, placeholders and literals to SQL text;
//! statement assembly lives in the query builder.

use crate::value::ParamValue;

pub trait Dialect {
    /// Plain identifiers stay bare so case-folding backends resolve them
    /// the usual way; anything else is double-quoted.
    fn quote_ident(&self, ident: &str) -> String {
        if is_plain_ident(ident) {
            ident.to_string()
        } else {
            format!("\"{}\"", ident.replace('"', "\"\""))
        }
    }
    /// Placeholder for the zero-based parameter `idx`.
    fn placeholder(&self, _idx: usize) -> String {
        "?".to_string()
    }
    fn render_literal(&self, value: &ParamValue) -> String {
        match value {
            ParamValue::Null => "NULL".to_string(),
            ParamValue::Boolean(b) => if *b { "'Y'" } else { "'N'" }.to_string(),
            ParamValue::Integer(i) => i.to_string(),
            ParamValue::Number(n) => n.to_string(),
            ParamValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            ParamValue::Timestamp(ts) => format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

fn is_plain_ident(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Generic SQL with `?` placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {}

mod postgres;
pub use postgres::PostgresDialect;

#[cfg(feature = "duckdb")]
mod duckdb;
#[cfg(feature = "duckdb")]
pub use duckdb::DuckDbDialect;
