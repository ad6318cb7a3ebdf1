//! Raw values flowing from the store into cells and from filters into bound parameters.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::models::ReferenceType;

/// Raw value of a cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Number(Decimal),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Text(String),
    /// Identifier of a foreign entity.
    Reference(i64),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Reference(id) => Some(Decimal::from(*id)),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Reference(id) => Some(*id),
            CellValue::Number(n) => n.trunc().to_i64(),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Boolean(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Text(s) => Some(matches!(s.trim(), "Y" | "y" | "true" | "TRUE" | "1")),
            _ => None,
        }
    }

    pub fn from_f64(value: f64) -> Self {
        Decimal::from_f64(value)
            .map(CellValue::Number)
            .unwrap_or(CellValue::Null)
    }

    /// Contribution of this value to an accumulator: numbers pass through,
    /// booleans count as 1/0 and anything else contributes its string length.
    pub fn function_value(&self) -> Option<Decimal> {
        match self {
            CellValue::Null => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Reference(id) => Some(Decimal::from(*id)),
            CellValue::Boolean(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
            other => Some(Decimal::from(other.to_string().chars().count())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Reference(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Number(n) => match n.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&n.to_string()),
            },
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Timestamp(_) | CellValue::Text(_) => {
                serializer.serialize_str(&self.to_string())
            }
            CellValue::Reference(id) => serializer.serialize_i64(*id),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(Decimal::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Timestamp(value)
    }
}

/// Value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Text(String),
    Integer(i64),
    Number(Decimal),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Convert a filter value to the parameter type its column expects.
    pub fn for_reference(reference: ReferenceType, value: &Value) -> ParamValue {
        if value.is_null() {
            return ParamValue::Null;
        }
        if reference == ReferenceType::YesNo {
            let flag = match value {
                Value::Bool(b) => *b,
                Value::String(s) => matches!(s.trim(), "Y" | "y" | "true" | "TRUE" | "1"),
                Value::Number(n) => n.as_i64() == Some(1),
                _ => false,
            };
            return ParamValue::Text(if flag { "Y" } else { "N" }.to_string());
        }
        if reference.is_date() {
            if let Some(ts) = value.as_str().and_then(parse_timestamp) {
                return ParamValue::Timestamp(ts);
            }
        }
        if reference.is_id() || reference == ReferenceType::Integer {
            let id = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            if let Some(id) = id {
                return ParamValue::Integer(id);
            }
        }
        if reference.is_numeric() {
            let number = match value {
                Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
                Value::String(s) => s.trim().parse::<Decimal>().ok(),
                _ => None,
            };
            if let Some(number) = number {
                return ParamValue::Number(number);
            }
        }
        ParamValue::from_json(value)
    }

    pub fn from_json(value: &Value) -> ParamValue {
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Integer(i),
                None => n
                    .to_string()
                    .parse::<Decimal>()
                    .map(ParamValue::Number)
                    .unwrap_or(ParamValue::Null),
            },
            Value::String(s) => ParamValue::Text(s.clone()),
            other => ParamValue::Text(other.to_string()),
        }
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and RFC 3339 forms.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts);
    }
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
