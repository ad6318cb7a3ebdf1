//! Page bounding and stateless page tokens.
//!
//! Two bounding strategies are supported:
//! - Row number: a `ROWNUM` predicate joined into the WHERE clause
//! - Limit/offset: a `LIMIT n OFFSET m` suffix after ORDER BY

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::config::{PaginationConfig, PaginationStrategyKind};
use crate::error::{ReportError, Result};
use crate::models::ReportRequest;

/// Requested window over the result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    Page { limit: u64, offset: u64 },
    /// No bounding at all; used for full exports.
    NoLimit,
}

/// Sentinel disabling pagination.
pub const NO_LIMIT: Pagination = Pagination::NoLimit;

impl Pagination {
    /// Interpret a wire-level limit: negative disables paging, 0 uses the default page size.
    pub fn from_request(limit: i64, offset: u64, default_page_size: u64) -> Self {
        if limit < 0 {
            return Pagination::NoLimit;
        }
        let limit = if limit == 0 {
            default_page_size
        } else {
            limit as u64
        };
        Pagination::Page { limit, offset }
    }

    pub fn limit(&self) -> Option<u64> {
        match self {
            Pagination::Page { limit, .. } => Some(*limit),
            Pagination::NoLimit => None,
        }
    }

    pub fn offset(&self) -> u64 {
        match self {
            Pagination::Page { offset, .. } => *offset,
            Pagination::NoLimit => 0,
        }
    }
}

/// SQL produced by a strategy for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageClause {
    /// Predicate joined into the WHERE clause.
    pub predicate: Option<String>,
    /// Text appended after ORDER BY.
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// Bounds on a row-number pseudo column.
    RowNumberBound { column: &'static str },
    LimitOffset,
}

impl Default for PaginationStrategy {
    fn default() -> Self {
        PaginationStrategy::RowNumberBound { column: "ROWNUM" }
    }
}

impl From<&PaginationConfig> for PaginationStrategy {
    fn from(config: &PaginationConfig) -> Self {
        match config.strategy {
            PaginationStrategyKind::RowNumber => PaginationStrategy::default(),
            PaginationStrategyKind::LimitOffset => PaginationStrategy::LimitOffset,
        }
    }
}

impl PaginationStrategy {
    pub fn clause(&self, pagination: Pagination) -> PageClause {
        let Pagination::Page { limit, offset } = pagination else {
            return PageClause::default();
        };
        match self {
            PaginationStrategy::RowNumberBound { column } => PageClause {
                predicate: Some(format!(
                    "{column} >= {offset} AND {column} <= {}",
                    offset.saturating_add(limit)
                )),
                suffix: None,
            },
            PaginationStrategy::LimitOffset => PageClause {
                predicate: None,
                suffix: Some(format!(" LIMIT {limit} OFFSET {offset}")),
            },
        }
    }
}

/// Opaque token pointing at the next page of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    pub offset: u64,
    /// Hash of the request the token was issued for.
    pub query_hash: u64,
}

impl PageToken {
    pub fn new(offset: u64, query_hash: u64) -> Self {
        Self { offset, query_hash }
    }

    /// Encode token to a URL-safe base64 string.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_string(self)
            .map_err(|e| ReportError::Execution(format!("failed to serialize page token: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json.as_bytes()))
    }

    /// Decode token from a base64 string.
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| ReportError::Validation(format!("invalid page token encoding: {e}")))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| ReportError::Validation(format!("invalid page token UTF-8: {e}")))?;
        serde_json::from_str(&json)
            .map_err(|e| ReportError::Validation(format!("invalid page token format: {e}")))
    }

    pub fn validate_query_hash(&self, expected_hash: u64) -> Result<()> {
        if self.query_hash != expected_hash {
            return Err(ReportError::Validation(
                "page token does not match current request - the filters may have changed"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Hash of the request fields that define the result set (paging fields excluded).
pub fn compute_request_hash(request: &ReportRequest) -> u64 {
    let mut hasher = DefaultHasher::new();
    request.report_id.hash(&mut hasher);
    if let Ok(filters_json) = serde_json::to_string(&request.filters) {
        filters_json.hash(&mut hasher);
    }
    request.limit.hash(&mut hasher);
    hasher.finish()
}

/// A next-page token exists only while `offset + limit < total_count`.
pub fn next_page_token(
    pagination: Pagination,
    total_count: u64,
    query_hash: u64,
) -> Result<Option<String>> {
    match pagination {
        Pagination::Page { limit, offset } if offset.saturating_add(limit) < total_count => {
            PageToken::new(offset + limit, query_hash).encode().map(Some)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Filter, FilterOperator};

    #[test]
    fn test_token_roundtrip() {
        let token = PageToken::new(100, 12345678);
        let decoded = PageToken::decode(&token.encode().unwrap()).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn test_invalid_token_rejected() {
        assert!(PageToken::decode("not-valid-base64!!!").is_err());
        assert!(PageToken::decode(&URL_SAFE_NO_PAD.encode(b"not json")).is_err());
    }

    #[test]
    fn test_query_hash_validation() {
        let token = PageToken::new(100, 12345);
        assert!(token.validate_query_hash(12345).is_ok());
        assert!(token.validate_query_hash(99999).is_err());
    }

    #[test]
    fn next_page_only_before_the_end() {
        let last_page = Pagination::Page {
            limit: 100,
            offset: 200,
        };
        assert!(next_page_token(last_page, 250, 1).unwrap().is_none());

        let middle = Pagination::Page {
            limit: 100,
            offset: 100,
        };
        let token = next_page_token(middle, 250, 1).unwrap().unwrap();
        assert_eq!(PageToken::decode(&token).unwrap().offset, 200);

        assert!(next_page_token(NO_LIMIT, 250, 1).unwrap().is_none());
    }

    #[test]
    fn huge_offsets_saturate() {
        let page = Pagination::from_request(100, u64::MAX - 10, 100);
        let clause = PaginationStrategy::default().clause(page);
        assert_eq!(
            clause.predicate,
            Some(format!("ROWNUM >= {} AND ROWNUM <= {}", u64::MAX - 10, u64::MAX))
        );
        assert!(next_page_token(page, u64::MAX, 1).unwrap().is_none());
    }

    #[test]
    fn zero_limit_uses_page_size() {
        assert_eq!(
            Pagination::from_request(0, 10, 100),
            Pagination::Page {
                limit: 100,
                offset: 10
            }
        );
        assert_eq!(Pagination::from_request(-1, 10, 100), NO_LIMIT);
    }

    #[test]
    fn strategies_render_bounds() {
        let page = Pagination::Page {
            limit: 50,
            offset: 100,
        };
        let clause = PaginationStrategy::default().clause(page);
        assert_eq!(
            clause.predicate.as_deref(),
            Some("ROWNUM >= 100 AND ROWNUM <= 150")
        );
        let clause = PaginationStrategy::LimitOffset.clause(page);
        assert_eq!(clause.suffix.as_deref(), Some(" LIMIT 50 OFFSET 100"));
        assert_eq!(
            PaginationStrategy::default().clause(NO_LIMIT),
            PageClause::default()
        );
    }

    #[test]
    fn request_hash_ignores_paging() {
        let mut request = ReportRequest {
            report_id: Some(7),
            filters: vec![Filter::new("Status", FilterOperator::Equal).with_value("CO")],
            ..Default::default()
        };
        let first = compute_request_hash(&request);
        request.offset = 300;
        request.page_token = Some("abc".to_string());
        assert_eq!(first, compute_request_hash(&request));

        request.filters[0].value = "DR".into();
        assert_ne!(first, compute_request_hash(&request));
    }
}
