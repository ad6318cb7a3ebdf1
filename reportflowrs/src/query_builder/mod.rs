//! Metadata-driven query construction.
//!
//! A [`QueryBuilder`] turns a report definition plus user filters into a
//! [`QueryDefinition`]: the projected columns, the WHERE clause with its
//! bound parameters, and the fully assembled paged and count queries.

use crate::config::ResolvedReportConfig;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::models::{Filter, ReferenceType, ReportDefinition};
use crate::pagination::{Pagination, PaginationStrategy};
use crate::registry::ReferenceResolver;
use crate::sql_ast::{SelectItem, SqlExpr, SqlRenderer};
use crate::value::ParamValue;

mod filters;
mod projection;

/// Row-level security collaborator contributing an extra predicate.
pub trait AccessControl: Send + Sync {
    fn restriction(&self, table_name: &str) -> Option<String>;
}

/// Grants access to every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAccessControl;

impl AccessControl for NoAccessControl {
    fn restriction(&self, _table_name: &str) -> Option<String> {
        None
    }
}

/// One projected output column.
#[derive(Debug, Clone)]
pub struct QueryColumn {
    pub item_id: i64,
    /// Logical column name of the report item.
    pub column_name: String,
    /// Output alias in the result set.
    pub alias: String,
    pub reference: ReferenceType,
    /// Carries the lookup display string rather than the raw value.
    pub is_display_value: bool,
    pub is_virtual: bool,
    pub(crate) expr: SqlExpr,
}

/// Settings fixed for the lifetime of one builder.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Language code for translated lookups.
    pub language: String,
    pub pagination: PaginationStrategy,
    /// Temporary table of financial reports; exempt from access control.
    pub temporary_table: String,
    /// Row address columns selected alongside the items of financial reports.
    pub level_column: String,
    pub sequence_column: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions::from(&ResolvedReportConfig::default())
    }
}

impl From<&ResolvedReportConfig> for QueryOptions {
    fn from(config: &ResolvedReportConfig) -> Self {
        Self {
            language: config.locale.language.clone(),
            pagination: PaginationStrategy::from(&config.pagination),
            temporary_table: config.financial.table_name.clone(),
            level_column: config.financial.level_column.clone(),
            sequence_column: config.financial.sequence_column.clone(),
        }
    }
}

/// Built query for one report execution. Immutable once built.
#[derive(Debug, Clone)]
pub struct QueryDefinition {
    query: String,
    columns: Vec<QueryColumn>,
    order_by: Option<String>,
    group_by: Option<String>,
    filters: Vec<Filter>,
    params: Vec<ParamValue>,
    where_clause: Option<String>,
    complete_query: String,
    count_query: String,
    pagination: Pagination,
}

impl QueryDefinition {
    /// SELECT ... FROM ... [JOINs] without restrictions.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn columns(&self) -> &[QueryColumn] {
        &self.columns
    }

    /// Query columns feeding the given report item (raw first, then display).
    pub fn columns_for_item(&self, item_id: i64) -> impl Iterator<Item = &QueryColumn> {
        self.columns.iter().filter(move |c| c.item_id == item_id)
    }

    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn params(&self) -> &[ParamValue] {
        &self.params
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    pub fn complete_query(&self) -> &str {
        &self.complete_query
    }

    /// Counts the unpaged predicate set; shares `params()`.
    pub fn count_query(&self) -> &str {
        &self.count_query
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }
}

pub struct QueryBuilder<'a> {
    dialect: &'a dyn Dialect,
    access: &'a dyn AccessControl,
    options: QueryOptions,
}

impl<'a> QueryBuilder<'a> {
    /// Financial rows are addressed by level and sequence; both columns are
    /// read even when no item prints them.
    fn select_row_address(&self, definition: &ReportDefinition, select: &mut Vec<SelectItem>) {
        for column in [&self.options.level_column, &self.options.sequence_column] {
            let selected = select.iter().any(|item| {
                item.alias
                    .as_deref()
                    .is_some_and(|alias| alias.eq_ignore_ascii_case(column))
            });
            if !selected {
                select.push(SelectItem {
                    expr: SqlExpr::column(&definition.table_name, column),
                    alias: Some(column.clone()),
                });
            }
        }
    }

    pub fn new(dialect: &'a dyn Dialect, options: QueryOptions) -> Self {
        Self {
            dialect,
            access: &NoAccessControl,
            options,
        }
    }

    pub fn with_access_control(mut self, access: &'a dyn AccessControl) -> Self {
        self.access = access;
        self
    }

    pub fn build(
        &self,
        definition: &ReportDefinition,
        resolver: &dyn ReferenceResolver,
        filters: &[Filter],
        pagination: Pagination,
    ) -> Result<QueryDefinition> {
        let renderer = SqlRenderer::new(self.dialect);
        let mut projection = projection::project(definition, resolver, &self.options.language)?;
        let order_items = std::mem::take(&mut projection.select.order_by);
        if definition.table_name == self.options.temporary_table {
            self.select_row_address(definition, &mut projection.select.select);
        }
        let query = renderer.render_select(&projection.select);

        let mut params = Vec::new();
        let mut predicates = Vec::new();
        for filter in filters {
            let Some(column) = filters::match_column(filter, &projection.columns) else {
                tracing::debug!(column = %filter.column_name, "filter column not projected, skipped");
                continue;
            };
            if let Some(expr) = filters::restriction(filter, column, &mut params) {
                predicates.push(renderer.render_expr(&expr));
            }
        }
        let where_clause = (!predicates.is_empty()).then(|| predicates.join(" AND "));

        let mut conditions: Vec<String> = where_clause.iter().cloned().collect();
        if definition.table_name != self.options.temporary_table {
            if let Some(access) = self.access.restriction(&definition.table_name) {
                conditions.push(access);
            }
        }

        let mut filtered = query.clone();
        if !conditions.is_empty() {
            filtered.push_str(" WHERE ");
            filtered.push_str(&conditions.join(" AND "));
        }

        let group_by = (!definition.group_by.is_empty()).then(|| definition.group_by.join(", "));
        let order_by = (!order_items.is_empty()).then(|| renderer.render_order_by(&order_items));

        let page = self.options.pagination.clause(pagination);
        let mut complete_query = filtered.clone();
        if let Some(predicate) = &page.predicate {
            complete_query.push_str(if conditions.is_empty() {
                " WHERE "
            } else {
                " AND "
            });
            complete_query.push_str(predicate);
        }
        let mut unpaged = filtered;
        if let Some(group_by) = &group_by {
            complete_query.push_str(&format!(" GROUP BY {group_by}"));
            unpaged.push_str(&format!(" GROUP BY {group_by}"));
        }
        if let Some(order_by) = &order_by {
            complete_query.push_str(&format!(" ORDER BY {order_by}"));
        }
        if let Some(suffix) = &page.suffix {
            complete_query.push_str(suffix);
        }
        let count_query = format!("SELECT COUNT(*) FROM ({unpaged}) AS report_rows");

        tracing::debug!(
            report = definition.id,
            params = params.len(),
            sql = %complete_query,
            "built report query"
        );

        Ok(QueryDefinition {
            query,
            columns: projection.columns,
            order_by,
            group_by,
            filters: filters.to_vec(),
            params,
            where_clause,
            complete_query,
            count_query,
            pagination,
        })
    }
}
