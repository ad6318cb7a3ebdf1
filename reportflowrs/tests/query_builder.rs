//! Integration tests for the query builder.
//!
//! These tests exercise the public API: QueryBuilder, ReportRegistry, Filter.

use reportflow::dialect::{AnsiDialect, PostgresDialect};
use reportflow::models::{Filter, FilterOperator, ReferenceType, ReportDefinition, ReportItem};
use reportflow::pagination::{Pagination, PaginationStrategy, NO_LIMIT};
use reportflow::query_builder::{AccessControl, QueryBuilder, QueryOptions};
use reportflow::registry::ReportRegistry;
use reportflow::value::ParamValue;
use reportflow::ReportError;
use serde_json::{json, Value};

// ============================================================================
// Test fixtures
// ============================================================================

mod fixtures {
    use super::*;
    use reportflow::models::ColumnReference;

    pub const REGION: i64 = 1;
    pub const SALES_REP: i64 = 2;
    pub const AMOUNT: i64 = 3;
    pub const DOC_TYPE: i64 = 4;
    pub const PARTNER: i64 = 5;
    pub const STATUS: i64 = 6;
    pub const DATE_ORDERED: i64 = 7;

    pub fn item(id: i64, column: &str, reference: ReferenceType, sequence: i32) -> ReportItem {
        let mut item = ReportItem::new(id, column, column, reference);
        item.sequence = sequence;
        item
    }

    /// Orders grouped by region then sales rep, summing the amount.
    pub fn sales_by_region() -> ReportDefinition {
        let mut region = item(REGION, "Region", ReferenceType::String, 10);
        region.is_group_by = true;
        region.is_order_by = true;
        region.sort_sequence = 10;
        let mut rep = item(SALES_REP, "SalesRep", ReferenceType::String, 20);
        rep.is_group_by = true;
        rep.is_order_by = true;
        rep.sort_sequence = 20;
        let mut amount = item(AMOUNT, "Amount", ReferenceType::Amount, 30);
        amount.is_summarized = true;
        ReportDefinition::new(100, "Sales by Region", "C_Order")
            .with_item(region)
            .with_item(rep)
            .with_item(amount)
    }

    /// Order listing with lookups, a status and a date column.
    pub fn order_listing() -> ReportDefinition {
        let mut doc_type = item(DOC_TYPE, "C_DocType_ID", ReferenceType::Table, 10);
        doc_type.reference_value_id = Some(170);
        doc_type.is_mandatory = true;
        ReportDefinition::new(101, "Order Listing", "C_Order")
            .with_item(doc_type)
            .with_item(item(PARTNER, "C_BPartner_ID", ReferenceType::TableDir, 20))
            .with_item(item(STATUS, "Status", ReferenceType::String, 30))
            .with_item(item(DATE_ORDERED, "DateOrdered", ReferenceType::Date, 40))
            .with_item(item(AMOUNT, "Amount", ReferenceType::Amount, 50))
    }

    pub fn registry() -> ReportRegistry {
        let mut registry = ReportRegistry::new();
        registry.insert_report(sales_by_region());
        registry.insert_report(order_listing());
        registry.insert_reference(
            170,
            ColumnReference::new("C_DocType", "C_DocType_ID", "Name").translated(),
        );
        registry
    }
}

use fixtures::*;

fn page(limit: u64, offset: u64) -> Pagination {
    Pagination::Page { limit, offset }
}

fn build(definition: &ReportDefinition, filters: &[Filter]) -> reportflow::QueryDefinition {
    let dialect = AnsiDialect;
    QueryBuilder::new(&dialect, QueryOptions::default())
        .build(definition, &registry(), filters, NO_LIMIT)
        .unwrap()
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn grouped_report_projects_printed_columns_in_sequence() {
    let query = build(&sales_by_region(), &[]);
    assert_eq!(
        query.query(),
        "SELECT C_Order.Region AS Region, C_Order.SalesRep AS SalesRep, \
         C_Order.Amount AS Amount FROM C_Order"
    );
    assert_eq!(query.order_by(), Some("Region, SalesRep"));
    assert_eq!(
        query.complete_query(),
        "SELECT C_Order.Region AS Region, C_Order.SalesRep AS SalesRep, \
         C_Order.Amount AS Amount FROM C_Order ORDER BY Region, SalesRep"
    );
    assert!(query.where_clause().is_none());
    assert!(query.params().is_empty());
}

#[test]
fn mandatory_translated_lookup_joins_base_and_translation() {
    let query = build(&order_listing(), &[]);
    let sql = query.query();

    assert_eq!(sql.matches("INNER JOIN").count(), 1);
    assert_eq!(sql.matches("LEFT OUTER JOIN").count(), 1);
    assert!(sql.contains(
        "INNER JOIN C_DocType t1 ON (C_Order.C_DocType_ID = t1.C_DocType_ID)"
    ));
    assert!(sql.contains(
        "LEFT OUTER JOIN C_DocType_Trl t2 ON (t1.C_DocType_ID = t2.C_DocType_ID \
         AND t2.AD_Language = 'en_US')"
    ));
    assert!(sql.contains("COALESCE(t2.Name, t1.Name) AS C_DocType_ID_4_DisplayValue"));
}

#[test]
fn optional_lookup_uses_outer_join() {
    let mut definition = order_listing();
    definition.items[0].is_mandatory = false;
    let query = build(&definition, &[]);
    assert_eq!(query.query().matches("INNER JOIN").count(), 0);
    assert_eq!(query.query().matches("LEFT OUTER JOIN").count(), 2);
}

#[test]
fn directory_lookup_is_an_inline_subquery() {
    let query = build(&order_listing(), &[]);
    assert!(query.query().contains(
        "(SELECT C_BPartner.Name FROM C_BPartner \
         WHERE C_BPartner.C_BPartner_ID = C_Order.C_BPartner_ID) AS C_BPartner_ID_5_DisplayValue"
    ));
    let columns: Vec<(&str, bool)> = query
        .columns_for_item(PARTNER)
        .map(|c| (c.alias.as_str(), c.is_display_value))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("C_BPartner_ID", false),
            ("C_BPartner_ID_5_DisplayValue", true)
        ]
    );
}

#[test]
fn list_lookup_is_scoped_to_its_reference() {
    let mut status = item(STATUS, "DocStatus", ReferenceType::List, 10);
    status.reference_value_id = Some(131);
    let definition = ReportDefinition::new(102, "Statuses", "C_Order").with_item(status);
    let query = build(&definition, &[]);
    assert!(query.query().contains(
        "LEFT OUTER JOIN AD_Ref_List t1 ON (C_Order.DocStatus = t1.Value AND t1.AD_Reference_ID = 131)"
    ));
    assert!(query
        .query()
        .contains("LEFT OUTER JOIN AD_Ref_List_Trl t2 ON (t1.AD_Ref_List_ID = t2.AD_Ref_List_ID"));
}

#[test]
fn virtual_columns_project_their_sql() {
    let mut total = item(8, "LineCount", ReferenceType::Integer, 10);
    total.column_sql = Some(
        "SELECT COUNT(*) FROM C_OrderLine l WHERE l.C_Order_ID = C_Order.C_Order_ID".to_string(),
    );
    let definition = ReportDefinition::new(103, "Lines", "C_Order").with_item(total);
    let query = build(&definition, &[]);
    assert!(query.query().starts_with(
        "SELECT (SELECT COUNT(*) FROM C_OrderLine l WHERE l.C_Order_ID = C_Order.C_Order_ID) AS LineCount"
    ));
    assert!(query.columns()[0].is_virtual);
}

#[test]
fn same_definition_builds_identical_sql() {
    let filters = vec![
        Filter::new("Status", FilterOperator::In).with_values(vec![json!("CO"), json!("CL")]),
        Filter::new("Amount", FilterOperator::Greater).with_value(100),
    ];
    let first = build(&order_listing(), &filters);
    let second = build(&order_listing(), &filters);
    assert_eq!(first.complete_query(), second.complete_query());
    assert_eq!(first.params(), second.params());
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn in_filter_with_null_uses_null_probe() {
    let filters = vec![
        Filter::new("Status", FilterOperator::In).with_values(vec![json!("A"), Value::Null])
    ];
    let query = build(&order_listing(), &filters);
    assert_eq!(
        query.where_clause(),
        Some("(UPPER(C_Order.Status) IN (UPPER(?)) OR (SELECT C_Order.Status WHERE C_Order.Status IS NULL))")
    );
    assert_eq!(query.params(), &[ParamValue::Text("A".to_string())]);
}

#[test]
fn in_filter_with_only_null_tests_for_null() {
    let filters = vec![Filter::new("Status", FilterOperator::NotIn).with_values(vec![Value::Null])];
    let query = build(&order_listing(), &filters);
    assert_eq!(query.where_clause(), Some("(C_Order.Status IS NOT NULL)"));
    assert!(query.params().is_empty());
}

#[test]
fn empty_in_filter_is_dropped() {
    let filters = vec![Filter::new("Status", FilterOperator::In)];
    let query = build(&order_listing(), &filters);
    assert!(query.where_clause().is_none());
}

#[test]
fn text_equality_ignores_case() {
    let filters = vec![Filter::new("Status", FilterOperator::Equal).with_value("co")];
    let query = build(&order_listing(), &filters);
    assert_eq!(
        query.where_clause(),
        Some("(UPPER(C_Order.Status) = UPPER(?))")
    );
    assert_eq!(query.params(), &[ParamValue::Text("co".to_string())]);
}

#[test]
fn blank_text_equality_matches_nulls() {
    let filters = vec![Filter::new("Status", FilterOperator::Equal).with_value("  ")];
    let query = build(&order_listing(), &filters);
    assert_eq!(
        query.where_clause(),
        Some("(C_Order.Status = ? OR C_Order.Status IS NULL)")
    );
    assert_eq!(query.params(), &[ParamValue::Text(String::new())]);
}

#[test]
fn like_wraps_value_in_wildcards() {
    let filters = vec![Filter::new("Status", FilterOperator::Like).with_value("pend")];
    let query = build(&order_listing(), &filters);
    assert_eq!(
        query.where_clause(),
        Some("(UPPER(C_Order.Status) LIKE '%' || UPPER(?) || '%')")
    );
}

#[test]
fn between_binds_typed_bounds() {
    let filters = vec![Filter::new("DateOrdered", FilterOperator::Between)
        .with_range("2024-01-01", "2024-01-31")];
    let query = build(&order_listing(), &filters);
    assert_eq!(
        query.where_clause(),
        Some("(C_Order.DateOrdered BETWEEN ? AND ?)")
    );
    assert_eq!(query.params().len(), 2);
    assert!(matches!(query.params()[0], ParamValue::Timestamp(_)));
}

#[test]
fn between_with_one_bound_is_a_comparison() {
    let filters = vec![
        Filter::new("Amount", FilterOperator::Between).with_range(Value::Null, 500),
        Filter::new("DateOrdered", FilterOperator::Between).with_range(Value::Null, Value::Null),
    ];
    let query = build(&order_listing(), &filters);
    assert_eq!(query.where_clause(), Some("(C_Order.Amount <= ?)"));
    assert_eq!(query.params(), &[ParamValue::Number(500.into())]);
}

#[test]
fn range_twin_addresses_the_raw_column() {
    let filters = vec![
        Filter::new("Amount", FilterOperator::GreaterEqual).with_value(10),
        Filter::new("Amount_To", FilterOperator::LessEqual).with_value(20),
    ];
    let query = build(&order_listing(), &filters);
    assert_eq!(
        query.where_clause(),
        Some("(C_Order.Amount >= ?) AND (C_Order.Amount <= ?)")
    );
}

#[test]
fn lookup_filters_target_the_key_column() {
    let filters = vec![Filter::new("C_BPartner_ID", FilterOperator::Equal).with_value(1000)];
    let query = build(&order_listing(), &filters);
    assert_eq!(query.where_clause(), Some("(C_Order.C_BPartner_ID = ?)"));
    assert_eq!(query.params(), &[ParamValue::Integer(1000)]);
}

#[test]
fn unknown_filter_columns_are_skipped() {
    let filters = vec![
        Filter::new("NoSuchColumn", FilterOperator::Equal).with_value(1),
        Filter::new("", FilterOperator::Equal).with_value(1),
    ];
    let query = build(&order_listing(), &filters);
    assert!(query.where_clause().is_none());
    assert!(query.params().is_empty());
}

// ============================================================================
// Paging, counting and access control
// ============================================================================

#[test]
fn row_number_paging_joins_the_where_clause() {
    let dialect = AnsiDialect;
    let filters = vec![Filter::new("Region", FilterOperator::Equal).with_value("EU")];
    let query = QueryBuilder::new(&dialect, QueryOptions::default())
        .build(&sales_by_region(), &registry(), &filters, page(100, 0))
        .unwrap();
    assert!(query.complete_query().contains(
        "WHERE (UPPER(C_Order.Region) = UPPER(?)) AND ROWNUM >= 0 AND ROWNUM <= 100 ORDER BY Region, SalesRep"
    ));

    let query = QueryBuilder::new(&dialect, QueryOptions::default())
        .build(&sales_by_region(), &registry(), &[], page(100, 200))
        .unwrap();
    assert!(query
        .complete_query()
        .contains("FROM C_Order WHERE ROWNUM >= 200 AND ROWNUM <= 300 ORDER BY"));
}

#[test]
fn limit_offset_paging_follows_order_by() {
    let dialect = AnsiDialect;
    let options = QueryOptions {
        pagination: PaginationStrategy::LimitOffset,
        ..QueryOptions::default()
    };
    let query = QueryBuilder::new(&dialect, options)
        .build(&sales_by_region(), &registry(), &[], page(50, 100))
        .unwrap();
    assert!(query
        .complete_query()
        .ends_with("ORDER BY Region, SalesRep LIMIT 50 OFFSET 100"));
    assert_eq!(query.pagination(), page(50, 100));
}

#[test]
fn count_query_ignores_paging_and_ordering() {
    let dialect = AnsiDialect;
    let filters = vec![Filter::new("Amount", FilterOperator::Greater).with_value(10)];
    let query = QueryBuilder::new(&dialect, QueryOptions::default())
        .build(&sales_by_region(), &registry(), &filters, page(100, 0))
        .unwrap();
    assert_eq!(
        query.count_query(),
        "SELECT COUNT(*) FROM (SELECT C_Order.Region AS Region, C_Order.SalesRep AS SalesRep, \
         C_Order.Amount AS Amount FROM C_Order WHERE (C_Order.Amount > ?)) AS report_rows"
    );
}

#[test]
fn summary_layouts_group_in_both_queries() {
    let mut definition = sales_by_region();
    definition.group_by = vec!["Region".to_string(), "SalesRep".to_string()];
    let query = build(&definition, &[]);
    assert_eq!(query.group_by(), Some("Region, SalesRep"));
    assert!(query
        .complete_query()
        .contains("FROM C_Order GROUP BY Region, SalesRep ORDER BY"));
    assert!(query
        .count_query()
        .ends_with("GROUP BY Region, SalesRep) AS report_rows"));
}

struct OwnOrgOnly;

impl AccessControl for OwnOrgOnly {
    fn restriction(&self, table_name: &str) -> Option<String> {
        Some(format!("{table_name}.AD_Org_ID IN (0, 11)"))
    }
}

#[test]
fn access_control_restricts_both_queries() {
    let dialect = AnsiDialect;
    let filters = vec![Filter::new("Amount", FilterOperator::Greater).with_value(10)];
    let query = QueryBuilder::new(&dialect, QueryOptions::default())
        .with_access_control(&OwnOrgOnly)
        .build(&sales_by_region(), &registry(), &filters, NO_LIMIT)
        .unwrap();
    assert!(query
        .complete_query()
        .contains("WHERE (C_Order.Amount > ?) AND C_Order.AD_Org_ID IN (0, 11)"));
    assert!(query.count_query().contains("C_Order.AD_Org_ID IN (0, 11)"));
    assert_eq!(query.where_clause(), Some("(C_Order.Amount > ?)"));
}

#[test]
fn temporary_table_is_exempt_from_access_control() {
    let dialect = AnsiDialect;
    let definition = ReportDefinition::new(104, "Balance Sheet", "T_Report")
        .with_item(item(AMOUNT, "Amount", ReferenceType::Amount, 10));
    let query = QueryBuilder::new(&dialect, QueryOptions::default())
        .with_access_control(&OwnOrgOnly)
        .build(&definition, &registry(), &[], NO_LIMIT)
        .unwrap();
    assert!(!query.complete_query().contains("AD_Org_ID"));
}

#[test]
fn financial_reports_select_the_row_address() {
    let definition = ReportDefinition::new(104, "Balance Sheet", "T_Report")
        .with_item(item(PARTNER, "Name", ReferenceType::String, 10))
        .with_item(item(AMOUNT, "Amount", ReferenceType::Amount, 20));
    let query = build(&definition, &[]);
    assert_eq!(
        query.query(),
        "SELECT T_Report.Name AS Name, T_Report.Amount AS Amount, \
         T_Report.LevelNo AS LevelNo, T_Report.SeqNo AS SeqNo FROM T_Report"
    );
    assert!(query.columns().iter().all(|c| c.alias != "LevelNo"));

    let printed_level =
        definition.with_item(item(DATE_ORDERED, "LevelNo", ReferenceType::Integer, 30));
    let query = build(&printed_level, &[]);
    assert_eq!(query.query().matches("LevelNo").count(), 2);

    let orders = build(&sales_by_region(), &[]);
    assert!(!orders.query().contains("LevelNo"));
}

#[test]
fn postgres_placeholders_are_numbered() {
    let dialect = PostgresDialect;
    let filters = vec![
        Filter::new("Status", FilterOperator::In).with_values(vec![json!("CO"), json!("CL")]),
    ];
    let query = QueryBuilder::new(&dialect, QueryOptions::default())
        .build(&order_listing(), &registry(), &filters, NO_LIMIT)
        .unwrap();
    assert_eq!(
        query.where_clause(),
        Some("(UPPER(C_Order.Status) IN (UPPER($1), UPPER($2)))")
    );
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn table_lookup_without_reference_is_a_configuration_error() {
    let mut definition = order_listing();
    definition.items[0].reference_value_id = None;
    let dialect = AnsiDialect;
    let err = QueryBuilder::new(&dialect, QueryOptions::default())
        .build(&definition, &registry(), &[], NO_LIMIT)
        .unwrap_err();
    assert!(matches!(err, ReportError::Configuration(_)));
    assert!(err.is_fatal());
}

#[test]
fn unresolvable_reference_is_a_configuration_error() {
    let mut definition = order_listing();
    definition.items[0].reference_value_id = Some(999);
    let dialect = AnsiDialect;
    let err = QueryBuilder::new(&dialect, QueryOptions::default())
        .build(&definition, &registry(), &[], NO_LIMIT)
        .unwrap_err();
    assert!(matches!(err, ReportError::Configuration(ref m) if m.contains("@NotFound@")));
}

#[test]
fn report_without_printed_columns_is_rejected() {
    let mut definition = sales_by_region();
    for item in &mut definition.items {
        item.is_printed = false;
    }
    let dialect = AnsiDialect;
    let err = QueryBuilder::new(&dialect, QueryOptions::default())
        .build(&definition, &registry(), &[], NO_LIMIT)
        .unwrap_err();
    assert!(matches!(err, ReportError::Configuration(_)));
}
