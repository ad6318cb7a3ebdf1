//! Integration tests for report assembly: grouped summaries, orders and trees.

use std::sync::Arc;

use reportflow::data::{FunctionKind, ReportOptions};
use reportflow::mapper::ItemMappings;
use reportflow::models::{ReferenceType, ReportDefinition, ReportItem};
use reportflow::query_builder::QueryColumn;
use reportflow::value::CellValue;
use reportflow::{Cell, ColumnMapping, Language, MappingRegistry, ReportInfo};
use rust_decimal::Decimal;

const REGION: i64 = 1;
const SALES_REP: i64 = 2;
const AMOUNT: i64 = 3;

fn sales_by_region() -> ReportDefinition {
    let mut region = ReportItem::new(REGION, "Region", "Region", ReferenceType::String);
    region.sequence = 10;
    region.sort_sequence = 10;
    region.is_group_by = true;
    region.is_order_by = true;
    let mut rep = ReportItem::new(SALES_REP, "Sales Rep", "SalesRep", ReferenceType::String);
    rep.sequence = 20;
    rep.sort_sequence = 20;
    rep.is_group_by = true;
    rep.is_order_by = true;
    let mut amount = ReportItem::new(AMOUNT, "Amount", "Amount", ReferenceType::Amount);
    amount.sequence = 30;
    amount.is_summarized = true;
    ReportDefinition::new(100, "Sales by Region", "C_Order")
        .with_item(region)
        .with_item(rep)
        .with_item(amount)
}

fn fill(info: &mut ReportInfo) {
    for (region, rep, amount) in [("US", "Carl", 30), ("EU", "Bob", 50), ("EU", "Alice", 100)] {
        info.add_cell(REGION, Cell::new(region));
        info.add_cell(SALES_REP, Cell::new(rep));
        info.add_cell(AMOUNT, Cell::new(Decimal::from(amount)));
        info.add_row();
    }
}

fn completed(definition: &ReportDefinition, options: ReportOptions) -> ReportInfo {
    let mut info = ReportInfo::new(definition, options);
    fill(&mut info);
    info.complete_info();
    info
}

#[test]
fn regions_total_their_members() {
    let info = completed(&sales_by_region(), ReportOptions::default());
    assert_eq!(info.record_count(), 3);
    assert_eq!(info.detail_level(), 2);

    let region_totals: Vec<(String, String)> = info
        .summary_rows()
        .iter()
        .filter(|row| row.level == 0)
        .map(|row| (row.sort_value(REGION), row.sort_value(AMOUNT)))
        .collect();
    assert_eq!(
        region_totals,
        vec![
            ("EU".to_string(), "150.00".to_string()),
            ("US".to_string(), "30.00".to_string())
        ]
    );

    let eu = info
        .summary_rows()
        .iter()
        .find(|row| row.level == 0 && row.sort_value(REGION) == "EU")
        .unwrap();
    let amount = eu.cell(AMOUNT).unwrap();
    assert_eq!(amount.function_value(FunctionKind::Sum), Some(Decimal::from(150)));
    assert_eq!(amount.function_value(FunctionKind::Count), Some(Decimal::from(2)));
    assert_eq!(amount.function_display_value(FunctionKind::Count), Some("2"));
    assert_eq!(amount.function_display_value(FunctionKind::Max), Some("100.00"));
}

#[test]
fn tree_nests_regions_reps_and_details() {
    let info = completed(&sales_by_region(), ReportOptions::default());
    let tree = info.rows_as_tree();

    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].sort_value(REGION), "EU");
    assert_eq!(tree[0].children.len(), 2);
    assert_eq!(tree[1].sort_value(REGION), "US");
    assert_eq!(tree[1].children.len(), 1);

    let alice = &tree[0].children[0];
    assert_eq!(alice.sort_value(SALES_REP), "Alice");
    assert!(alice.is_summary_row);
    assert_eq!(alice.children.len(), 1);
    assert!(!alice.children[0].is_summary_row);
    assert_eq!(alice.children[0].sort_value(AMOUNT), "100.00");
}

#[test]
fn listing_order_puts_totals_after_members() {
    let info = completed(&sales_by_region(), ReportOptions::default());
    let listing: Vec<(String, String, i32)> = info
        .complete_rows()
        .iter()
        .map(|row| (row.sort_value(REGION), row.sort_value(SALES_REP), row.level))
        .collect();
    assert_eq!(
        listing,
        vec![
            ("EU".to_string(), "".to_string(), 0),
            ("EU".to_string(), "Alice".to_string(), 2),
            ("EU".to_string(), "Alice".to_string(), 1),
            ("EU".to_string(), "Bob".to_string(), 2),
            ("EU".to_string(), "Bob".to_string(), 1),
            ("US".to_string(), "".to_string(), 0),
            ("US".to_string(), "Carl".to_string(), 2),
            ("US".to_string(), "Carl".to_string(), 1),
        ]
    );
    let tree_order: Vec<i32> = info.rows().iter().map(|row| row.level).collect();
    assert_eq!(tree_order, vec![0, 1, 2, 1, 2, 0, 1, 2]);
}

#[test]
fn completing_twice_changes_nothing() {
    let mut info = completed(&sales_by_region(), ReportOptions::default());
    let snapshot = |info: &ReportInfo| -> Vec<(i32, String, String)> {
        info.rows()
            .iter()
            .map(|row| (row.level, row.sort_value(REGION), row.sort_value(AMOUNT)))
            .collect()
    };
    let first = snapshot(&info);
    let first_summaries = info.summary_rows().len();
    info.complete_info();
    assert_eq!(first, snapshot(&info));
    assert_eq!(first_summaries, info.summary_rows().len());
}

#[test]
fn column_widths_follow_longest_display() {
    let info = completed(&sales_by_region(), ReportOptions::default());
    let widths: Vec<(i64, usize)> = info
        .columns()
        .iter()
        .map(|column| (column.id, column.characters_size))
        .collect();
    assert_eq!(widths, vec![(REGION, 2), (SALES_REP, 5), (AMOUNT, 6)]);

    let summary = info.summary();
    assert_eq!(summary.record_count, 3);
    assert_eq!(summary.columns.len(), 3);
    assert!(summary.columns.iter().take(2).all(|c| c.is_group_column));
}

struct Shout;

impl ColumnMapping for Shout {
    fn process(
        &self,
        _item: &ReportItem,
        _column: Option<&QueryColumn>,
        _language: &Language,
        _record: Option<&reportflow::executor::Record>,
        cell: &mut Cell,
    ) {
        if let CellValue::Text(text) = &cell.value {
            cell.display_value = Some(text.to_uppercase());
        }
    }
}

#[test]
fn custom_mappings_format_their_items() {
    let mut definition = sales_by_region();
    definition.items[1].mapping = Some("shout".to_string());
    definition.items[0].mapping = Some("not-registered".to_string());
    let registry = MappingRegistry::new().with_mapping("shout", Arc::new(Shout));
    let options = ReportOptions {
        mappings: registry.bind(&definition),
        ..ReportOptions::default()
    };
    let info = completed(&definition, options);

    let reps: Vec<String> = info
        .rows()
        .iter()
        .filter(|row| row.level == 1)
        .map(|row| row.sort_value(SALES_REP))
        .collect();
    assert_eq!(reps, vec!["ALICE", "BOB", "CARL"]);
    assert_eq!(info.rows()[0].sort_value(REGION), "EU");
    assert_eq!(info.rows()[0].sort_value(AMOUNT), "150.00");
}

#[test]
fn report_without_groups_lists_details_only() {
    let mut definition = sales_by_region();
    for item in &mut definition.items {
        item.is_group_by = false;
    }
    let info = completed(&definition, ReportOptions::default());
    assert_eq!(info.detail_level(), 0);
    assert!(info.summary_rows().is_empty());
    assert!(info.grouped_rows().is_empty());
    let tree = info.rows_as_tree();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree[0].sort_value(SALES_REP), "Alice");
    assert!(tree.iter().all(|row| row.children.is_empty()));
}

#[test]
fn default_item_mappings_format_numbers() {
    let item = ReportItem::new(AMOUNT, "Amount", "Amount", ReferenceType::Amount);
    let mut cell = Cell::new(Decimal::new(123456, 1));
    ItemMappings::default()
        .get(AMOUNT)
        .process(&item, None, &Language::default(), None, &mut cell);
    assert_eq!(cell.display(), "12,345.60");
}
