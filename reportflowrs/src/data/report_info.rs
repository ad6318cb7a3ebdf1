//! Report assembly: detail rows in, completed rows, summaries and trees out.

use std::collections::HashMap;

use serde::Serialize;

use crate::mapper::{ItemMappings, Language};
use crate::models::{ReportDefinition, ReportItem};

use super::aggregation::GroupAggregator;
use super::cell::Cell;
use super::column_info::ColumnInfo;
use super::row::{listing_order, tree_order, Row};
use super::tree;

/// Settings a [`ReportInfo`] is assembled with.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub mappings: ItemMappings,
    pub language: Language,
    /// Backing table marking financial reports.
    pub financial_table: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            mappings: ItemMappings::default(),
            language: Language::default(),
            financial_table: "T_Report".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportInfo {
    id: i64,
    name: String,
    description: Option<String>,
    table_name: String,
    is_summary: bool,
    items: Vec<ReportItem>,
    columns: Vec<ColumnInfo>,
    sorting_items: Vec<i64>,
    detail_level: i32,
    is_financial: bool,
    options: ReportOptions,
    aggregator: GroupAggregator,
    temporary_row: Option<Row>,
    detail_rows: Vec<Row>,
    rows: Vec<Row>,
    summary_rows: Vec<Row>,
    grouped_rows: Vec<Row>,
}

impl ReportInfo {
    pub fn new(definition: &ReportDefinition, options: ReportOptions) -> Self {
        let items: Vec<ReportItem> = definition.printed_items().into_iter().cloned().collect();
        let columns = items.iter().map(ColumnInfo::from_item).collect();
        let aggregator = GroupAggregator::for_definition(definition);
        Self {
            id: definition.id,
            name: definition.name.clone(),
            description: definition.description.clone(),
            table_name: definition.table_name.clone(),
            is_summary: definition.is_summary,
            columns,
            sorting_items: definition.sorting_items().iter().map(|item| item.id).collect(),
            detail_level: aggregator.axes().len() as i32,
            is_financial: definition.table_name == options.financial_table,
            items,
            options,
            aggregator,
            temporary_row: None,
            detail_rows: Vec::new(),
            rows: Vec::new(),
            summary_rows: Vec::new(),
            grouped_rows: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn language(&self) -> &Language {
        &self.options.language
    }

    pub fn mappings(&self) -> &ItemMappings {
        &self.options.mappings
    }

    /// Temporary-table reports address rows by `(level, sequence)`.
    pub fn is_financial(&self) -> bool {
        self.is_financial
    }

    /// Level of detail rows: one below the deepest grouping rank.
    pub fn detail_level(&self) -> i32 {
        self.detail_level
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Grouping item ids by rank.
    pub fn group_axes(&self) -> &[i64] {
        self.aggregator.axes()
    }

    pub fn record_count(&self) -> usize {
        self.detail_rows.len()
    }

    /// Stage a cell in the row being read.
    pub fn add_cell(&mut self, item_id: i64, cell: Cell) {
        let level = self.detail_level;
        self.temporary_row
            .get_or_insert_with(|| Row::new(level))
            .set_cell(item_id, cell);
    }

    /// Close the row being read at the detail level.
    pub fn add_row(&mut self) {
        let level = self.detail_level;
        self.close_row(level, 0);
    }

    /// Close the row being read at an explicit financial address.
    pub fn add_row_at(&mut self, level: i32, sequence: i32) {
        self.close_row(level, sequence);
    }

    fn close_row(&mut self, level: i32, sequence: i32) {
        let Some(mut row) = self.temporary_row.take() else {
            return;
        };
        if row.is_empty() {
            return;
        }
        row.level = level;
        row.sequence = sequence;
        self.aggregator.add_row(&row);
        self.detail_rows.push(row);
    }

    /// Merge summaries, order for tree assembly, run the mapping hooks and
    /// measure column widths. Safe to call repeatedly.
    pub fn complete_info(&mut self) -> &mut Self {
        self.grouped_rows = self.aggregator.as_rows();

        let mut merged: Vec<&Row> = self
            .detail_rows
            .iter()
            .filter(|_| !self.is_summary)
            .chain(self.grouped_rows.iter())
            .collect();
        {
            let order = tree_order(&self.sorting_items);
            merged.sort_by(|a, b| order(a, b));
        }

        let mut widths: HashMap<i64, usize> = HashMap::new();
        let mut rows = Vec::with_capacity(merged.len());
        let mut summary_rows = Vec::new();
        for source in merged {
            let mut row = Row::at(source.level, source.sequence);
            row.is_summary_row = source.is_summary_row;
            for item in &self.items {
                let mut cell = source.cell(item.id).cloned().unwrap_or_default();
                self.options
                    .mappings
                    .get(item.id)
                    .process(item, None, &self.options.language, None, &mut cell);
                let width = cell.display().chars().count();
                let entry = widths.entry(item.id).or_insert(0);
                *entry = (*entry).max(width);
                row.set_cell(item.id, cell);
            }
            if row.is_summary_row || (row.level == 0 && self.is_financial) {
                summary_rows.push(row.clone());
            }
            rows.push(row);
        }

        for column in &mut self.columns {
            column.characters_size = widths.get(&column.id).copied().unwrap_or(0);
        }
        self.rows = rows;
        self.summary_rows = summary_rows;
        tracing::debug!(
            report = self.id,
            rows = self.rows.len(),
            summaries = self.summary_rows.len(),
            "report completed"
        );
        self
    }

    /// Completed rows in tree assembly order; empty until completed.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Completed rows in listing order, summaries after their members.
    pub fn complete_rows(&self) -> Vec<Row> {
        let mut rows = self.rows.clone();
        rows.sort_by(listing_order(&self.sorting_items));
        rows
    }

    pub fn summary_rows(&self) -> &[Row] {
        &self.summary_rows
    }

    /// Raw aggregation output of the last completion.
    pub fn grouped_rows(&self) -> &[Row] {
        &self.grouped_rows
    }

    pub fn rows_as_tree(&self) -> Vec<Row> {
        if self.is_financial {
            tree::financial_tree(&self.rows)
        } else {
            tree::grouped_tree(&self.rows, self.aggregator.axes())
        }
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            record_count: self.detail_rows.len(),
            columns: self.columns.clone(),
        }
    }
}

/// Serializable header of a completed report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub record_count: usize,
    pub columns: Vec<ColumnInfo>,
}
