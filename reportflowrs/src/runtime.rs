//! End-to-end report execution: resolve, build, count, stream, assemble.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::backends::ConnectionManager;
use crate::config::FinancialConfig;
use crate::data::{Cell, FunctionKind, ReportInfo, ReportOptions, Row};
use crate::error::{ReportError, Result};
use crate::executor::Record;
use crate::mapper::{Language, MappingRegistry};
use crate::models::{ReferenceType, ReportDefinition, ReportRequest};
use crate::pagination::{compute_request_hash, next_page_token, PageToken, Pagination};
use crate::query_builder::{AccessControl, NoAccessControl, QueryBuilder, QueryDefinition, QueryOptions};
use crate::registry::ReportRegistry;

/// Shared flag aborting a running build.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ReportError::Cancelled);
        }
        Ok(())
    }
}

/// Completed report plus paging metadata.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub info: ReportInfo,
    /// Rows matching the filters, ignoring paging.
    pub total_count: u64,
    pub next_page_token: Option<String>,
}

impl ReportOutput {
    /// Wire shape: header, column descriptors and the row tree.
    pub fn to_json(&self) -> Value {
        let columns: Vec<Value> = self
            .info
            .columns()
            .iter()
            .map(|column| {
                json!({
                    "id": column.id,
                    "title": column.title,
                    "display_type": column.reference_code(),
                    "sequence": column.sequence,
                    "is_group_column": column.is_group_column,
                    "characters_size": column.characters_size,
                })
            })
            .collect();
        let rows: Vec<Value> = self.info.rows_as_tree().iter().map(row_to_json).collect();
        json!({
            "id": self.info.id(),
            "name": self.info.name(),
            "description": self.info.description(),
            "record_count": self.info.record_count(),
            "total_count": self.total_count,
            "next_page_token": self.next_page_token,
            "columns": columns,
            "rows": rows,
        })
    }
}

fn row_to_json(row: &Row) -> Value {
    let mut ids: Vec<&i64> = row.cells.keys().collect();
    ids.sort();
    let mut cells = Map::new();
    for id in ids {
        if let Some(cell) = row.cells.get(id) {
            cells.insert(id.to_string(), cell_to_json(cell));
        }
    }
    json!({
        "level": row.level,
        "is_summary": row.is_summary_row,
        "cells": cells,
        "children": row.children.iter().map(row_to_json).collect::<Vec<_>>(),
    })
}

fn cell_to_json(cell: &Cell) -> Value {
    let mut out = Map::new();
    out.insert("value".to_string(), json!(cell.value));
    out.insert("display_value".to_string(), json!(cell.display()));
    out.insert("table_name".to_string(), json!(cell.table_name));
    for (kind, key) in [
        (FunctionKind::Sum, "sum_value"),
        (FunctionKind::Mean, "mean_value"),
        (FunctionKind::Count, "count_value"),
        (FunctionKind::Min, "minimum_value"),
        (FunctionKind::Max, "maximum_value"),
        (FunctionKind::Variance, "variance_value"),
        (FunctionKind::Deviation, "deviation_value"),
    ] {
        if let Some(display) = cell.function_display_value(kind) {
            out.insert(key.to_string(), json!(display));
        }
    }
    Value::Object(out)
}

/// Build a report with no row-level restrictions.
pub async fn run_report(
    registry: &ReportRegistry,
    connections: &ConnectionManager,
    mappings: &MappingRegistry,
    request: &ReportRequest,
    cancel: &CancellationFlag,
) -> Result<ReportOutput> {
    run_report_with_access(registry, connections, mappings, &NoAccessControl, request, cancel).await
}

pub async fn run_report_with_access(
    registry: &ReportRegistry,
    connections: &ConnectionManager,
    mappings: &MappingRegistry,
    access: &dyn AccessControl,
    request: &ReportRequest,
    cancel: &CancellationFlag,
) -> Result<ReportOutput> {
    let report_id = request
        .report_id
        .filter(|id| *id > 0)
        .ok_or_else(|| ReportError::Configuration("@FillMandatory@ @AD_PrintFormat_ID@".to_string()))?;
    let definition = registry
        .get_report(report_id)
        .ok_or_else(|| ReportError::Configuration("@AD_PrintFormat_ID@ @NotFound@".to_string()))?;
    let config = connections.config_for(&definition.name);
    let conn = connections.get(&definition.data_source).ok_or_else(|| {
        ReportError::Configuration(format!(
            "@AD_DataSource@ @NotFound@: {}",
            definition.data_source
        ))
    })?;

    let request_hash = compute_request_hash(request);
    let offset = match request.page_token.as_deref() {
        Some(token) => {
            let token = PageToken::decode(token)?;
            token.validate_query_hash(request_hash)?;
            token.offset
        }
        None => request.offset,
    };
    let pagination = Pagination::from_request(request.limit, offset, config.pagination.page_size);

    let query = QueryBuilder::new(conn.dialect(), QueryOptions::from(&config))
        .with_access_control(access)
        .build(definition, registry, &request.filters, pagination)?;

    cancel.check()?;
    let total_count = conn.count(query.count_query(), query.params()).await?;
    cancel.check()?;
    let mut stream = conn.execute(query.complete_query(), query.params()).await?;

    let options = ReportOptions {
        mappings: mappings.bind(definition),
        language: Language::new(config.locale.clone()),
        financial_table: config.financial.table_name.clone(),
    };
    let mut info = ReportInfo::new(definition, options);
    let mut skipped = 0usize;
    while let Some(next) = stream.next_record() {
        cancel.check()?;
        match next {
            Ok(record) => add_record(&mut info, definition, &query, &record, &config.financial),
            Err(e) if !e.is_fatal() => {
                skipped += 1;
                tracing::warn!(report = report_id, error = %e, "skipping unreadable record");
            }
            Err(e) => return Err(e),
        }
    }
    info.complete_info();

    let next_page_token = next_page_token(pagination, total_count, request_hash)?;
    tracing::info!(
        report = report_id,
        records = info.record_count(),
        skipped,
        total = total_count,
        "report built"
    );
    Ok(ReportOutput {
        info,
        total_count,
        next_page_token,
    })
}

/// Turn one record into cells of the printed items and close the row.
fn add_record(
    info: &mut ReportInfo,
    definition: &ReportDefinition,
    query: &QueryDefinition,
    record: &Record,
    financial: &FinancialConfig,
) {
    for item in definition.printed_items() {
        let mut cell: Option<Cell> = None;
        for column in query.columns_for_item(item.id) {
            let cell = cell.get_or_insert_with(Cell::default);
            if column.is_display_value {
                cell.display_value = record.get_string(&column.alias);
                continue;
            }
            cell.value = if item.reference.is_lookup() && item.reference != ReferenceType::List {
                record
                    .get_i64(&column.alias)
                    .map(crate::value::CellValue::Reference)
                    .unwrap_or_default()
            } else {
                record.get(&column.alias).cloned().unwrap_or_default()
            };
            info.mappings().get(item.id).process(
                item,
                Some(column),
                info.language(),
                Some(record),
                cell,
            );
        }
        if let Some(cell) = cell {
            info.add_cell(item.id, cell);
        }
    }
    if info.is_financial() {
        let level = record.get_i64(&financial.level_column).unwrap_or(0);
        let sequence = record.get_i64(&financial.sequence_column).unwrap_or(0);
        info.add_row_at(level as i32, sequence as i32);
    } else {
        info.add_row();
    }
}
