use std::sync::Arc;

use crate::data::Cell;
use crate::error::Result;
use crate::executor::Record;
use crate::models::ReportItem;
use crate::query_builder::QueryColumn;

use super::{ColumnMapping, DefaultMapping, Language, RECORD_ID};

/// Looks up the display string of an arbitrary entity by table and id.
pub trait EntityResolver: Send + Sync {
    fn display_value(&self, table_name: &str, record_id: i64) -> Result<Option<String>>;
}

/// Resolves generic `Record_ID` columns against the table named by the
/// record's `TableName` column; everything else is formatted by default.
pub struct RecordReferenceMapping {
    resolver: Arc<dyn EntityResolver>,
}

impl RecordReferenceMapping {
    pub fn new(resolver: Arc<dyn EntityResolver>) -> Self {
        Self { resolver }
    }
}

impl ColumnMapping for RecordReferenceMapping {
    fn process(
        &self,
        item: &ReportItem,
        column: Option<&QueryColumn>,
        language: &Language,
        record: Option<&Record>,
        cell: &mut Cell,
    ) {
        DefaultMapping.process(item, column, language, record, cell);
        if record.is_none() || !column.is_some_and(|c| c.column_name == RECORD_ID) {
            return;
        }
        let (Some(table), Some(id)) = (cell.table_name.clone(), cell.value.as_i64()) else {
            return;
        };
        if id <= 0 {
            return;
        }
        match self.resolver.display_value(&table, id) {
            Ok(Some(display)) => cell.display_value = Some(display),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(table = %table, record_id = id, error = %e, "entity display lookup failed");
            }
        }
    }
}
