use serde::Serialize;

use crate::models::{ReferenceType, ReportItem};

/// Static descriptor of one report column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub id: i64,
    pub title: String,
    pub reference: ReferenceType,
    pub sequence: i32,
    pub is_group_column: bool,
    /// Widest display string seen when the report was completed.
    pub characters_size: usize,
}

impl ColumnInfo {
    pub fn from_item(item: &ReportItem) -> Self {
        Self {
            id: item.id,
            title: item.title().to_string(),
            reference: item.reference,
            sequence: item.sequence,
            is_group_column: item.is_group_by,
            characters_size: 0,
        }
    }

    pub fn reference_code(&self) -> i32 {
        self.reference.code()
    }
}
