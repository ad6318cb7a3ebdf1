//! Column mapping hooks turning raw cell values into display values.
//!
//! Custom mappings are registered by identifier in a [`MappingRegistry`]
//! and bound to report items once, when the report is loaded. Items
//! without a mapping, or naming an unknown one, use [`DefaultMapping`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::data::Cell;
use crate::executor::Record;
use crate::models::{ReportDefinition, ReportItem};
use crate::query_builder::QueryColumn;

mod default;
mod language;
mod record;

pub use default::DefaultMapping;
pub use language::Language;
pub use record::{EntityResolver, RecordReferenceMapping};

pub(crate) const RECORD_ID: &str = "Record_ID";
pub(crate) const TABLE_NAME: &str = "TableName";

/// Mapping hook applied to every cell of a column.
///
/// `record` is `None` when cells are reformatted after the result set is
/// gone. Implementations leave the cell untouched when they cannot
/// resolve a value and must not panic on missing data.
pub trait ColumnMapping: Send + Sync {
    fn process(
        &self,
        item: &ReportItem,
        column: Option<&QueryColumn>,
        language: &Language,
        record: Option<&Record>,
        cell: &mut Cell,
    );
}

#[derive(Clone)]
pub struct MappingRegistry {
    mappings: HashMap<String, Arc<dyn ColumnMapping>>,
    default: Arc<dyn ColumnMapping>,
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self {
            mappings: HashMap::new(),
            default: Arc::new(DefaultMapping),
        }
    }
}

impl fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.mappings.keys().collect();
        names.sort();
        f.debug_struct("MappingRegistry")
            .field("mappings", &names)
            .finish()
    }
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, mapping: Arc<dyn ColumnMapping>) {
        self.mappings.insert(id.into(), mapping);
    }

    pub fn with_mapping(mut self, id: impl Into<String>, mapping: Arc<dyn ColumnMapping>) -> Self {
        self.register(id, mapping);
        self
    }

    /// Replace the fallback used by items without a custom mapping.
    pub fn with_default(mut self, mapping: Arc<dyn ColumnMapping>) -> Self {
        self.default = mapping;
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.mappings.contains_key(id)
    }

    pub fn resolve(&self, id: Option<&str>) -> Arc<dyn ColumnMapping> {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            None => Arc::clone(&self.default),
            Some(id) => match self.mappings.get(id) {
                Some(mapping) => Arc::clone(mapping),
                None => {
                    tracing::warn!(mapping = id, "unknown column mapping, using default");
                    Arc::clone(&self.default)
                }
            },
        }
    }

    /// Resolve the mapping of every item of `definition`.
    pub fn bind(&self, definition: &ReportDefinition) -> ItemMappings {
        let by_item = definition
            .items
            .iter()
            .map(|item| (item.id, self.resolve(item.mapping.as_deref())))
            .collect();
        ItemMappings {
            by_item,
            default: Arc::clone(&self.default),
        }
    }
}

/// Mappings already resolved for the items of one report.
#[derive(Clone)]
pub struct ItemMappings {
    by_item: HashMap<i64, Arc<dyn ColumnMapping>>,
    default: Arc<dyn ColumnMapping>,
}

impl Default for ItemMappings {
    fn default() -> Self {
        Self {
            by_item: HashMap::new(),
            default: Arc::new(DefaultMapping),
        }
    }
}

impl fmt::Debug for ItemMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemMappings")
            .field("items", &self.by_item.len())
            .finish()
    }
}

impl ItemMappings {
    pub fn get(&self, item_id: i64) -> &dyn ColumnMapping {
        &**self.by_item.get(&item_id).unwrap_or(&self.default)
    }
}
