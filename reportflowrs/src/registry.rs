use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::models::{ColumnReference, ReferenceType, ReportDefinition};

/// Metadata collaborator resolving lookup references to join targets.
pub trait ReferenceResolver {
    /// Table reference addressed by a reference-value id.
    fn resolve_table(&self, reference_value_id: i64) -> Option<ColumnReference>;

    /// Enumerated list: values live in `AD_Ref_List`, scoped by list id.
    fn resolve_list(&self, reference_value_id: i64) -> Option<ColumnReference> {
        let mut reference = ColumnReference::new("AD_Ref_List", "Value", "Name").translated();
        reference.translation_key = Some("AD_Ref_List_ID".to_string());
        reference.discriminator = Some(("AD_Reference_ID".to_string(), reference_value_id));
        Some(reference)
    }

    /// Location, account, locator and attribute-set references.
    fn resolve_special(&self, reference: ReferenceType) -> Option<ColumnReference> {
        let (table, key, display) = match reference {
            ReferenceType::Location => ("C_Location", "C_Location_ID", "City"),
            ReferenceType::Account => ("C_ValidCombination", "C_ValidCombination_ID", "Combination"),
            ReferenceType::Locator => ("M_Locator", "M_Locator_ID", "Value"),
            ReferenceType::PAttribute => (
                "M_AttributeSetInstance",
                "M_AttributeSetInstance_ID",
                "Description",
            ),
            _ => return None,
        };
        Some(ColumnReference::new(table, key, display))
    }

    /// Directory lookups follow the `<Table>_ID` naming convention.
    fn resolve_directory(&self, column_name: &str) -> Option<ColumnReference> {
        let table = column_name.strip_suffix("_ID")?;
        if table.is_empty() {
            return None;
        }
        Some(ColumnReference::new(table, column_name, "Name"))
    }
}

/// Reference file entry: a table reference keyed by its reference-value id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDefinition {
    pub id: i64,
    #[serde(flatten)]
    pub reference: ColumnReference,
}

#[derive(Debug, Default, Clone)]
pub struct ReportRegistry {
    pub reports: HashMap<i64, ReportDefinition>,
    pub references: HashMap<i64, ColumnReference>,
}

impl ReportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        reports: Vec<ReportDefinition>,
        references: Vec<ReferenceDefinition>,
    ) -> Self {
        let mut registry = ReportRegistry::new();
        for report in reports {
            registry.reports.insert(report.id, report);
        }
        for reference in references {
            registry.references.insert(reference.id, reference.reference);
        }
        registry
    }

    /// Load `reports/*.yml` and the optional `references/*.yml` below `root`.
    pub fn load_from_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        let mut registry = ReportRegistry::new();
        let reports_dir = root.as_ref().join("reports");
        if !reports_dir.exists() {
            return Err(ReportError::Validation(format!(
                "reports directory not found: {}",
                reports_dir.display()
            )));
        }
        for path in yaml_files(&reports_dir)? {
            let contents = fs::read_to_string(&path)?;
            let report: ReportDefinition = serde_yaml::from_str(&contents)?;
            tracing::debug!(report = report.id, path = %path.display(), "loaded report definition");
            registry.reports.insert(report.id, report);
        }
        let references_dir = root.as_ref().join("references");
        if references_dir.exists() {
            for path in yaml_files(&references_dir)? {
                let contents = fs::read_to_string(&path)?;
                let entries: Vec<ReferenceDefinition> = serde_yaml::from_str(&contents)?;
                for entry in entries {
                    registry.references.insert(entry.id, entry.reference);
                }
            }
        }
        tracing::info!(
            reports = registry.reports.len(),
            references = registry.references.len(),
            "report registry loaded"
        );
        Ok(registry)
    }

    pub fn get_report(&self, id: i64) -> Option<&ReportDefinition> {
        self.reports.get(&id)
    }

    pub fn insert_report(&mut self, report: ReportDefinition) {
        self.reports.insert(report.id, report);
    }

    pub fn insert_reference(&mut self, id: i64, reference: ColumnReference) {
        self.references.insert(id, reference);
    }
}

fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in ["yml", "yaml"] {
        for entry in glob(&format!("{}/*.{pattern}", dir.display()))
            .map_err(|e| ReportError::Other(e.into()))?
            .flatten()
        {
            files.push(entry);
        }
    }
    files.sort();
    Ok(files)
}

impl ReferenceResolver for ReportRegistry {
    fn resolve_table(&self, reference_value_id: i64) -> Option<ColumnReference> {
        self.references.get(&reference_value_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_convention() {
        let registry = ReportRegistry::new();
        let reference = registry.resolve_directory("C_BPartner_ID").unwrap();
        assert_eq!(reference.table_name, "C_BPartner");
        assert_eq!(reference.key_column, "C_BPartner_ID");
        assert_eq!(reference.display_column, "Name");
        assert!(registry.resolve_directory("DocumentNo").is_none());
        assert!(registry.resolve_directory("_ID").is_none());
    }

    #[test]
    fn list_reference_is_scoped() {
        let registry = ReportRegistry::new();
        let reference = registry.resolve_list(131).unwrap();
        assert_eq!(reference.table_name, "AD_Ref_List");
        assert_eq!(reference.translation_key(), "AD_Ref_List_ID");
        assert_eq!(
            reference.discriminator,
            Some(("AD_Reference_ID".to_string(), 131))
        );
    }

    #[test]
    fn table_references_come_from_registry() {
        let mut registry = ReportRegistry::new();
        assert!(registry.resolve_table(200).is_none());
        registry.insert_reference(200, ColumnReference::new("C_BPartner", "C_BPartner_ID", "Name"));
        assert_eq!(
            registry.resolve_table(200).unwrap().table_name,
            "C_BPartner"
        );
    }
}
