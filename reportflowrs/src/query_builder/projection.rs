use crate::error::{ReportError, Result};
use crate::models::{ColumnReference, LookupKind, ReferenceType, ReportDefinition, ReportItem};
use crate::registry::ReferenceResolver;
use crate::sql_ast::{
    Join, OrderItem, SelectItem, SelectQuery, SqlBinaryOperator, SqlExpr, SqlJoinType, TableRef,
};
use crate::value::ParamValue;

use super::QueryColumn;

/// SELECT list, joins and ordering derived from the printed items.
pub(crate) struct Projection {
    pub select: SelectQuery,
    pub columns: Vec<QueryColumn>,
}

/// Hands out `t1`, `t2`, ... and never repeats within one build.
#[derive(Debug, Default)]
struct AliasCounter {
    next: usize,
}

impl AliasCounter {
    fn fresh(&mut self) -> String {
        self.next += 1;
        format!("t{}", self.next)
    }
}

pub(crate) fn project(
    definition: &ReportDefinition,
    resolver: &dyn ReferenceResolver,
    language: &str,
) -> Result<Projection> {
    let table = definition.table_name.as_str();
    let mut aliases = AliasCounter::default();
    let mut select = SelectQuery {
        from: TableRef::new(table),
        ..Default::default()
    };
    let mut columns = Vec::new();

    for item in definition.printed_items() {
        let Some(column_name) = item.column_name.as_deref() else {
            continue;
        };
        let raw_expr = match item.column_sql.as_deref().filter(|_| item.is_virtual()) {
            Some(sql) => SqlExpr::Raw(format!("({})", sql.trim())),
            None => SqlExpr::column(table, column_name),
        };
        select.select.push(SelectItem {
            expr: raw_expr.clone(),
            alias: Some(column_name.to_string()),
        });
        columns.push(QueryColumn {
            item_id: item.id,
            column_name: column_name.to_string(),
            alias: column_name.to_string(),
            reference: item.reference,
            is_display_value: false,
            is_virtual: item.is_virtual(),
            expr: raw_expr.clone(),
        });

        let display_expr = match item
            .reference
            .lookup_kind(item.reference_value_id.is_some())
        {
            LookupKind::Plain => None,
            LookupKind::Directory => {
                let reference = resolver.resolve_directory(column_name).ok_or_else(|| {
                    missing_reference(item, "@AD_Reference_ID@ @NotFound@")
                })?;
                Some(directory_lookup(&reference, raw_expr, language))
            }
            LookupKind::Joined => {
                let reference = resolve_joined(item, resolver)?;
                Some(joined_lookup(
                    &mut select,
                    &mut aliases,
                    item,
                    &reference,
                    raw_expr,
                    language,
                ))
            }
        };

        if let (Some(expr), Some(alias)) = (display_expr, item.display_column_alias()) {
            select.select.push(SelectItem {
                expr: expr.clone(),
                alias: Some(alias.clone()),
            });
            columns.push(QueryColumn {
                item_id: item.id,
                column_name: column_name.to_string(),
                alias,
                reference: item.reference,
                is_display_value: true,
                is_virtual: item.is_virtual(),
                expr,
            });
        }

        if item.is_order_by {
            select.order_by.push(OrderItem {
                expr: SqlExpr::Column {
                    table: None,
                    name: column_name.to_string(),
                },
                descending: item.is_desc,
            });
        }
    }

    if select.select.is_empty() {
        return Err(ReportError::Configuration(
            "@AD_PrintFormatItem_ID@ @NotFound@".to_string(),
        ));
    }
    Ok(Projection { select, columns })
}

fn missing_reference(item: &ReportItem, key: &str) -> ReportError {
    tracing::warn!(item = item.id, column = ?item.column_name, "lookup reference not resolvable");
    ReportError::Configuration(key.to_string())
}

fn resolve_joined(item: &ReportItem, resolver: &dyn ReferenceResolver) -> Result<ColumnReference> {
    let resolved = match item.reference {
        ReferenceType::Table | ReferenceType::Search => {
            let id = item.reference_value_id.ok_or_else(|| {
                missing_reference(item, "@FillMandatory@ @AD_Reference_Value_ID@")
            })?;
            resolver.resolve_table(id)
        }
        ReferenceType::List => {
            let id = item.reference_value_id.ok_or_else(|| {
                missing_reference(item, "@FillMandatory@ @AD_Reference_Value_ID@")
            })?;
            resolver.resolve_list(id)
        }
        other => resolver.resolve_special(other),
    };
    resolved.ok_or_else(|| missing_reference(item, "@AD_Reference_ID@ @NotFound@"))
}

/// Inline `(SELECT display FROM ref WHERE ref.key = column)`.
fn directory_lookup(reference: &ColumnReference, key_expr: SqlExpr, language: &str) -> SqlExpr {
    let (table, key) = if reference.is_translated {
        (reference.translation_table(), reference.translation_key().to_string())
    } else {
        (reference.table_name.clone(), reference.key_column.clone())
    };
    let mut filters = vec![SqlExpr::binary(
        SqlBinaryOperator::Eq,
        SqlExpr::column(table.as_str(), key),
        key_expr,
    )];
    if reference.is_translated {
        filters.push(language_predicate(&table, language));
    }
    let display = SqlExpr::column(table.as_str(), reference.display_column.as_str());
    let display = if reference.is_value_displayed && !reference.is_translated {
        value_and_display(&table, display)
    } else {
        display
    };
    SqlExpr::Subquery(Box::new(SelectQuery {
        select: vec![SelectItem {
            expr: display,
            alias: None,
        }],
        from: TableRef::new(table),
        filters,
        ..Default::default()
    }))
}

/// Adds the join (plus translation join) and returns the display expression.
fn joined_lookup(
    select: &mut SelectQuery,
    aliases: &mut AliasCounter,
    item: &ReportItem,
    reference: &ColumnReference,
    key_expr: SqlExpr,
    language: &str,
) -> SqlExpr {
    let alias = aliases.fresh();
    let mut on = vec![SqlExpr::binary(
        SqlBinaryOperator::Eq,
        key_expr,
        SqlExpr::column(alias.as_str(), reference.key_column.as_str()),
    )];
    if let Some((column, value)) = &reference.discriminator {
        on.push(SqlExpr::binary(
            SqlBinaryOperator::Eq,
            SqlExpr::column(alias.as_str(), column.as_str()),
            SqlExpr::Literal(ParamValue::Integer(*value)),
        ));
    }
    select.joins.push(Join {
        join_type: if item.is_mandatory {
            SqlJoinType::Inner
        } else {
            SqlJoinType::LeftOuter
        },
        table: TableRef::aliased(reference.table_name.as_str(), alias.as_str()),
        on,
    });

    let base_display = SqlExpr::column(alias.as_str(), reference.display_column.as_str());
    let display = if reference.is_translated {
        let trl_alias = aliases.fresh();
        let trl_key = reference.translation_key();
        select.joins.push(Join {
            join_type: SqlJoinType::LeftOuter,
            table: TableRef::aliased(reference.translation_table(), trl_alias.as_str()),
            on: vec![
                SqlExpr::binary(
                    SqlBinaryOperator::Eq,
                    SqlExpr::column(alias.as_str(), trl_key),
                    SqlExpr::column(trl_alias.as_str(), trl_key),
                ),
                language_predicate(&trl_alias, language),
            ],
        });
        SqlExpr::coalesce(vec![
            SqlExpr::column(trl_alias.as_str(), reference.display_column.as_str()),
            base_display,
        ])
    } else {
        base_display
    };

    if reference.is_value_displayed {
        value_and_display(&alias, display)
    } else {
        display
    }
}

fn value_and_display(table: &str, display: SqlExpr) -> SqlExpr {
    SqlExpr::Concat(vec![
        SqlExpr::column(table, "Value"),
        SqlExpr::Literal(ParamValue::Text("_".to_string())),
        display,
    ])
}

fn language_predicate(table: &str, language: &str) -> SqlExpr {
    SqlExpr::binary(
        SqlBinaryOperator::Eq,
        SqlExpr::column(table, "AD_Language"),
        SqlExpr::Literal(ParamValue::Text(language.to_string())),
    )
}
