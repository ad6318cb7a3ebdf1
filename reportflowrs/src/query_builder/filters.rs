use serde_json::Value;

use crate::models::{Filter, FilterOperator};
use crate::sql_ast::{SqlBinaryOperator, SqlExpr};
use crate::value::ParamValue;

use super::QueryColumn;

/// Filters address a column either by its name or by its `_To` range twin;
/// the raw column wins over its display-value companion.
pub(crate) fn match_column<'a>(filter: &Filter, columns: &'a [QueryColumn]) -> Option<&'a QueryColumn> {
    let name = filter.column_name.trim();
    if name.is_empty() {
        return None;
    }
    let mut candidates: Vec<&QueryColumn> = columns
        .iter()
        .filter(|column| {
            name == column.column_name
                || name
                    .strip_suffix("_To")
                    .map(|base| base == column.column_name)
                    .unwrap_or(false)
        })
        .collect();
    candidates.sort_by_key(|column| column.is_display_value);
    candidates.into_iter().next()
}

/// Translate one filter into a parenthesized predicate, appending its
/// bound values to `params`. `None` means the filter restricts nothing.
pub(crate) fn restriction(
    filter: &Filter,
    column: &QueryColumn,
    params: &mut Vec<ParamValue>,
) -> Option<SqlExpr> {
    let col = column.expr.clone();
    let is_text = column.reference.is_text();
    let expr = match filter.operator {
        FilterOperator::In | FilterOperator::NotIn => {
            let mut list = Vec::new();
            let mut has_null = false;
            let mut upper_column = false;
            for value in &filter.values {
                let is_string = is_text || value.is_string();
                if is_blank(value, is_string) {
                    has_null = true;
                    continue;
                }
                let placeholder = bind(params, typed_param(column, value, is_string));
                if is_string {
                    upper_column = true;
                    list.push(SqlExpr::upper(placeholder));
                } else {
                    list.push(placeholder);
                }
            }
            let negated = filter.operator == FilterOperator::NotIn;
            if list.is_empty() {
                if !has_null {
                    return None;
                }
                return Some(SqlExpr::nested(SqlExpr::IsNull {
                    expr: Box::new(col),
                    negated,
                }));
            }
            let target = if upper_column {
                SqlExpr::upper(col.clone())
            } else {
                col.clone()
            };
            let in_list = SqlExpr::InList {
                expr: Box::new(target),
                list,
                negated,
            };
            if has_null {
                SqlExpr::Or(vec![in_list, SqlExpr::NullProbe(Box::new(col))])
            } else {
                in_list
            }
        }
        FilterOperator::Between | FilterOperator::NotBetween => {
            let from = ParamValue::for_reference(column.reference, &filter.from_value);
            let to = ParamValue::for_reference(column.reference, &filter.to_value);
            match (from.is_null(), to.is_null()) {
                (true, true) => return None,
                (true, false) => {
                    let upper = bind(params, to);
                    SqlExpr::binary(SqlBinaryOperator::Lte, col, upper)
                }
                (false, true) => {
                    let lower = bind(params, from);
                    SqlExpr::binary(SqlBinaryOperator::Gte, col, lower)
                }
                (false, false) => {
                    let low = bind(params, from);
                    let high = bind(params, to);
                    SqlExpr::Between {
                        expr: Box::new(col),
                        low: Box::new(low),
                        high: Box::new(high),
                        negated: filter.operator == FilterOperator::NotBetween,
                    }
                }
            }
        }
        FilterOperator::Like | FilterOperator::NotLike => {
            let text = match &filter.value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let placeholder = bind(params, ParamValue::Text(text));
            let op = if filter.operator == FilterOperator::Like {
                SqlBinaryOperator::Like
            } else {
                SqlBinaryOperator::NotLike
            };
            SqlExpr::binary(
                op,
                SqlExpr::upper(col),
                SqlExpr::Concat(vec![
                    SqlExpr::Literal(ParamValue::Text("%".to_string())),
                    SqlExpr::upper(placeholder),
                    SqlExpr::Literal(ParamValue::Text("%".to_string())),
                ]),
            )
        }
        FilterOperator::Null | FilterOperator::NotNull => SqlExpr::IsNull {
            expr: Box::new(col),
            negated: filter.operator == FilterOperator::NotNull,
        },
        FilterOperator::Equal | FilterOperator::NotEqual => {
            let op = if filter.operator == FilterOperator::Equal {
                SqlBinaryOperator::Eq
            } else {
                SqlBinaryOperator::Neq
            };
            let blank = is_blank(&filter.value, is_text);
            let comparison = if is_text && !blank {
                let placeholder = bind(params, typed_param(column, &filter.value, true));
                SqlExpr::binary(op, SqlExpr::upper(col.clone()), SqlExpr::upper(placeholder))
            } else {
                let value = if is_text {
                    ParamValue::Text(String::new())
                } else {
                    ParamValue::for_reference(column.reference, &filter.value)
                };
                let placeholder = bind(params, value);
                SqlExpr::binary(op, col.clone(), placeholder)
            };
            if blank {
                SqlExpr::Or(vec![
                    comparison,
                    SqlExpr::IsNull {
                        expr: Box::new(col),
                        negated: false,
                    },
                ])
            } else {
                comparison
            }
        }
        FilterOperator::Greater
        | FilterOperator::GreaterEqual
        | FilterOperator::Less
        | FilterOperator::LessEqual => {
            let op = match filter.operator {
                FilterOperator::Greater => SqlBinaryOperator::Gt,
                FilterOperator::GreaterEqual => SqlBinaryOperator::Gte,
                FilterOperator::Less => SqlBinaryOperator::Lt,
                _ => SqlBinaryOperator::Lte,
            };
            let placeholder = bind(params, ParamValue::for_reference(column.reference, &filter.value));
            SqlExpr::binary(op, col, placeholder)
        }
    };
    Some(SqlExpr::nested(expr))
}

fn bind(params: &mut Vec<ParamValue>, value: ParamValue) -> SqlExpr {
    params.push(value);
    SqlExpr::Placeholder(params.len() - 1)
}

fn is_blank(value: &Value, is_string: bool) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => is_string && s.trim().is_empty(),
        _ => false,
    }
}

fn typed_param(column: &QueryColumn, value: &Value, is_string: bool) -> ParamValue {
    if is_string {
        match value {
            Value::String(s) => ParamValue::Text(s.clone()),
            other => ParamValue::Text(other.to_string()),
        }
    } else {
        ParamValue::for_reference(column.reference, value)
    }
}
