use crate::dialect::Dialect;
use crate::value::ParamValue;

#[derive(Debug, Clone)]
pub enum SqlExpr {
    Column {
        table: Option<String>,
        name: String,
    },
    /// Caller-supplied SQL text, emitted verbatim.
    Raw(String),
    Literal(ParamValue),
    /// Zero-based index into the bound parameter list.
    Placeholder(usize),
    Function {
        name: String,
        args: Vec<SqlExpr>,
    },
    Concat(Vec<SqlExpr>),
    Subquery(Box<SelectQuery>),
    /// `(SELECT expr WHERE expr IS NULL)`
    NullProbe(Box<SqlExpr>),
    BinaryOp {
        op: SqlBinaryOperator,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    InList {
        expr: Box<SqlExpr>,
        list: Vec<SqlExpr>,
        negated: bool,
    },
    Between {
        expr: Box<SqlExpr>,
        low: Box<SqlExpr>,
        high: Box<SqlExpr>,
        negated: bool,
    },
    IsNull {
        expr: Box<SqlExpr>,
        negated: bool,
    },
    Or(Vec<SqlExpr>),
    And(Vec<SqlExpr>),
    Nested(Box<SqlExpr>),
}

impl SqlExpr {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        SqlExpr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn upper(expr: SqlExpr) -> Self {
        SqlExpr::Function {
            name: "UPPER".to_string(),
            args: vec![expr],
        }
    }

    pub fn coalesce(args: Vec<SqlExpr>) -> Self {
        SqlExpr::Function {
            name: "COALESCE".to_string(),
            args,
        }
    }

    pub fn binary(op: SqlBinaryOperator, left: SqlExpr, right: SqlExpr) -> Self {
        SqlExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn nested(expr: SqlExpr) -> Self {
        SqlExpr::Nested(Box::new(expr))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBinaryOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl SqlBinaryOperator {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlBinaryOperator::Eq => "=",
            SqlBinaryOperator::Neq => "<>",
            SqlBinaryOperator::Gt => ">",
            SqlBinaryOperator::Gte => ">=",
            SqlBinaryOperator::Lt => "<",
            SqlBinaryOperator::Lte => "<=",
            SqlBinaryOperator::Like => "LIKE",
            SqlBinaryOperator::NotLike => "NOT LIKE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectItem {
    pub expr: SqlExpr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlJoinType {
    Inner,
    LeftOuter,
}

#[derive(Debug, Clone)]
pub struct Join {
    pub join_type: SqlJoinType,
    pub table: TableRef,
    pub on: Vec<SqlExpr>,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub expr: SqlExpr,
    pub descending: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub select: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub filters: Vec<SqlExpr>,
    pub group_by: Vec<SqlExpr>,
    pub order_by: Vec<OrderItem>,
}

pub struct SqlRenderer<'d> {
    dialect: &'d dyn Dialect,
}

impl<'d> SqlRenderer<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn render_select(&self, query: &SelectQuery) -> String {
        let select_items: Vec<String> = query
            .select
            .iter()
            .map(|item| {
                let expr_sql = self.render_expr(&item.expr);
                match &item.alias {
                    Some(alias) => format!("{expr_sql} AS {}", self.dialect.quote_ident(alias)),
                    None => expr_sql,
                }
            })
            .collect();

        let mut sql = format!(
            "SELECT {} FROM {}",
            select_items.join(", "),
            self.render_table_ref(&query.from)
        );

        for join in &query.joins {
            let join_kw = match join.join_type {
                SqlJoinType::Inner => "INNER JOIN",
                SqlJoinType::LeftOuter => "LEFT OUTER JOIN",
            };
            let on_clause: Vec<String> = join.on.iter().map(|e| self.render_expr(e)).collect();
            sql.push_str(&format!(
                " {join_kw} {} ON ({})",
                self.render_table_ref(&join.table),
                on_clause.join(" AND ")
            ));
        }

        if !query.filters.is_empty() {
            let filters: Vec<String> = query.filters.iter().map(|f| self.render_expr(f)).collect();
            sql.push_str(&format!(" WHERE {}", filters.join(" AND ")));
        }

        if !query.group_by.is_empty() {
            let groups: Vec<String> = query.group_by.iter().map(|g| self.render_expr(g)).collect();
            sql.push_str(&format!(" GROUP BY {}", groups.join(", ")));
        }

        if !query.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.render_order_by(&query.order_by)));
        }

        sql
    }

    pub fn render_order_by(&self, items: &[OrderItem]) -> String {
        items
            .iter()
            .map(|o| {
                let expr = self.render_expr(&o.expr);
                if o.descending {
                    format!("{expr} DESC")
                } else {
                    expr
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_table_ref(&self, table: &TableRef) -> String {
        match &table.alias {
            Some(alias) => format!(
                "{} {}",
                self.dialect.quote_ident(&table.name),
                self.dialect.quote_ident(alias)
            ),
            None => self.dialect.quote_ident(&table.name),
        }
    }

    pub fn render_expr(&self, expr: &SqlExpr) -> String {
        match expr {
            SqlExpr::Column { table, name } => match table {
                Some(t) => format!(
                    "{}.{}",
                    self.dialect.quote_ident(t),
                    self.dialect.quote_ident(name)
                ),
                None => self.dialect.quote_ident(name),
            },
            SqlExpr::Raw(sql) => sql.clone(),
            SqlExpr::Literal(v) => self.dialect.render_literal(v),
            SqlExpr::Placeholder(idx) => self.dialect.placeholder(*idx),
            SqlExpr::Function { name, args } => {
                let rendered_args: Vec<String> = args.iter().map(|a| self.render_expr(a)).collect();
                format!("{name}({})", rendered_args.join(", "))
            }
            SqlExpr::Concat(parts) => parts
                .iter()
                .map(|p| self.render_expr(p))
                .collect::<Vec<_>>()
                .join(" || "),
            SqlExpr::Subquery(query) => format!("({})", self.render_select(query)),
            SqlExpr::NullProbe(inner) => {
                let rendered = self.render_expr(inner);
                format!("(SELECT {rendered} WHERE {rendered} IS NULL)")
            }
            SqlExpr::BinaryOp { op, left, right } => format!(
                "{} {} {}",
                self.render_expr(left),
                op.as_sql(),
                self.render_expr(right)
            ),
            SqlExpr::InList {
                expr,
                list,
                negated,
            } => {
                let rendered_values: Vec<String> =
                    list.iter().map(|v| self.render_expr(v)).collect();
                let not_kw = if *negated { "NOT " } else { "" };
                format!(
                    "{} {}IN ({})",
                    self.render_expr(expr),
                    not_kw,
                    rendered_values.join(", ")
                )
            }
            SqlExpr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let not_kw = if *negated { "NOT " } else { "" };
                format!(
                    "{} {}BETWEEN {} AND {}",
                    self.render_expr(expr),
                    not_kw,
                    self.render_expr(low),
                    self.render_expr(high)
                )
            }
            SqlExpr::IsNull { expr, negated } => {
                let not_kw = if *negated { "NOT " } else { "" };
                format!("{} IS {}NULL", self.render_expr(expr), not_kw)
            }
            SqlExpr::Or(parts) => parts
                .iter()
                .map(|p| self.render_expr(p))
                .collect::<Vec<_>>()
                .join(" OR "),
            SqlExpr::And(parts) => parts
                .iter()
                .map(|p| self.render_expr(p))
                .collect::<Vec<_>>()
                .join(" AND "),
            SqlExpr::Nested(inner) => format!("({})", self.render_expr(inner)),
        }
    }
}
