use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Semantic kind of a report column, keyed by its display-type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    String,
    Integer,
    Amount,
    Id,
    Text,
    Date,
    DateTime,
    List,
    Table,
    TableDir,
    YesNo,
    Location,
    Number,
    Time,
    Account,
    Quantity,
    Search,
    Locator,
    Memo,
    PAttribute,
    TextLong,
    CostPrice,
    Url,
}

/// How the display value of a column is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// The raw value is displayed as-is.
    Plain,
    /// Display string computed inline by an embedded subquery.
    Directory,
    /// Display string read through a joined reference table.
    Joined,
}

impl ReferenceType {
    pub fn code(&self) -> i32 {
        match self {
            ReferenceType::String => 10,
            ReferenceType::Integer => 11,
            ReferenceType::Amount => 12,
            ReferenceType::Id => 13,
            ReferenceType::Text => 14,
            ReferenceType::Date => 15,
            ReferenceType::DateTime => 16,
            ReferenceType::List => 17,
            ReferenceType::Table => 18,
            ReferenceType::TableDir => 19,
            ReferenceType::YesNo => 20,
            ReferenceType::Location => 21,
            ReferenceType::Number => 22,
            ReferenceType::Time => 24,
            ReferenceType::Account => 25,
            ReferenceType::Quantity => 29,
            ReferenceType::Search => 30,
            ReferenceType::Locator => 31,
            ReferenceType::Memo => 34,
            ReferenceType::PAttribute => 35,
            ReferenceType::TextLong => 36,
            ReferenceType::CostPrice => 37,
            ReferenceType::Url => 40,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let reference = match code {
            10 => ReferenceType::String,
            11 => ReferenceType::Integer,
            12 => ReferenceType::Amount,
            13 => ReferenceType::Id,
            14 => ReferenceType::Text,
            15 => ReferenceType::Date,
            16 => ReferenceType::DateTime,
            17 => ReferenceType::List,
            18 => ReferenceType::Table,
            19 => ReferenceType::TableDir,
            20 => ReferenceType::YesNo,
            21 => ReferenceType::Location,
            22 => ReferenceType::Number,
            24 => ReferenceType::Time,
            25 => ReferenceType::Account,
            29 => ReferenceType::Quantity,
            30 => ReferenceType::Search,
            31 => ReferenceType::Locator,
            34 => ReferenceType::Memo,
            35 => ReferenceType::PAttribute,
            36 => ReferenceType::TextLong,
            37 => ReferenceType::CostPrice,
            40 => ReferenceType::Url,
            _ => return None,
        };
        Some(reference)
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ReferenceType::String
                | ReferenceType::Text
                | ReferenceType::TextLong
                | ReferenceType::Memo
                | ReferenceType::Url
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ReferenceType::Amount
                | ReferenceType::Number
                | ReferenceType::CostPrice
                | ReferenceType::Integer
                | ReferenceType::Quantity
        )
    }

    pub fn is_date(&self) -> bool {
        matches!(
            self,
            ReferenceType::Date | ReferenceType::DateTime | ReferenceType::Time
        )
    }

    pub fn is_id(&self) -> bool {
        matches!(
            self,
            ReferenceType::Id
                | ReferenceType::Table
                | ReferenceType::TableDir
                | ReferenceType::Search
                | ReferenceType::Location
                | ReferenceType::Account
                | ReferenceType::Locator
                | ReferenceType::PAttribute
        )
    }

    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            ReferenceType::List
                | ReferenceType::Table
                | ReferenceType::TableDir
                | ReferenceType::Search
                | ReferenceType::Location
                | ReferenceType::Account
                | ReferenceType::Locator
                | ReferenceType::PAttribute
        )
    }

    /// Classify how the display value is produced; `has_reference_value`
    /// tells a search column with an explicit reference from a bare one.
    pub fn lookup_kind(&self, has_reference_value: bool) -> LookupKind {
        match self {
            ReferenceType::TableDir => LookupKind::Directory,
            ReferenceType::Search if !has_reference_value => LookupKind::Directory,
            ReferenceType::Search
            | ReferenceType::Table
            | ReferenceType::List
            | ReferenceType::Location
            | ReferenceType::Account
            | ReferenceType::Locator
            | ReferenceType::PAttribute => LookupKind::Joined,
            _ => LookupKind::Plain,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One column of a report definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub print_name: Option<String>,
    /// Backing source column; items without one are not projected.
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub sequence: i32,
    #[serde(default)]
    pub sort_sequence: i32,
    pub reference: ReferenceType,
    #[serde(default)]
    pub reference_value_id: Option<i64>,
    #[serde(default)]
    pub is_mandatory: bool,
    /// SQL of a virtual (computed) column.
    #[serde(default)]
    pub column_sql: Option<String>,
    #[serde(default)]
    pub format_pattern: Option<String>,
    /// Identifier of a registered custom column mapping.
    #[serde(default)]
    pub mapping: Option<String>,
    #[serde(default = "default_true")]
    pub is_printed: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_order_by: bool,
    #[serde(default)]
    pub is_desc: bool,
    #[serde(default)]
    pub is_group_by: bool,
    #[serde(default)]
    pub is_summarized: bool,
    #[serde(default)]
    pub is_counted: bool,
    #[serde(default)]
    pub is_min_calc: bool,
    #[serde(default)]
    pub is_max_calc: bool,
    #[serde(default)]
    pub is_averaged: bool,
    #[serde(default)]
    pub is_variance_calc: bool,
    #[serde(default)]
    pub is_deviation_calc: bool,
    #[serde(default)]
    pub is_hide_grand_total: bool,
}

impl ReportItem {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        column_name: impl Into<String>,
        reference: ReferenceType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            print_name: None,
            column_name: Some(column_name.into()),
            sequence: 0,
            sort_sequence: 0,
            reference,
            reference_value_id: None,
            is_mandatory: false,
            column_sql: None,
            format_pattern: None,
            mapping: None,
            is_printed: true,
            is_active: true,
            is_order_by: false,
            is_desc: false,
            is_group_by: false,
            is_summarized: false,
            is_counted: false,
            is_min_calc: false,
            is_max_calc: false,
            is_averaged: false,
            is_variance_calc: false,
            is_deviation_calc: false,
            is_hide_grand_total: false,
        }
    }

    pub fn title(&self) -> &str {
        self.print_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_virtual(&self) -> bool {
        self.column_sql
            .as_deref()
            .map(|sql| !sql.trim().is_empty())
            .unwrap_or(false)
    }

    /// Feeds the group aggregation engine.
    pub fn is_summarizable(&self) -> bool {
        !self.is_hide_grand_total
            && (self.is_averaged
                || self.is_counted
                || self.is_max_calc
                || self.is_min_calc
                || self.is_summarized
                || self.is_variance_calc)
    }

    pub fn display_column_alias(&self) -> Option<String> {
        self.column_name
            .as_ref()
            .map(|column| format!("{}_{}_DisplayValue", column, self.id))
    }
}

/// Declarative report layout: printed columns plus grouping and ordering rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub table_name: String,
    #[serde(default = "default_data_source")]
    pub data_source: String,
    #[serde(default)]
    pub is_summary: bool,
    /// Raw GROUP BY expressions for summary-only layouts.
    #[serde(default)]
    pub group_by: Vec<String>,
    pub items: Vec<ReportItem>,
}

fn default_data_source() -> String {
    "default".to_string()
}

impl ReportDefinition {
    pub fn new(id: i64, name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            table_name: table_name.into(),
            data_source: default_data_source(),
            is_summary: false,
            group_by: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: ReportItem) -> Self {
        self.items.push(item);
        self
    }

    /// Active printed items in sequence order.
    pub fn printed_items(&self) -> Vec<&ReportItem> {
        let mut items: Vec<&ReportItem> = self
            .items
            .iter()
            .filter(|item| item.is_active && item.is_printed)
            .collect();
        items.sort_by_key(|item| item.sequence);
        items
    }

    /// Grouping axes in sort-sequence order. Only printed items carry cells,
    /// so only they can key a group.
    pub fn group_items(&self) -> Vec<&ReportItem> {
        let mut items: Vec<&ReportItem> = self
            .printed_items()
            .into_iter()
            .filter(|i| i.is_group_by)
            .collect();
        items.sort_by_key(|item| item.sort_sequence);
        items
    }

    pub fn sorting_items(&self) -> Vec<&ReportItem> {
        let mut items: Vec<&ReportItem> = self
            .printed_items()
            .into_iter()
            .filter(|i| i.is_order_by)
            .collect();
        items.sort_by_key(|item| item.sort_sequence);
        items
    }

    pub fn item(&self, id: i64) -> Option<&ReportItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Resolved join target of a lookup reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReference {
    pub table_name: String,
    pub key_column: String,
    pub display_column: String,
    #[serde(default)]
    pub is_value_displayed: bool,
    #[serde(default)]
    pub is_translated: bool,
    /// Key shared with the translation relation when it differs from `key_column`.
    #[serde(default)]
    pub translation_key: Option<String>,
    /// Extra equality applied to the join, e.g. the list a value belongs to.
    #[serde(default)]
    pub discriminator: Option<(String, i64)>,
}

impl ColumnReference {
    pub fn new(
        table_name: impl Into<String>,
        key_column: impl Into<String>,
        display_column: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            key_column: key_column.into(),
            display_column: display_column.into(),
            is_value_displayed: false,
            is_translated: false,
            translation_key: None,
            discriminator: None,
        }
    }

    pub fn translated(mut self) -> Self {
        self.is_translated = true;
        self
    }

    pub fn translation_table(&self) -> String {
        format!("{}_Trl", self.table_name)
    }

    pub fn translation_key(&self) -> &str {
        self.translation_key.as_deref().unwrap_or(&self.key_column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equal,
    NotEqual,
    In,
    NotIn,
    Between,
    NotBetween,
    Like,
    NotLike,
    Null,
    NotNull,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl FilterOperator {
    /// Unknown or empty operators fall back to equality.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "not_equal" | "!=" | "<>" => FilterOperator::NotEqual,
            "in" => FilterOperator::In,
            "not_in" | "not in" => FilterOperator::NotIn,
            "between" => FilterOperator::Between,
            "not_between" | "not between" => FilterOperator::NotBetween,
            "like" => FilterOperator::Like,
            "not_like" | "not like" => FilterOperator::NotLike,
            "null" | "is null" => FilterOperator::Null,
            "not_null" | "is not null" => FilterOperator::NotNull,
            "greater" | ">" => FilterOperator::Greater,
            "greater_equal" | ">=" => FilterOperator::GreaterEqual,
            "less" | "<" => FilterOperator::Less,
            "less_equal" | "<=" => FilterOperator::LessEqual,
            _ => FilterOperator::Equal,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "=",
            FilterOperator::NotEqual => "<>",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT IN",
            FilterOperator::Between => "BETWEEN",
            FilterOperator::NotBetween => "NOT BETWEEN",
            FilterOperator::Like => "LIKE",
            FilterOperator::NotLike => "NOT LIKE",
            FilterOperator::Null => "IS NULL",
            FilterOperator::NotNull => "IS NOT NULL",
            FilterOperator::Greater => ">",
            FilterOperator::GreaterEqual => ">=",
            FilterOperator::Less => "<",
            FilterOperator::LessEqual => "<=",
        }
    }
}

impl Default for FilterOperator {
    fn default() -> Self {
        FilterOperator::Equal
    }
}

impl<'de> Deserialize<'de> for FilterOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| FilterOperator::parse(&s)).unwrap_or_default())
    }
}

/// User-supplied restriction in wire form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    pub column_name: String,
    #[serde(default)]
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub from_value: Value,
    #[serde(default)]
    pub to_value: Value,
}

impl Filter {
    pub fn new(column_name: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            column_name: column_name.into(),
            operator,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }

    pub fn with_range(mut self, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.from_value = from.into();
        self.to_value = to.into();
        self
    }
}

/// Request to run one report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Print format id; 0 or absent is rejected.
    #[serde(default)]
    pub report_id: Option<i64>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Rows per page; 0 uses the configured page size, -1 disables paging.
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub page_token: Option<String>,
}
