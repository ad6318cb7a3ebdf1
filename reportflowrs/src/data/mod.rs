//! In-memory report model: cells, rows, summaries and their assembly.

mod aggregation;
mod cell;
mod column_info;
mod report_info;
mod row;
mod summary;
pub mod tree;

pub use aggregation::{GroupAggregator, GroupKey};
pub use cell::{Cell, DisplayFallback, FunctionDisplay};
pub use column_info::ColumnInfo;
pub use report_info::{ReportInfo, ReportOptions, ReportSummary};
pub use row::{listing_order, tree_order, Row};
pub use summary::{FunctionKind, SummaryFunction};
