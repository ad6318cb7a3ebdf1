use crate::data::{Cell, FunctionKind};
use crate::executor::Record;
use crate::models::{ReferenceType, ReportItem};
use crate::query_builder::QueryColumn;
use crate::value::CellValue;

use super::{ColumnMapping, Language, RECORD_ID, TABLE_NAME};

/// Locale formatting of dates, numbers, flags and summary values.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMapping;

impl DefaultMapping {
    /// Identifier columns read straight from the record; true when handled.
    fn map_identifier(column: &QueryColumn, record: &Record, cell: &mut Cell) -> bool {
        if !(column.reference.is_id() || column.column_name == RECORD_ID) {
            return false;
        }
        if let Some(id) = record.get_i64(&column.alias) {
            cell.value = CellValue::Reference(id);
        }
        if column.column_name == RECORD_ID {
            if let Some(table) = record
                .get_string(TABLE_NAME)
                .filter(|t| !t.trim().is_empty())
            {
                cell.table_name = Some(table);
            }
        }
        true
    }

    fn format_value(item: &ReportItem, language: &Language, cell: &mut Cell) {
        let pattern = item.format_pattern.as_deref();
        let display = match (&cell.value, item.reference) {
            (CellValue::Timestamp(ts), reference) if reference.is_date() => {
                Some(language.format_timestamp(*ts, reference, pattern))
            }
            (CellValue::Number(n), reference) if reference.is_numeric() => {
                Some(language.format_number(*n, reference, pattern))
            }
            (CellValue::Boolean(flag), ReferenceType::YesNo) => {
                Some(language.flag_label(*flag).to_string())
            }
            (CellValue::Text(_), ReferenceType::YesNo) => cell
                .value
                .as_bool()
                .map(|flag| language.flag_label(flag).to_string()),
            _ => None,
        };
        if display.is_some() {
            cell.display_value = display;
        }
    }

    fn format_functions(item: &ReportItem, language: &Language, cell: &mut Cell) {
        for kind in FunctionKind::ALL {
            let display = cell.function_value(kind).map(|value| {
                let reference = kind.display_type(item.reference);
                let pattern = if reference == item.reference {
                    item.format_pattern.as_deref()
                } else {
                    None
                };
                language.format_number(value, reference, pattern)
            });
            cell.function_display.set(kind, display);
        }
    }
}

impl ColumnMapping for DefaultMapping {
    fn process(
        &self,
        item: &ReportItem,
        column: Option<&QueryColumn>,
        language: &Language,
        record: Option<&Record>,
        cell: &mut Cell,
    ) {
        if let (Some(record), Some(column)) = (record, column) {
            if Self::map_identifier(column, record, cell) {
                return;
            }
        }
        Self::format_value(item, language, cell);
        Self::format_functions(item, language, cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SummaryFunction;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn process(item: &ReportItem, cell: &mut Cell) {
        DefaultMapping.process(item, None, &Language::default(), None, cell);
    }

    #[test]
    fn formats_amounts_dates_and_flags() {
        let amount = ReportItem::new(1, "Total", "GrandTotal", ReferenceType::Amount);
        let mut cell = Cell::new(Decimal::new(123450, 2));
        process(&amount, &mut cell);
        assert_eq!(cell.display(), "1,234.50");

        let date = ReportItem::new(2, "Date", "DateOrdered", ReferenceType::Date);
        let ts = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut cell = Cell::new(ts);
        process(&date, &mut cell);
        assert_eq!(cell.display(), "01/31/2024");

        let flag = ReportItem::new(3, "Active", "IsActive", ReferenceType::YesNo);
        let mut cell = Cell::new(true);
        process(&flag, &mut cell);
        assert_eq!(cell.display(), "Y");
        let mut cell = Cell::new("N");
        process(&flag, &mut cell);
        assert_eq!(cell.display(), "N");
    }

    #[test]
    fn leaves_unformattable_cells_untouched() {
        let amount = ReportItem::new(1, "Total", "GrandTotal", ReferenceType::Amount);
        let mut cell = Cell::new("n/a");
        process(&amount, &mut cell);
        assert_eq!(cell.display_value, None);

        let mut cell = Cell::null();
        process(&amount, &mut cell);
        assert_eq!(cell.display(), "");
    }

    #[test]
    fn formats_function_values_by_display_type() {
        let amount = ReportItem::new(1, "Total", "GrandTotal", ReferenceType::Amount);
        let mut function = SummaryFunction::new();
        function.add_value(Some(Decimal::from(10)));
        function.add_value(Some(Decimal::from(5)));
        let mut cell = Cell::new(function.sum()).with_function(function);
        process(&amount, &mut cell);
        assert_eq!(cell.function_display.sum.as_deref(), Some("15.00"));
        assert_eq!(cell.function_display.count.as_deref(), Some("2"));
        assert_eq!(cell.function_display.mean.as_deref(), Some("7.5"));
        assert_eq!(cell.function_display.min.as_deref(), Some("5.00"));
    }

    #[test]
    fn identifier_columns_take_integer_values() {
        let item = ReportItem::new(1, "Partner", "C_BPartner_ID", ReferenceType::TableDir);
        let column = QueryColumn {
            item_id: 1,
            column_name: "C_BPartner_ID".to_string(),
            alias: "C_BPartner_ID".to_string(),
            reference: ReferenceType::TableDir,
            is_display_value: false,
            is_virtual: false,
            expr: crate::sql_ast::SqlExpr::column("C_Order", "C_BPartner_ID"),
        };
        let record = Record::from_pairs([("c_bpartner_id", CellValue::from(Decimal::from(118)))]);
        let mut cell = Cell::new(Decimal::from(118)).with_display("Joe Block");
        DefaultMapping.process(&item, Some(&column), &Language::default(), Some(&record), &mut cell);
        assert_eq!(cell.value, CellValue::Reference(118));
        assert_eq!(cell.display(), "Joe Block");
    }
}
