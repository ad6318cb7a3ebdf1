use std::cmp::Ordering;
use std::collections::HashMap;

use super::cell::Cell;

/// Cells keyed by report item id, plus their grouping address.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: HashMap<i64, Cell>,
    /// Grouping depth; 0 is the outermost total.
    pub level: i32,
    /// Financial address within a level.
    pub sequence: i32,
    pub is_summary_row: bool,
    /// Filled only when building a tree.
    pub children: Vec<Row>,
}

impl Row {
    pub fn new(level: i32) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn at(level: i32, sequence: i32) -> Self {
        Self {
            level,
            sequence,
            ..Default::default()
        }
    }

    pub fn with_cell(mut self, item_id: i64, cell: Cell) -> Self {
        self.cells.insert(item_id, cell);
        self
    }

    pub fn set_cell(&mut self, item_id: i64, cell: Cell) {
        self.cells.insert(item_id, cell);
    }

    pub fn cell(&self, item_id: i64) -> Option<&Cell> {
        self.cells.get(&item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Display value used for ordering; missing cells sort as empty.
    pub fn sort_value(&self, item_id: i64) -> String {
        self.cells
            .get(&item_id)
            .map(|cell| cell.display())
            .unwrap_or_default()
    }
}

/// Case-insensitive comparison of the sort columns' display values.
fn compare_sort_columns(a: &Row, b: &Row, sorting: &[i64]) -> Ordering {
    for item_id in sorting {
        let ordering = a
            .sort_value(*item_id)
            .to_lowercase()
            .cmp(&b.sort_value(*item_id).to_lowercase());
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Flat listing order: summaries after the rows they total.
pub fn listing_order(sorting: &[i64]) -> impl Fn(&Row, &Row) -> Ordering + '_ {
    move |a, b| {
        if sorting.is_empty() {
            return a.level.cmp(&b.level);
        }
        compare_sort_columns(a, b, sorting).then_with(|| b.level.cmp(&a.level))
    }
}

/// Tree assembly order: parents (lower levels) ahead of their members.
pub fn tree_order(sorting: &[i64]) -> impl Fn(&Row, &Row) -> Ordering + '_ {
    move |a, b| {
        if sorting.is_empty() {
            return b.level.cmp(&a.level);
        }
        compare_sort_columns(a, b, sorting).then_with(|| a.level.cmp(&b.level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(region: &str, level: i32) -> Row {
        Row::new(level).with_cell(1, Cell::new(region))
    }

    fn labels(rows: &[Row]) -> Vec<(String, i32)> {
        rows.iter().map(|r| (r.sort_value(1), r.level)).collect()
    }

    #[test]
    fn the_two_orders_place_summaries_differently() {
        let rows = vec![row("us", 2), row("EU", 2), row("US", 0), row("eu", 0)];
        let sorting = [1];

        let mut listing = rows.clone();
        listing.sort_by(listing_order(&sorting));
        assert_eq!(
            labels(&listing),
            vec![
                ("EU".to_string(), 2),
                ("eu".to_string(), 0),
                ("us".to_string(), 2),
                ("US".to_string(), 0)
            ]
        );

        let mut tree = rows;
        tree.sort_by(tree_order(&sorting));
        assert_eq!(
            labels(&tree),
            vec![
                ("eu".to_string(), 0),
                ("EU".to_string(), 2),
                ("US".to_string(), 0),
                ("us".to_string(), 2)
            ]
        );
    }

    #[test]
    fn without_sort_columns_only_levels_count() {
        let rows = vec![row("a", 1), row("b", 0), row("c", 2)];
        let mut listing = rows.clone();
        listing.sort_by(listing_order(&[]));
        assert_eq!(
            listing.iter().map(|r| r.level).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        let mut tree = rows;
        tree.sort_by(tree_order(&[]));
        assert_eq!(
            tree.iter().map(|r| r.level).collect::<Vec<_>>(),
            vec![2, 1, 0]
        );
    }
}
