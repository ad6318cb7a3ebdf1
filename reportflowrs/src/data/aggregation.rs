//! Single-pass roll-up of summarized columns along every grouping axis.

use std::collections::BTreeMap;

use crate::models::ReportDefinition;
use crate::value::CellValue;

use super::cell::Cell;
use super::row::Row;
use super::summary::SummaryFunction;

/// Display values of the grouping cells for ranks `0..=k`.
pub type GroupKey = Vec<String>;

#[derive(Debug, Clone, Default)]
struct GroupTotals {
    /// Grouping cells of the first row seen for this key.
    key_cells: Vec<(i64, Cell)>,
    accumulators: BTreeMap<i64, SummaryFunction>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupAggregator {
    /// Grouping item ids; the index is the rank.
    axes: Vec<i64>,
    summarized: Vec<i64>,
    totals: Vec<BTreeMap<GroupKey, GroupTotals>>,
}

impl GroupAggregator {
    pub fn new(axes: Vec<i64>, summarized: Vec<i64>) -> Self {
        let totals = vec![BTreeMap::new(); axes.len()];
        Self {
            axes,
            summarized,
            totals,
        }
    }

    pub fn for_definition(definition: &ReportDefinition) -> Self {
        let axes = definition.group_items().iter().map(|item| item.id).collect();
        let summarized = definition
            .printed_items()
            .into_iter()
            .filter(|item| item.is_summarizable())
            .map(|item| item.id)
            .collect();
        Self::new(axes, summarized)
    }

    pub fn axes(&self) -> &[i64] {
        &self.axes
    }

    pub fn is_empty(&self) -> bool {
        self.totals.iter().all(BTreeMap::is_empty)
    }

    /// Fold one detail row into every enclosing group.
    pub fn add_row(&mut self, row: &Row) {
        for (rank, totals) in self.totals.iter_mut().enumerate() {
            let key: GroupKey = self.axes[..=rank]
                .iter()
                .map(|item_id| row.sort_value(*item_id))
                .collect();
            let entry = totals.entry(key).or_insert_with(|| GroupTotals {
                key_cells: self.axes[..=rank]
                    .iter()
                    .filter_map(|item_id| row.cell(*item_id).map(|c| (*item_id, c.clone())))
                    .collect(),
                accumulators: BTreeMap::new(),
            });
            for item_id in &self.summarized {
                let value = row
                    .cell(*item_id)
                    .and_then(|cell| cell.value.function_value());
                entry
                    .accumulators
                    .entry(*item_id)
                    .or_default()
                    .add_value(value);
            }
        }
    }

    /// Accumulator of one summarized column for the given axis and key.
    pub fn function(&self, rank: usize, key: &[String], item_id: i64) -> Option<&SummaryFunction> {
        self.totals
            .get(rank)?
            .get(key)?
            .accumulators
            .get(&item_id)
    }

    /// One summary row per distinct key per axis, in axis then key order.
    pub fn as_rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for (rank, totals) in self.totals.iter().enumerate() {
            for group in totals.values() {
                let mut row = Row::new(rank as i32);
                row.is_summary_row = true;
                for (item_id, cell) in &group.key_cells {
                    row.set_cell(*item_id, cell.clone());
                }
                for (item_id, function) in &group.accumulators {
                    let cell = Cell::new(CellValue::Number(function.sum()))
                        .with_function(function.clone());
                    row.set_cell(*item_id, cell);
                }
                rows.push(row);
            }
        }
        rows
    }
}
