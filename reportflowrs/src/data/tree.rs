//! Parent/child hierarchy over completed report rows.
//!
//! Financial reports address rows explicitly by `(level, sequence)`.
//! Everything else nests by grouping rank, matching parents and children
//! on the grouping cells of every enclosing rank.

use super::row::Row;

/// Roots at level 0; children sit one level deeper under the same sequence.
pub fn financial_tree(rows: &[Row]) -> Vec<Row> {
    rows.iter()
        .filter(|row| row.level == 0)
        .map(|root| with_financial_children(rows, root))
        .collect()
}

fn with_financial_children(rows: &[Row], parent: &Row) -> Row {
    let mut node = parent.clone();
    node.children = rows
        .iter()
        .filter(|row| row.level == parent.level + 1 && row.sequence == parent.sequence)
        .map(|child| with_financial_children(rows, child))
        .collect();
    node
}

/// Nest rows by grouping rank. `axes` holds the grouping item ids by rank;
/// without any the rows come back flat.
pub fn grouped_tree(rows: &[Row], axes: &[i64]) -> Vec<Row> {
    if axes.is_empty() {
        return rows.to_vec();
    }
    let builder = GroupedTree { rows, axes };
    rows.iter()
        .filter(|row| row.level == 0)
        .map(|root| builder.with_children(root, 1))
        .collect()
}

struct GroupedTree<'a> {
    rows: &'a [Row],
    axes: &'a [i64],
}

impl GroupedTree<'_> {
    fn with_children(&self, parent: &Row, depth: usize) -> Row {
        let mut node = parent.clone();
        let size = self.axes.len();
        let has_rank = depth < size;
        if (!has_rank && size > 1) || depth == 0 || depth > size {
            return node;
        }
        let children = self.rows.iter().filter(|row| {
            let level_matches = if has_rank {
                row.level == depth as i32
            } else {
                row.level > parent.level
            };
            level_matches && self.matches(parent, row, depth)
        });
        node.children = if size == 1 {
            children.cloned().collect()
        } else if depth + 1 < size {
            children
                .map(|child| self.with_children(child, depth + 1))
                .collect()
        } else {
            children.map(|child| self.with_all_children(child)).collect()
        };
        node
    }

    /// Last rank: every deeper row sharing all grouping cells, in one step.
    fn with_all_children(&self, parent: &Row) -> Row {
        let mut node = parent.clone();
        node.children = self
            .rows
            .iter()
            .filter(|row| row.level > parent.level && self.matches(parent, row, self.axes.len()))
            .cloned()
            .collect();
        node
    }

    /// Grouping cells of ranks `0..depth` equal; null or missing cells never match.
    fn matches(&self, parent: &Row, child: &Row, depth: usize) -> bool {
        self.axes[..depth.min(self.axes.len())]
            .iter()
            .all(|item_id| match (parent.cell(*item_id), child.cell(*item_id)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            })
    }
}
