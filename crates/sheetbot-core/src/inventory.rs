//! Inventory snapshot ordered by a priority list.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::row::Row;

/// Selected columns of the inventory sheet, rows in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl InventoryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rank of each item named in the first column of the priority sheet.
///
/// Names are trimmed and compared case-insensitively; the first occurrence
/// wins and blank names are ignored.
pub fn priority_ranks(priority: &[Row]) -> HashMap<String, usize> {
    let mut ranks = HashMap::new();
    for row in priority {
        let name = row.cell(0).trim();
        if name.is_empty() {
            continue;
        }
        let next = ranks.len();
        ranks.entry(name.to_lowercase()).or_insert(next);
    }
    ranks
}

/// Projects `columns` out of the inventory and orders the rows.
///
/// The first row of `inventory` is the header. The first selected column
/// holds the item name; rows with a blank name are dropped. Rows are sorted
/// by priority rank (unlisted items last), then by item name.
pub fn sort_inventory(inventory: &[Row], priority: &[Row], columns: &[usize]) -> InventoryTable {
    let Some((header, data)) = inventory.split_first() else {
        return InventoryTable::default();
    };
    let Some(&item_col) = columns.first() else {
        return InventoryTable::default();
    };

    let ranks = priority_ranks(priority);
    let project = |row: &Row| -> Vec<String> {
        columns.iter().map(|&c| row.cell(c).trim().to_string()).collect()
    };

    let mut keyed: Vec<(Option<usize>, String, Vec<String>)> = data
        .iter()
        .filter(|row| !row.cell(item_col).trim().is_empty())
        .map(|row| {
            let name = row.cell(item_col).trim().to_lowercase();
            (ranks.get(&name).copied(), name, project(row))
        })
        .collect();

    keyed.sort_by(|a, b| compare_rank(a.0, b.0).then_with(|| a.1.cmp(&b.1)));

    InventoryTable {
        headers: project(header),
        rows: keyed.into_iter().map(|(_, _, cells)| cells).collect(),
    }
}

/// Ranked items first, in rank order.
fn compare_rank(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
