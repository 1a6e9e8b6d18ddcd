//! Per-person totals for the daily stats report.

use std::collections::HashMap;

use crate::row::Row;

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsEntry {
    pub name: String,
    pub total: i64,
}

/// Aggregated totals, highest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub entries: Vec<StatsEntry>,
    pub total: i64,
}

impl StatsSummary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sums the quantity column per name.
///
/// Rows too short to hold both columns, rows with a blank name and rows whose
/// quantity is not an integer are skipped. Names are trimmed before grouping.
/// Entries are ordered by total descending, then by name.
pub fn aggregate_totals(rows: &[Row], name_col: usize, qty_col: usize) -> StatsSummary {
    let mut totals: HashMap<String, i64> = HashMap::new();
    let mut total = 0i64;

    for row in rows {
        let (Some(name), Some(qty)) = (row.get(name_col), row.get(qty_col)) else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let Ok(qty) = qty.trim().parse::<i64>() else {
            continue;
        };

        *totals.entry(name.to_string()).or_insert(0) += qty;
        total += qty;
    }

    let mut entries: Vec<StatsEntry> = totals
        .into_iter()
        .map(|(name, total)| StatsEntry { name, total })
        .collect();
    entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    StatsSummary { entries, total }
}
