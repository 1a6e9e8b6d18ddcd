//! Plain-text rendering of rows and reports, and splitting into messages.

use sheetbot_core::{InventoryTable, Row, StatsSummary};

/// Telegram's limit on message text.
pub const TELEGRAM_MAX_CHARS: usize = 4096;

/// Discord-style webhook limit on message content.
pub const WEBHOOK_MAX_CHARS: usize = 2000;

/// Width of the name column in the stats table.
const NAME_WIDTH: usize = 15;

/// Width of the count column in the stats table.
const COUNT_WIDTH: usize = 10;

/// Widest a column of the inventory table may get.
const INVENTORY_CELL_WIDTH: usize = 18;

/// Renders a row as `a | b | c`, dropping trailing empty cells.
pub fn render_row(row: &Row) -> String {
    let cells: Vec<&str> = row.cells().iter().map(|c| c.trim()).collect();
    let used = cells.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
    cells[..used].join(" | ")
}

/// Heading placed at the top of every message of a batch.
pub fn batch_heading(table: &str) -> String {
    format!("New rows in {}:", table)
}

/// Packs lines into bodies of at most `max_chars` characters each.
///
/// Lines keep their order and are never merged; a line longer than the
/// limit is split across bodies.
pub fn chunk_lines(lines: &[String], max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in lines {
        for piece in split_to_width(line, max_chars) {
            let piece_len = piece.chars().count();
            let needed = if current.is_empty() {
                piece_len
            } else {
                current_len + 1 + piece_len
            };

            if needed > max_chars && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Splits a line into pieces of at most `width` characters.
fn split_to_width(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

/// Renders a batch into messages of at most `max_chars`, each starting with
/// the table heading.
pub fn render_batch(table: &str, rows: &[Row], max_chars: usize) -> Vec<String> {
    let heading = batch_heading(table);
    let budget = max_chars.saturating_sub(heading.chars().count() + 1);
    let lines: Vec<String> = rows.iter().map(render_row).collect();

    chunk_lines(&lines, budget)
        .into_iter()
        .map(|body| format!("{}\n{}", heading, body))
        .collect()
}

/// Fixed-width table of per-person totals, meant for a monospace block.
pub fn render_stats_table(summary: &StatsSummary) -> String {
    let rule = "═".repeat(NAME_WIDTH + COUNT_WIDTH + 3);
    let mut lines = Vec::with_capacity(summary.entries.len() + 4);

    lines.push(format!(
        "{:<nw$} | {:>cw$}",
        "Person",
        "Items Sent",
        nw = NAME_WIDTH,
        cw = COUNT_WIDTH
    ));
    lines.push(rule.clone());
    for entry in &summary.entries {
        lines.push(format!(
            "{:<nw$} | {:>cw$}",
            entry.name,
            entry.total,
            nw = NAME_WIDTH,
            cw = COUNT_WIDTH
        ));
    }
    lines.push(rule);
    lines.push(format!(
        "💰 {:<nw$} | {:>cw$}",
        "Total Sent",
        summary.total,
        nw = NAME_WIDTH - 2,
        cw = COUNT_WIDTH
    ));

    lines.join("\n")
}

/// Fixed-width inventory table, meant for a monospace block.
///
/// The item column is left-aligned and the rest right-aligned. Cells wider
/// than the column cap are cut and end in `…`.
pub fn render_inventory_table(table: &InventoryTable) -> String {
    let mut widths = vec![0usize; table.headers.len()];
    for row in std::iter::once(&table.headers).chain(&table.rows) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count().min(INVENTORY_CELL_WIDTH));
        }
    }
    // Columns that are empty throughout are left out.
    let shown: Vec<(usize, usize)> = widths
        .into_iter()
        .enumerate()
        .filter(|&(_, w)| w > 0)
        .collect();

    let render = |cells: &[String]| -> String {
        shown
            .iter()
            .enumerate()
            .map(|(pos, &(i, w))| {
                let cell = truncate_cell(cells.get(i).map(String::as_str).unwrap_or(""), w);
                if pos == 0 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let rule_width =
        shown.iter().map(|&(_, w)| w).sum::<usize>() + 3 * shown.len().saturating_sub(1);
    let mut lines = Vec::with_capacity(table.rows.len() + 2);
    lines.push(render(table.headers.as_slice()));
    lines.push("═".repeat(rule_width));
    lines.extend(table.rows.iter().map(|row| render(row.as_slice())));
    lines.join("\n")
}

fn truncate_cell(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        return cell.to_string();
    }
    let mut cut: String = cell.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Escapes text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
