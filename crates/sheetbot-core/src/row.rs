//! Schema-less rows as read from a tabular source.

use crate::config::HeaderMode;

/// One line of a table: an ordered list of string cells.
///
/// Rows have no fixed arity. Use [`Row::cell`] instead of indexing; it
/// returns an empty string for cells past the end of a short row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<String>);

impl Row {
    /// Creates a row from its cells.
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    /// Returns the cell at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Returns the cell at `index`, or `""` past the end.
    pub fn cell(&self, index: usize) -> &str {
        self.get(index).unwrap_or("")
    }

    /// Number of cells actually present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A row is blank when every cell is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|c| c.trim().is_empty())
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn into_cells(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for Row {
    fn from(cells: Vec<String>) -> Self {
        Self(cells)
    }
}

impl From<Vec<&str>> for Row {
    fn from(cells: Vec<&str>) -> Self {
        Self(cells.into_iter().map(str::to_string).collect())
    }
}

/// Full content of one table at poll time, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// All rows, header included.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The header row, if the mode designates one and the table has any rows.
    pub fn header(&self, mode: HeaderMode) -> Option<&Row> {
        match mode {
            HeaderMode::FirstRow => self.rows.first(),
            HeaderMode::None => None,
        }
    }

    /// Rows after the header. The header is dropped by position only.
    pub fn data_rows(&self, mode: HeaderMode) -> &[Row] {
        match mode {
            HeaderMode::FirstRow if !self.rows.is_empty() => &self.rows[1..],
            HeaderMode::FirstRow => &[],
            HeaderMode::None => &self.rows,
        }
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

impl From<Vec<Vec<String>>> for RowSet {
    fn from(values: Vec<Vec<String>>) -> Self {
        Self {
            rows: values.into_iter().map(Row::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_past_end_is_empty() {
        let row = Row::from(vec!["a", "b"]);
        assert_eq!(row.cell(1), "b");
        assert_eq!(row.cell(7), "");
        assert_eq!(row.get(7), None);
    }

    #[test]
    fn test_blank_rows() {
        assert!(Row::default().is_blank());
        assert!(Row::from(vec!["", "  ", "\t"]).is_blank());
        assert!(!Row::from(vec!["", "x"]).is_blank());
    }

    #[test]
    fn test_data_rows_skip_header_by_position() {
        // The first row is the header even if it looks like data.
        let set = RowSet::from(vec![
            Row::from(vec!["1", "2"]),
            Row::from(vec!["3", "4"]),
        ]);

        assert_eq!(set.data_rows(HeaderMode::FirstRow).len(), 1);
        assert_eq!(set.data_rows(HeaderMode::None).len(), 2);
        assert_eq!(set.header(HeaderMode::FirstRow).map(|r| r.cell(0)), Some("1"));
        assert!(set.header(HeaderMode::None).is_none());
    }

    #[test]
    fn test_empty_set_with_header() {
        let set = RowSet::default();
        assert!(set.data_rows(HeaderMode::FirstRow).is_empty());
        assert!(set.header(HeaderMode::FirstRow).is_none());
    }

    #[test]
    fn test_rowset_from_values_keeps_ragged_rows() {
        let set = RowSet::from(vec![
            vec!["h1".to_string(), "h2".to_string(), "h3".to_string()],
            vec!["only".to_string()],
        ]);
        let data = set.data_rows(HeaderMode::FirstRow);
        assert_eq!(data[0].len(), 1);
        assert_eq!(data[0].cell(2), "");
    }
}
