//! A1-notation helpers.

use std::sync::LazyLock;

use regex::Regex;

/// A single cell such as `A1` or `AB12`.
static CELL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,3}[1-9][0-9]*$").expect("Invalid cell regex"));

/// A cell or a rectangular range such as `B7:C20`.
static RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,3}[1-9][0-9]*(:[A-Z]{1,3}[1-9][0-9]*)?$").expect("Invalid range regex")
});

/// Quotes a sheet name for use in a range: `Daily Stats` becomes
/// `'Daily Stats'`, inner quotes are doubled.
pub fn quote_sheet_name(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Builds `'<sheet>'!<cells>`, or the whole sheet when `cells` is `None`.
pub fn a1_range(sheet: &str, cells: Option<&str>) -> String {
    match cells {
        Some(cells) => format!("{}!{}", quote_sheet_name(sheet), cells),
        None => quote_sheet_name(sheet),
    }
}

/// Whether `s` is a single cell reference.
pub fn is_cell_ref(s: &str) -> bool {
    CELL_REGEX.is_match(s)
}

/// Whether `s` is a cell or a cell range.
pub fn is_range_ref(s: &str) -> bool {
    RANGE_REGEX.is_match(s)
}

/// A column label such as `A` or `AB`.
static COLUMN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,3}$").expect("Invalid column regex"));

/// Zero-based index of a column label: `A` -> 0, `AA` -> 26.
pub fn column_index(letters: &str) -> Option<usize> {
    if !COLUMN_REGEX.is_match(letters) {
        return None;
    }
    let col = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
    col.checked_sub(1)
}

/// Parses a column list such as `A:F` or `A,C,E:F` into zero-based indices,
/// in the order given. Labels are case-insensitive.
pub fn parse_columns(list: &str) -> Option<Vec<usize>> {
    let mut columns = Vec::new();
    for part in list.split(',') {
        let part = part.trim().to_ascii_uppercase();
        match part.split_once(':') {
            Some((from, to)) => {
                let (from, to) = (column_index(from.trim())?, column_index(to.trim())?);
                if from > to {
                    return None;
                }
                columns.extend(from..=to);
            }
            None => columns.push(column_index(&part)?),
        }
    }
    Some(columns)
}

/// Cell in column A for the zero-based slot `index`: `A1`, `A2`, ...
pub fn column_a_cell(index: usize) -> String {
    format!("A{}", index + 1)
}

/// Zero-based, inclusive bounds of an A1 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

/// Parses `B7:C20` (or a single cell) into zero-based bounds.
pub fn parse_range(range: &str) -> Option<CellBounds> {
    if !is_range_ref(range) {
        return None;
    }
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (first_col, first_row) = split_cell(start)?;
    let (last_col, last_row) = split_cell(end)?;

    Some(CellBounds {
        first_row: first_row.min(last_row),
        last_row: first_row.max(last_row),
        first_col: first_col.min(last_col),
        last_col: first_col.max(last_col),
    })
}

/// `AB12` -> (27, 11).
fn split_cell(cell: &str) -> Option<(usize, usize)> {
    let digits = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, number) = cell.split_at(digits);
    let row: usize = number.parse().ok()?;
    Some((column_index(letters)?, row.checked_sub(1)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("Logs"), "'Logs'");
        assert_eq!(quote_sheet_name("Bob's Sheet"), "'Bob''s Sheet'");
    }

    #[test]
    fn test_a1_range() {
        assert_eq!(a1_range("Daily Stats", Some("B7:C20")), "'Daily Stats'!B7:C20");
        assert_eq!(a1_range("__STATE", None), "'__STATE'");
    }

    #[test]
    fn test_cell_refs() {
        assert!(is_cell_ref("A1"));
        assert!(is_cell_ref("AB120"));
        assert!(!is_cell_ref("A0"));
        assert!(!is_cell_ref("a1"));
        assert!(!is_cell_ref("B7:C20"));
        assert!(is_range_ref("B7:C20"));
        assert!(is_range_ref("B1"));
        assert!(!is_range_ref("B7:"));
    }

    #[test]
    fn test_column_a_cell() {
        assert_eq!(column_a_cell(0), "A1");
        assert_eq!(column_a_cell(2), "A3");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("F"), Some(5));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("a"), None);
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(parse_columns("A:F"), Some(vec![0, 1, 2, 3, 4, 5]));
        assert_eq!(parse_columns("c, a ,e:f"), Some(vec![2, 0, 4, 5]));
        assert_eq!(parse_columns("B"), Some(vec![1]));
        assert_eq!(parse_columns("F:A"), None);
        assert_eq!(parse_columns("A,"), None);
        assert_eq!(parse_columns("A:1"), None);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range("B7:C20"),
            Some(CellBounds {
                first_row: 6,
                last_row: 19,
                first_col: 1,
                last_col: 2,
            })
        );
        assert_eq!(
            parse_range("AA1"),
            Some(CellBounds {
                first_row: 0,
                last_row: 0,
                first_col: 26,
                last_col: 26,
            })
        );
        assert_eq!(parse_range("C20:B7"), parse_range("B7:C20"));
        assert_eq!(parse_range("7B"), None);
    }
}
