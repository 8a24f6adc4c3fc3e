// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Heuristic table reconstruction from raw OCR text.
//
// Rules are tried in a fixed order and the first one that produces a table
// wins:
//
// 1. no non-blank lines            -> no table
// 2. enough `key: value` lines     -> Key/Value table
// 3. delimiter search              -> padded table, detected or synthesized header
// 4. any `key: value` lines at all -> Key/Value table
// 5. otherwise                     -> no table

use std::sync::LazyLock;

use physicalizer_core::types::{HeaderSource, Table};
use regex::Regex;
use tracing::{debug, instrument};

/// A text counts as key/value data when at least `ceil(lines / 3)` of its
/// lines contain a colon. Empirical; changing it changes which inputs become
/// Key/Value tables.
pub const KEY_VALUE_LINE_DIVISOR: usize = 3;

/// A row is "mostly numeric" when at least `cells / 2` (integer division) of
/// its cells contain a digit. Empirical, like [`KEY_VALUE_LINE_DIVISOR`].
pub const NUMERIC_ROW_DIVISOR: usize = 2;

/// Every row of an eligible delimiter split must have at least this many cells.
pub const MIN_COLUMNS: usize = 2;

const KEY_VALUE_SEPARATOR: char = ':';

static WIDE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("static pattern compiles"));

/// Column separators considered by the delimiter search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Pipe,
    Comma,
    /// Runs of two or more spaces, or any whitespace on lines without such a
    /// run. Always tried last. Tabs next to a space run stay inside the cell;
    /// tab-separated text is left to [`Delimiter::Tab`].
    Whitespace,
}

impl Delimiter {
    /// Search order. On equal spread the earlier delimiter is kept.
    pub const PRIORITY: [Delimiter; 4] = [
        Delimiter::Tab,
        Delimiter::Pipe,
        Delimiter::Comma,
        Delimiter::Whitespace,
    ];

    /// Split one line into trimmed, non-empty cells.
    pub fn split(self, line: &str) -> Vec<String> {
        let pieces: Vec<&str> = match self {
            Self::Tab => line.split('\t').collect(),
            Self::Pipe => line.split('|').collect(),
            Self::Comma => line.split(',').collect(),
            Self::Whitespace if WIDE_GAP.is_match(line) => WIDE_GAP.split(line).collect(),
            Self::Whitespace => line.split_whitespace().collect(),
        };
        pieces
            .into_iter()
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One delimiter's split of every line.
#[derive(Debug)]
struct Candidate {
    delimiter: Delimiter,
    rows: Vec<Vec<String>>,
    spread: usize,
}

impl Candidate {
    /// Split `lines` with `delimiter`; `None` when some row ends up with fewer
    /// than [`MIN_COLUMNS`] cells.
    fn split(delimiter: Delimiter, lines: &[&str]) -> Option<Self> {
        let rows: Vec<Vec<String>> = lines.iter().map(|line| delimiter.split(line)).collect();
        let min = rows.iter().map(Vec::len).min()?;
        let max = rows.iter().map(Vec::len).max()?;
        if min < MIN_COLUMNS {
            return None;
        }
        Some(Self {
            delimiter,
            rows,
            spread: max - min,
        })
    }
}

/// Reconstruct a table from raw OCR text.
///
/// Returns `None` when no structure can be recovered; the caller is expected
/// to fall back to a plain summary. Deterministic and side-effect free.
#[instrument(skip(text), fields(text_len = text.len()))]
pub fn infer_table(text: &str) -> Option<Table> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        debug!("No non-blank lines");
        return None;
    }

    let colon_lines = lines
        .iter()
        .filter(|line| line.contains(KEY_VALUE_SEPARATOR))
        .count();
    if colon_lines >= lines.len().div_ceil(KEY_VALUE_LINE_DIVISOR) {
        debug!(colon_lines, lines = lines.len(), "Key/value layout detected");
        return Some(Table::key_value(key_value_pairs(&lines)));
    }

    if let Some(candidate) = best_candidate(&lines) {
        debug!(
            delimiter = ?candidate.delimiter,
            spread = candidate.spread,
            rows = candidate.rows.len(),
            "Delimiter selected"
        );
        return Some(with_header(candidate.rows));
    }

    let pairs = key_value_pairs(&lines);
    if !pairs.is_empty() {
        debug!(pairs = pairs.len(), "Falling back to key/value pairs");
        return Some(Table::key_value(pairs));
    }

    debug!("No structure found");
    None
}

/// Evaluate delimiters in [`Delimiter::PRIORITY`] order and keep the eligible
/// split with the lowest spread. Only a strictly lower spread replaces the
/// current best.
fn best_candidate(lines: &[&str]) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for delimiter in Delimiter::PRIORITY {
        let Some(candidate) = Candidate::split(delimiter, lines) else {
            continue;
        };
        match &best {
            Some(current) if candidate.spread >= current.spread => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Split every colon-bearing line on its first colon.
fn key_value_pairs(lines: &[&str]) -> Vec<(String, String)> {
    lines
        .iter()
        .filter_map(|line| line.split_once(KEY_VALUE_SEPARATOR))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Pad `rows` to a rectangle and decide whether the first row is a header.
///
/// The first row is kept as the header when it contains a letter and some
/// later row is mostly numeric; otherwise `Col1..ColN` is prepended and the
/// first row becomes data.
fn with_header(mut rows: Vec<Vec<String>>) -> Table {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }

    let first_has_letter = rows
        .first()
        .is_some_and(|row| row.iter().any(|cell| cell.chars().any(char::is_alphabetic)));
    let numeric_body = rows.iter().skip(1).any(|row| is_mostly_numeric(row));

    if first_has_letter && numeric_body {
        let data = rows.split_off(1);
        let header = rows.pop().unwrap_or_default();
        Table::new(header, data, HeaderSource::Detected)
    } else {
        let header = (1..=width).map(|i| format!("Col{i}")).collect();
        Table::new(header, rows, HeaderSource::Synthesized)
    }
}

fn is_mostly_numeric(row: &[String]) -> bool {
    let needed = (row.len() / NUMERIC_ROW_DIVISOR).max(1);
    let digit_cells = row
        .iter()
        .filter(|cell| cell.chars().any(|c| c.is_ascii_digit()))
        .count();
    digit_cells >= needed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(table: &Table) -> Vec<Vec<&str>> {
        table
            .rows()
            .iter()
            .map(|row| row.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        assert!(infer_table("").is_none());
        assert!(infer_table("   \n  \n").is_none());
    }

    #[test]
    fn key_value_lines() {
        let table = infer_table("Name: Alice\nAge: 30\nCity: Paris").expect("table");
        assert_eq!(
            rows(&table),
            vec![
                vec!["Key", "Value"],
                vec!["Name", "Alice"],
                vec!["Age", "30"],
                vec!["City", "Paris"],
            ]
        );
        assert_eq!(table.header_source(), HeaderSource::KeyValue);
    }

    #[test]
    fn key_value_splits_on_first_colon_only() {
        let table = infer_table("Start: 12:30\nEnd: 14:00").expect("table");
        assert_eq!(table.data_rows()[0], vec!["Start", "12:30"]);
    }

    #[test]
    fn key_value_needs_a_third_of_lines() {
        // 2 of 4 lines >= ceil(4 / 3) = 2: key/value wins and skips the rest.
        let table = infer_table("Total: 5\nitem,qty\napple,3\nOwner: Bob").expect("table");
        assert_eq!(
            rows(&table),
            vec![vec!["Key", "Value"], vec!["Total", "5"], vec!["Owner", "Bob"]]
        );
    }

    #[test]
    fn key_value_pre_empts_a_clean_delimited_reading() {
        let table = infer_table("a,b: 1\nc,d: 2").expect("table");
        assert!(table.is_key_value());
        assert_eq!(table.data_rows()[0], vec!["a,b", "1"]);
    }

    #[test]
    fn timestamp_is_read_as_key_value() {
        let table = infer_table("Meeting 12:30\nRoom 4\nAgenda").expect("table");
        assert_eq!(
            rows(&table),
            vec![vec!["Key", "Value"], vec!["Meeting 12", "30"]]
        );
    }

    #[test]
    fn tab_separated_with_detected_header() {
        let table = infer_table("Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tNYC").expect("table");
        assert_eq!(
            rows(&table),
            vec![
                vec!["Name", "Age", "City"],
                vec!["Alice", "30", "Paris"],
                vec!["Bob", "25", "NYC"],
            ]
        );
        assert_eq!(table.header_source(), HeaderSource::Detected);
    }

    #[test]
    fn single_column_text_yields_nothing() {
        assert!(infer_table("apple\nbanana\ncherry").is_none());
    }

    #[test]
    fn short_rows_are_padded_under_synthesized_header() {
        let table = infer_table("a,b,c\nd,e").expect("table");
        assert_eq!(
            rows(&table),
            vec![
                vec!["Col1", "Col2", "Col3"],
                vec!["a", "b", "c"],
                vec!["d", "e", ""],
            ]
        );
        assert_eq!(table.header_source(), HeaderSource::Synthesized);
    }

    #[test]
    fn pipe_table_with_border_cells_dropped() {
        let table = infer_table("| Item | Qty |\n| Bolt | 40 |\n| Nut | 120 |").expect("table");
        assert_eq!(
            rows(&table),
            vec![vec!["Item", "Qty"], vec!["Bolt", "40"], vec!["Nut", "120"]]
        );
    }

    #[test]
    fn aligned_columns_split_on_wide_gaps() {
        let table =
            infer_table("Item name   Qty   Unit price\nGreen apple   3   1.20\nPear   10   0.80")
                .expect("table");
        assert_eq!(
            rows(&table),
            vec![
                vec!["Item name", "Qty", "Unit price"],
                vec!["Green apple", "3", "1.20"],
                vec!["Pear", "10", "0.80"],
            ]
        );
    }

    #[test]
    fn single_spaces_fall_back_to_any_whitespace() {
        let table = infer_table("alpha beta\ngamma delta epsilon").expect("table");
        assert_eq!(
            rows(&table),
            vec![
                vec!["Col1", "Col2", "Col3"],
                vec!["alpha", "beta", ""],
                vec!["gamma", "delta", "epsilon"],
            ]
        );
    }

    #[test]
    fn equal_spread_keeps_earlier_delimiter() {
        let table = infer_table("a\tb,c\nd\te,f").expect("table");
        assert_eq!(table.data_rows()[0], vec!["a", "b,c"]);
    }

    #[test]
    fn strictly_lower_spread_replaces_earlier_delimiter() {
        // Pipe gives widths 2 and 3; comma gives 3 and 3.
        let table = infer_table("x|y, 1, 2\n3, 4, 5|6|7").expect("table");
        assert_eq!(
            rows(&table),
            vec![vec!["x|y", "1", "2"], vec!["3", "4", "5|6|7"]]
        );
    }

    #[test]
    fn numeric_first_row_is_not_a_header() {
        let table = infer_table("1,2\n3,4").expect("table");
        assert_eq!(table.header(), ["Col1", "Col2"]);
        assert_eq!(table.data_rows().len(), 2);
    }

    #[test]
    fn single_row_gets_synthesized_header() {
        let table = infer_table("Name, Age").expect("table");
        assert_eq!(rows(&table), vec![vec!["Col1", "Col2"], vec!["Name", "Age"]]);
    }

    #[test]
    fn falls_back_to_key_value_when_no_delimiter_fits() {
        // 1 colon line of 4 is below ceil(4 / 3) = 2, and no delimiter gives
        // every line two cells.
        let table = infer_table("alpha\nbeta\ngamma\nNote: keep").expect("table");
        assert_eq!(rows(&table), vec![vec!["Key", "Value"], vec!["Note", "keep"]]);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let table = infer_table("\nName: Alice\n   \n\nAge: 30\n").expect("table");
        assert_eq!(table.data_rows().len(), 2);
    }

    #[test]
    fn inference_is_deterministic() {
        let text = "Name\tAge\nAlice\t30\nBob\t25\nCarol";
        assert_eq!(infer_table(text), infer_table(text));
    }

    #[test]
    fn mostly_numeric_uses_integer_half() {
        let row = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        assert!(is_mostly_numeric(&row(&["Alice", "30", "Paris"])));
        assert!(!is_mostly_numeric(&row(&["d", "e", ""])));
        assert!(is_mostly_numeric(&row(&["a", "1"])));
        assert!(!is_mostly_numeric(&row(&["a", "b", "c", "4"])));
    }

    #[test]
    fn whitespace_split_drops_empty_cells() {
        assert_eq!(Delimiter::Whitespace.split("  a    b  "), vec!["a", "b"]);
        assert_eq!(Delimiter::Comma.split("a,,b,"), vec!["a", "b"]);
    }

    #[test]
    fn space_runs_leave_tabs_inside_cells() {
        assert_eq!(Delimiter::Whitespace.split("a  b\tc"), vec!["a", "b\tc"]);
        assert_eq!(Delimiter::Tab.split("a  b\tc"), vec!["a  b", "c"]);
    }
}
