// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Physicalizer: reconstructed tables, export modes,
// and paper sizes.

use serde::{Deserialize, Serialize};

/// Header cells used for key/value tables.
pub const KEY_VALUE_HEADER: [&str; 2] = ["Key", "Value"];

/// How the header row of a [`Table`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderSource {
    /// The first recognized row was kept as the header.
    Detected,
    /// A `Col1..ColN` row was prepended; every recognized row is data.
    Synthesized,
    /// Two-column `Key`/`Value` table built from `label: value` lines.
    KeyValue,
}

/// A rectangular table reconstructed from OCR text.
///
/// The first row is always the header and every row has the same width.
/// Construction goes through [`Table::new`], which pads short rows with empty
/// cells so the invariant holds for any input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    rows: Vec<Vec<String>>,
    header_source: HeaderSource,
}

impl Table {
    /// Build a table from a header row and data rows, padding every row with
    /// empty strings up to the widest row.
    pub fn new(header: Vec<String>, data: Vec<Vec<String>>, header_source: HeaderSource) -> Self {
        let mut rows = Vec::with_capacity(data.len() + 1);
        rows.push(header);
        rows.extend(data);

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Self {
            rows,
            header_source,
        }
    }

    /// Build a `Key`/`Value` table from ordered pairs.
    pub fn key_value(pairs: Vec<(String, String)>) -> Self {
        let header = KEY_VALUE_HEADER.iter().map(|s| s.to_string()).collect();
        let data = pairs.into_iter().map(|(k, v)| vec![k, v]).collect();
        Self::new(header, data, HeaderSource::KeyValue)
    }

    /// All rows, header first.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The header row.
    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        &self.rows[1..]
    }

    /// Number of columns (identical for every row).
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn header_source(&self) -> HeaderSource {
        self.header_source
    }

    pub fn is_key_value(&self) -> bool {
        self.header_source == HeaderSource::KeyValue
    }

    /// Serialize the rows as a JSON list-of-lists, the shape table exporters
    /// consume.
    pub fn to_json_rows(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.rows)
    }
}

/// What kind of document an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportMode {
    /// Bulleted list of the recognized lines.
    Summary,
    /// Structured table.
    Table,
}

/// Which export the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPreference {
    /// Table when one can be inferred, summary otherwise.
    #[default]
    Auto,
    /// Always a summary, even when a table was found.
    Summary,
    /// A table was requested; falls back to a summary when none is found.
    Table,
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    /// Custom dimensions in millimetres.
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn new_pads_short_rows() {
        let table = Table::new(
            row(&["Col1", "Col2", "Col3"]),
            vec![row(&["a", "b", "c"]), row(&["d", "e"])],
            HeaderSource::Synthesized,
        );
        assert_eq!(table.width(), 3);
        assert_eq!(table.data_rows()[1], row(&["d", "e", ""]));
    }

    #[test]
    fn new_pads_header_when_data_is_wider() {
        let table = Table::new(row(&["x"]), vec![row(&["1", "2"])], HeaderSource::Detected);
        assert_eq!(table.header(), row(&["x", ""]).as_slice());
    }

    #[test]
    fn key_value_has_fixed_header() {
        let table = Table::key_value(vec![("Name".into(), "Alice".into())]);
        assert!(table.is_key_value());
        assert_eq!(table.header(), row(&["Key", "Value"]).as_slice());
        assert_eq!(table.data_rows(), &[row(&["Name", "Alice"])]);
    }

    #[test]
    fn json_rows_are_list_of_lists() {
        let table = Table::key_value(vec![("Age".into(), "30".into())]);
        let json = table.to_json_rows().expect("serializes");
        assert_eq!(json, r#"[["Key","Value"],["Age","30"]]"#);
    }

    #[test]
    fn export_preference_uses_snake_case() {
        let pref: ExportPreference = serde_json::from_str("\"table\"").expect("parses");
        assert_eq!(pref, ExportPreference::Table);
    }

    #[test]
    fn paper_dimensions() {
        assert_eq!(PaperSize::A4.dimensions_mm(), (210, 297));
        assert_eq!(
            PaperSize::Custom {
                width_mm: 100,
                height_mm: 50
            }
            .dimensions_mm(),
            (100, 50)
        );
    }
}
