//! In-memory CSV tables.
//!
//! Source tables arrive with whatever columns their ingestion step produced,
//! so rows are kept as raw text and only the columns the engine needs are
//! looked up by name.

use crate::error::{ReconError, Result};
use csv::{ReaderBuilder, Trim};
use std::io::{Read, Write};

/// A fully materialized table of text cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name used in error messages (e.g. `candidate`, `ledger`).
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table, padding or truncating rows to the header width.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Table {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Reads a table from CSV with a header row.
    ///
    /// Surrounding whitespace is trimmed and short rows are padded with
    /// empty cells.
    pub fn from_csv<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Table::new(name, headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column` in the header, if present.
    pub fn find_column(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Position of a required column.
    ///
    /// # Errors
    ///
    /// [`ReconError::MissingColumn`] naming this table and the column.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.find_column(column)
            .ok_or_else(|| ReconError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Cell at `(row, col)`; empty if out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Returns a copy with `values` as the first column named `column`.
    ///
    /// An existing column of the same name is dropped first.
    pub fn with_leading_column(&self, column: &str, values: Vec<String>) -> Table {
        let existing = self.find_column(column);

        let mut headers = vec![column.to_string()];
        headers.extend(
            self.headers
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != existing)
                .map(|(_, h)| h.clone()),
        );

        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut out = vec![value];
                out.extend(
                    row.iter()
                        .enumerate()
                        .filter(|(i, _)| Some(*i) != existing)
                        .map(|(_, c)| c.clone()),
                );
                out
            })
            .collect();

        Table::new(self.name.clone(), headers, rows)
    }

    /// Writes the table as CSV, header first.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load(csv: &str) -> Table {
        Table::from_csv("ledger", Cursor::new(csv)).unwrap()
    }

    #[test]
    fn test_from_csv_trims_and_pads() {
        let table = load("a, b, c\n 1 ,2\n4,5,6\n");
        assert_eq!(table.headers(), ["a", "b", "c"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), "1");
        assert_eq!(table.cell(0, 2), "");
        assert_eq!(table.cell(1, 2), "6");
    }

    #[test]
    fn test_header_only_csv_is_empty() {
        let table = load("tally_uid,T_Vch_No,T_Credit\n");
        assert!(table.is_empty());
        assert_eq!(table.headers().len(), 3);
    }

    #[test]
    fn test_column_index_reports_missing_column() {
        let table = load("tally_uid,T_Vch_No\nT_1,V1\n");
        assert_eq!(table.column_index("T_Vch_No").unwrap(), 1);

        match table.column_index("T_Credit") {
            Err(ReconError::MissingColumn { table, column }) => {
                assert_eq!(table, "ledger");
                assert_eq!(column, "T_Credit");
            }
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let table = load("a\n1\n");
        assert_eq!(table.cell(5, 0), "");
        assert_eq!(table.cell(0, 5), "");
    }

    #[test]
    fn test_with_leading_column_replaces_existing() {
        let table = load("name,uid,amount\nx,old,1\ny,old,2\n");
        let tagged = table.with_leading_column("uid", vec!["u1".into(), "u2".into()]);

        assert_eq!(tagged.headers(), ["uid", "name", "amount"]);
        assert_eq!(tagged.rows()[0], ["u1", "x", "1"]);
        assert_eq!(tagged.rows()[1], ["u2", "y", "2"]);
    }

    #[test]
    fn test_write_csv_round_trips_header_and_rows() {
        let table = load("a,b\n1,\"x, y\"\n");
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "a,b\n1,\"x, y\"\n");
    }
}
