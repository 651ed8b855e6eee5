//! Deterministic row identifiers.
//!
//! Every statement and ledger row gets a key derived from its position in
//! the source file, its date and its amount. Identical inputs always produce
//! identical keys, so the keys are safe to use as join keys and as
//! reservation tokens in the matching engine.
//!
//! Distinct rows are not guaranteed distinct keys: two rows with the same
//! sequence number, date and rounded amount collide. Sequence numbers are
//! unique within one file, so collisions only arise across files that share
//! a prefix.

use crate::amount::Amount;
use crate::config::IdColumns;
use crate::error::Result;
use crate::table::Table;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::warn;

/// Hex field used when a date or amount cannot be interpreted.
pub const FALLBACK_FIELD: &str = "0";

const SEPARATOR: char = '_';

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

/// Where the sequence number sits relative to the date/amount fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    /// `prefix_seq_date_amount`
    SequenceFirst,
    /// `prefix_date_amount_seq`
    SequenceLast,
}

/// A namespace prefix plus field layout for generated identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdScheme {
    prefix: String,
    sequence_width: usize,
    order: FieldOrder,
}

impl IdScheme {
    pub fn new(prefix: impl Into<String>, sequence_width: usize, order: FieldOrder) -> Self {
        IdScheme {
            prefix: prefix.into(),
            sequence_width,
            order,
        }
    }

    /// Bank statement rows: `<code>_<seq:03>_<date>_<amount>`.
    pub fn statement(bank_code: &str) -> Self {
        IdScheme::new(bank_code, 3, FieldOrder::SequenceFirst)
    }

    /// Accounting ledger rows: `T_<code>_<date>_<amount>_<seq:06>`.
    pub fn ledger(bank_code: &str) -> Self {
        IdScheme::new(format!("T{SEPARATOR}{bank_code}"), 6, FieldOrder::SequenceLast)
    }

    /// Builds the identifier for one row.
    ///
    /// `sequence` is the 1-based row number within the source file. Dates
    /// and amounts that cannot be parsed degrade to [`FALLBACK_FIELD`];
    /// this never fails.
    pub fn generate_id(&self, sequence: usize, date: &str, amount: &str) -> String {
        let seq = format!("{:0width$}", sequence, width = self.sequence_width);
        let date_hex = hex_date(date);
        let amount_hex = hex_amount(amount);

        let fields = match self.order {
            FieldOrder::SequenceFirst => [
                self.prefix.as_str(),
                seq.as_str(),
                date_hex.as_str(),
                amount_hex.as_str(),
            ],
            FieldOrder::SequenceLast => [
                self.prefix.as_str(),
                date_hex.as_str(),
                amount_hex.as_str(),
                seq.as_str(),
            ],
        };
        fields.join(&SEPARATOR.to_string())
    }
}

/// Parses the date formats the ingestion collaborators emit.
///
/// Slash and dot separated dates are read day-first.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value[0..4].parse().ok()?;
        let month = value[4..6].parse().ok()?;
        let day = value[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Hex of the date read as the integer `YYYYMMDD`.
pub fn hex_date(value: &str) -> String {
    match parse_date(value) {
        Some(date) => {
            let ymd = date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64;
            format!("{:x}", ymd)
        }
        None => FALLBACK_FIELD.to_string(),
    }
}

/// Hex of the amount rounded to whole units. Negative amounts keep a sign.
// Negatives are `-<hex>`, deliberately departing from the older `x<hex>` identifier encoding.
pub fn hex_amount(value: &str) -> String {
    match Amount::parse(value).and_then(|a| a.round_to_units()) {
        Some(units) if units < 0 => format!("-{:x}", units.unsigned_abs()),
        Some(units) => format!("{:x}", units),
        None => FALLBACK_FIELD.to_string(),
    }
}

/// Returns `table` with a generated identifier column inserted first.
///
/// The amount comes from `columns.amount`, or from `columns.fallback_amount`
/// when that cell is blank.
///
/// # Errors
///
/// [`ReconError::MissingColumn`](crate::ReconError::MissingColumn) if the
/// date or amount column is absent.
pub fn tag_table(table: &Table, scheme: &IdScheme, columns: &IdColumns) -> Result<Table> {
    let date_idx = table.column_index(&columns.date)?;
    let amount_idx = table.column_index(&columns.amount)?;
    let fallback_idx = columns
        .fallback_amount
        .as_deref()
        .and_then(|c| table.find_column(c));

    let ids = (0..table.len())
        .map(|row| {
            let date = table.cell(row, date_idx);
            let mut amount = table.cell(row, amount_idx);
            if amount.trim().is_empty() {
                if let Some(idx) = fallback_idx {
                    amount = table.cell(row, idx);
                }
            }

            let sequence = row + 1;
            if parse_date(date).is_none() {
                warn!("Row {}: Unparseable date '{}' in identifier", sequence, date);
            }
            if Amount::parse(amount).is_none() {
                warn!("Row {}: Unparseable amount '{}' in identifier", sequence, amount);
            }

            scheme.generate_id(sequence, date, amount)
        })
        .collect();

    Ok(table.with_leading_column(&columns.id, ids))
}
