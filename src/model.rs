//! Row tags, match descriptors and per-group outcomes.

use crate::amount::Amount;
use serde::Serialize;
use std::fmt;

/// Source tag of a candidate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTag {
    Bank,
    Finance,
}

impl SourceTag {
    /// Parses `bank` / `finance`, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "bank" => Some(SourceTag::Bank),
            "finance" => Some(SourceTag::Finance),
            _ => None,
        }
    }
}

/// Source label written to the `match_source` output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchSource {
    Bank,
    Finance,
    Tally,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchSource::Bank => "Bank",
            MatchSource::Finance => "Finance",
            MatchSource::Tally => "Tally",
        };
        f.write_str(label)
    }
}

/// Cardinality of a match: one bank row to `finance` rows to `ledger` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchType {
    pub finance: usize,
    pub ledger: usize,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1 to {} to {}", self.finance, self.ledger)
    }
}

/// One output row: a copy of a source row plus match metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRow {
    pub match_id: String,
    pub match_type: MatchType,
    pub source: MatchSource,
    /// Cells of the originating row, in that table's column order.
    pub values: Vec<String>,
}

/// Why a candidate group did or did not produce a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Reconciled; rows emitted under `match_id`.
    Matched {
        match_id: String,
        match_type: MatchType,
    },
    /// Not exactly one bank row and at least one finance row.
    Ineligible { bank: usize, finance: usize },
    /// A bank withdrawal or finance credit cell is not a number.
    InvalidAmount { column: String, value: String },
    /// The voucher search found fewer ledger rows than finance rows.
    CountMismatch { finance: usize, ledger: usize },
    /// Finance credits do not add up to the bank amount.
    FinanceSumMismatch { expected: Amount, actual: Amount },
    /// Matched ledger credits do not add up to the bank amount.
    LedgerSumMismatch { expected: Amount, actual: Amount },
    /// Summing the values of `column` exceeds the decimal range.
    SumOverflow { column: String },
    /// The same ledger row was picked for two finance rows.
    DuplicateLedgerRow { ledger_id: String },
}

impl GroupOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, GroupOutcome::Matched { .. })
    }

    /// Short machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            GroupOutcome::Matched { .. } => "matched",
            GroupOutcome::Ineligible { .. } => "ineligible",
            GroupOutcome::InvalidAmount { .. } => "invalid_amount",
            GroupOutcome::CountMismatch { .. } => "count_mismatch",
            GroupOutcome::FinanceSumMismatch { .. } => "finance_sum_mismatch",
            GroupOutcome::LedgerSumMismatch { .. } => "ledger_sum_mismatch",
            GroupOutcome::SumOverflow { .. } => "sum_overflow",
            GroupOutcome::DuplicateLedgerRow { .. } => "duplicate_ledger_row",
        }
    }
}

impl fmt::Display for GroupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupOutcome::Matched {
                match_id,
                match_type,
            } => write!(f, "matched as {} ({})", match_id, match_type),
            GroupOutcome::Ineligible { bank, finance } => write!(
                f,
                "needs exactly 1 bank row and at least 1 finance row, found {} bank and {} finance",
                bank, finance
            ),
            GroupOutcome::InvalidAmount { column, value } => {
                write!(f, "non-numeric value '{}' in {}", value, column)
            }
            GroupOutcome::CountMismatch { finance, ledger } => write!(
                f,
                "{} finance rows but only {} ledger rows found",
                finance, ledger
            ),
            GroupOutcome::FinanceSumMismatch { expected, actual } => write!(
                f,
                "finance credits sum to {}, bank amount is {}",
                actual, expected
            ),
            GroupOutcome::LedgerSumMismatch { expected, actual } => write!(
                f,
                "ledger credits sum to {}, bank amount is {}",
                actual, expected
            ),
            GroupOutcome::SumOverflow { column } => {
                write!(f, "sum of {} is out of range", column)
            }
            GroupOutcome::DuplicateLedgerRow { ledger_id } => {
                write!(f, "ledger row {} claimed twice", ledger_id)
            }
        }
    }
}

/// Outcome of one candidate group, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub group_key: String,
    pub outcome: GroupOutcome,
}

/// Flat CSV record for a [`GroupReport`].
#[derive(Debug, Serialize)]
pub struct GroupReportRecord<'a> {
    pub group_key: &'a str,
    pub outcome: &'static str,
    pub match_id: Option<&'a str>,
    pub detail: String,
}

impl GroupReport {
    pub fn to_record(&self) -> GroupReportRecord<'_> {
        let match_id = match &self.outcome {
            GroupOutcome::Matched { match_id, .. } => Some(match_id.as_str()),
            _ => None,
        };
        GroupReportRecord {
            group_key: &self.group_key,
            outcome: self.outcome.label(),
            match_id,
            detail: self.outcome.to_string(),
        }
    }
}

/// Digits of a voucher number, concatenated in order.
///
/// `"FIN-0012"` and `"TXN0012"` both yield `"0012"`. Returns an empty string
/// when the voucher has no digits.
pub fn voucher_digits(voucher: &str) -> String {
    voucher.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_source_tag_is_case_insensitive() {
        assert_eq!(SourceTag::parse("bank"), Some(SourceTag::Bank));
        assert_eq!(SourceTag::parse("BANK"), Some(SourceTag::Bank));
        assert_eq!(SourceTag::parse("Finance"), Some(SourceTag::Finance));
        assert_eq!(SourceTag::parse("tally"), None);
        assert_eq!(SourceTag::parse(""), None);
    }

    #[test]
    fn test_match_type_display() {
        let mt = MatchType {
            finance: 2,
            ledger: 2,
        };
        assert_eq!(mt.to_string(), "1 to 2 to 2");
    }

    #[test]
    fn test_match_source_labels() {
        assert_eq!(MatchSource::Bank.to_string(), "Bank");
        assert_eq!(MatchSource::Finance.to_string(), "Finance");
        assert_eq!(MatchSource::Tally.to_string(), "Tally");
    }

    #[test]
    fn test_voucher_digits() {
        assert_eq!(voucher_digits("FIN-0012"), "0012");
        assert_eq!(voucher_digits("TXN0012"), "0012");
        assert_eq!(voucher_digits("JV/24/007"), "24007");
        assert_eq!(voucher_digits("Cash"), "");
    }

    #[test]
    fn test_report_record_for_mismatch() {
        let report = GroupReport {
            group_key: "G7".to_string(),
            outcome: GroupOutcome::FinanceSumMismatch {
                expected: Amount::from_str("500").unwrap(),
                actual: Amount::from_str("450").unwrap(),
            },
        };
        let record = report.to_record();

        assert_eq!(record.outcome, "finance_sum_mismatch");
        assert!(record.match_id.is_none());
        assert_eq!(record.detail, "finance credits sum to 450, bank amount is 500");
    }
}
