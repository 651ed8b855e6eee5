//! Column mappings and matching options.
//!
//! The defaults are the column names produced by the ingestion steps that
//! feed the engine.

use crate::amount::Amount;

/// Columns of the candidate table (pre-grouped bank and finance rows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateColumns {
    pub group_key: String,
    pub source: String,
    pub finance_voucher: String,
    pub finance_credit: String,
    pub bank_withdrawal: String,
}

impl Default for CandidateColumns {
    fn default() -> Self {
        CandidateColumns {
            group_key: "bf_match_id".to_string(),
            source: "bf_source".to_string(),
            finance_voucher: "F_Voucher_No".to_string(),
            finance_credit: "F_Credit_Amount".to_string(),
            bank_withdrawal: "B_Withdrawal".to_string(),
        }
    }
}

/// Columns of the ledger pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerColumns {
    pub id: String,
    pub voucher: String,
    pub credit: String,
}

impl Default for LedgerColumns {
    fn default() -> Self {
        LedgerColumns {
            id: "tally_uid".to_string(),
            voucher: "T_Vch_No".to_string(),
            credit: "T_Credit".to_string(),
        }
    }
}

/// Columns read and written when tagging a table with identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdColumns {
    pub date: String,
    pub amount: String,
    /// Used when the `amount` cell is blank. Ignored if the table lacks it.
    pub fallback_amount: Option<String>,
    /// Name of the generated identifier column.
    pub id: String,
}

impl IdColumns {
    pub fn statement() -> Self {
        IdColumns {
            date: "B_Date".to_string(),
            amount: "B_Balance".to_string(),
            fallback_amount: None,
            id: "bank_uid".to_string(),
        }
    }

    pub fn ledger() -> Self {
        IdColumns {
            date: "T_Date".to_string(),
            amount: "T_Credit".to_string(),
            fallback_amount: Some("T_Debit".to_string()),
            id: LedgerColumns::default().id,
        }
    }
}

/// How a group that claims the same ledger row twice is validated.
///
/// The voucher search itself never excludes a row it already picked for an
/// earlier finance row of the same group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateLedgerPolicy {
    /// Fail the group. Keeps every ledger row in at most one output row.
    #[default]
    Reject,
    /// Accept the group if count and sums still reconcile; logs a warning.
    Allow,
}

/// Options for one matching run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOptions {
    /// Prefix of minted match identifiers, followed by a 4-digit counter.
    pub match_id_prefix: String,
    /// Tolerance for comparing group sums against the bank amount.
    pub epsilon: Amount,
    pub duplicate_ledger: DuplicateLedgerPolicy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            match_id_prefix: "BFTM_".to_string(),
            epsilon: Amount::EPSILON,
            duplicate_ledger: DuplicateLedgerPolicy::default(),
        }
    }
}

impl MatchOptions {
    /// Formats the `sequence`th match identifier (1-based).
    pub fn match_id(&self, sequence: usize) -> String {
        format!("{}{:04}", self.match_id_prefix, sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_is_zero_padded() {
        let options = MatchOptions::default();
        assert_eq!(options.match_id(1), "BFTM_0001");
        assert_eq!(options.match_id(12345), "BFTM_12345");
    }

    #[test]
    fn test_ledger_id_columns_share_ledger_id_name() {
        assert_eq!(IdColumns::ledger().id, LedgerColumns::default().id);
    }
}
