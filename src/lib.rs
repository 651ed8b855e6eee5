//! # Three-Way Reconciliation
//!
//! Matches bank statement rows, finance/ERP entries and accounting-ledger
//! rows that record the same underlying transaction.
//!
//! ## Design Principles
//!
//! - **Decimal arithmetic**: Amounts are `rust_decimal` values; ledger credits
//!   must equal finance credits exactly, group sums are compared within 0.0001
//! - **Global exclusivity**: A ledger row is claimed by at most one match
//! - **Deterministic output**: Groups run in ascending group-key order and
//!   match identifiers are minted sequentially
//! - **Fail fast on bad input**: Missing columns abort before any matching
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Cursor;
//! use threeway_recon::{Table, ThreeWayMatcher};
//!
//! let candidates = "bf_match_id,bf_source,B_Withdrawal,F_Voucher_No,F_Credit_Amount\n\
//!                   G1,bank,500.00,,\n\
//!                   G1,finance,,FIN-0012,500.00\n";
//! let ledger = "tally_uid,T_Vch_No,T_Credit\nT_1,TXN0012,500.00\n";
//!
//! let candidates = Table::from_csv("candidate", Cursor::new(candidates)).unwrap();
//! let ledger = Table::from_csv("ledger", Cursor::new(ledger)).unwrap();
//!
//! let report = ThreeWayMatcher::default().run(&candidates, &ledger).unwrap();
//! report.write_output(std::io::stdout()).unwrap();
//! ```

pub mod amount;
pub mod config;
pub mod engine;
pub mod error;
pub mod identifier;
pub mod model;
pub mod table;

pub use amount::Amount;
pub use config::{CandidateColumns, DuplicateLedgerPolicy, IdColumns, LedgerColumns, MatchOptions};
pub use engine::{MatchReport, ReservationSet, ThreeWayMatcher};
pub use error::{ReconError, Result};
pub use identifier::{tag_table, IdScheme};
pub use model::{GroupOutcome, GroupReport, MatchSource, MatchType, MatchedRow, SourceTag};
pub use table::Table;
