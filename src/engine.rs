//! Three-way matching engine.
//!
//! Reconciles pre-grouped bank and finance rows against a shared pool of
//! accounting-ledger rows. Groups are processed in ascending lexicographic
//! order of their group key. That order is a precondition of reproducible
//! output: when two groups could claim the same ledger row, the lower key
//! wins, and the winner's ledger rows are invisible to every later group.

use crate::amount::Amount;
use crate::config::{CandidateColumns, DuplicateLedgerPolicy, LedgerColumns, MatchOptions};
use crate::error::{ReconError, Result};
use crate::model::{
    voucher_digits, GroupOutcome, GroupReport, MatchSource, MatchType, MatchedRow, SourceTag,
};
use crate::table::Table;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;

/// Output columns appended to every matched row.
pub const METADATA_COLUMNS: [&str; 3] = ["match_id", "match_type", "match_source"];

/// Ledger identifiers claimed by successful matches.
///
/// Owned by a single run. To run the engine several times over one ledger
/// pool, run serially and pass the same set to
/// [`ThreeWayMatcher::run_with_reservations`].
#[derive(Debug, Clone, Default)]
pub struct ReservationSet {
    ids: HashSet<String>,
}

impl ReservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Claims `id`. Returns `false` if it was already claimed.
    pub fn reserve(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolved candidate column positions.
struct CandidateLayout {
    group_key: usize,
    source: usize,
    finance_voucher: usize,
    finance_credit: usize,
    bank_withdrawal: usize,
}

impl CandidateLayout {
    fn resolve(table: &Table, columns: &CandidateColumns) -> Result<Self> {
        Ok(CandidateLayout {
            group_key: table.column_index(&columns.group_key)?,
            source: table.column_index(&columns.source)?,
            finance_voucher: table.column_index(&columns.finance_voucher)?,
            finance_credit: table.column_index(&columns.finance_credit)?,
            bank_withdrawal: table.column_index(&columns.bank_withdrawal)?,
        })
    }
}

/// A ledger row prepared for voucher/amount lookup.
#[derive(Debug)]
struct LedgerEntry {
    row: usize,
    id: String,
    voucher: String,
    credit: Option<Amount>,
}

/// Bank and finance rows sharing one group key, in table order.
#[derive(Debug, Default)]
struct CandidateGroup {
    bank: Vec<usize>,
    finance: Vec<usize>,
}

/// Result of a [`ThreeWayMatcher`] run.
#[derive(Debug, Clone)]
pub struct MatchReport {
    candidate_headers: Vec<String>,
    ledger_headers: Vec<String>,
    rows: Vec<MatchedRow>,
    groups: Vec<GroupReport>,
}

impl MatchReport {
    /// Output rows in emission order: per match, bank, then finance, then ledger.
    pub fn rows(&self) -> &[MatchedRow] {
        &self.rows
    }

    /// One entry per processed group, in processing order.
    pub fn groups(&self) -> &[GroupReport] {
        &self.groups
    }

    pub fn match_count(&self) -> usize {
        self.groups.iter().filter(|g| g.outcome.is_matched()).count()
    }

    /// Candidate columns, then ledger columns not already present, then
    /// [`METADATA_COLUMNS`].
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = Vec::new();
        for header in self.candidate_headers.iter().chain(&self.ledger_headers) {
            if !METADATA_COLUMNS.contains(&header.as_str()) && !headers.contains(header) {
                headers.push(header.clone());
            }
        }
        headers.extend(METADATA_COLUMNS.iter().map(|c| c.to_string()));
        headers
    }

    /// Builds the output table. Cells absent from a row's source are empty.
    pub fn to_table(&self) -> Table {
        let headers = self.output_headers();
        let inherited = headers.len() - METADATA_COLUMNS.len();

        let position = |source: &[String]| -> Vec<Option<usize>> {
            headers[..inherited]
                .iter()
                .map(|h| source.iter().position(|s| s == h))
                .collect()
        };
        let candidate_map = position(&self.candidate_headers);
        let ledger_map = position(&self.ledger_headers);

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let map = match row.source {
                    MatchSource::Bank | MatchSource::Finance => &candidate_map,
                    MatchSource::Tally => &ledger_map,
                };
                let mut out: Vec<String> = map
                    .iter()
                    .map(|idx| {
                        idx.and_then(|i| row.values.get(i))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect();
                out.push(row.match_id.clone());
                out.push(row.match_type.to_string());
                out.push(row.source.to_string());
                out
            })
            .collect();

        Table::new("output", headers, rows)
    }

    /// Writes the matched rows as CSV.
    pub fn write_output<W: Write>(&self, writer: W) -> Result<()> {
        self.to_table().write_csv(writer)
    }

    /// Writes the per-group outcome report as CSV.
    pub fn write_report<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for group in &self.groups {
            csv_writer.serialize(group.to_record())?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// The three-way bank/finance/ledger matcher.
///
/// Stateless between runs; all per-run state lives in the
/// [`ReservationSet`] threaded through [`Self::run_with_reservations`].
#[derive(Debug, Clone, Default)]
pub struct ThreeWayMatcher {
    candidate_columns: CandidateColumns,
    ledger_columns: LedgerColumns,
    options: MatchOptions,
}

impl ThreeWayMatcher {
    pub fn new(
        candidate_columns: CandidateColumns,
        ledger_columns: LedgerColumns,
        options: MatchOptions,
    ) -> Self {
        ThreeWayMatcher {
            candidate_columns,
            ledger_columns,
            options,
        }
    }

    /// Runs one reconciliation pass with a fresh reservation set.
    ///
    /// # Errors
    ///
    /// Fails before any group is processed if a required column is missing,
    /// a source tag is not `bank`/`finance`, or a ledger identifier repeats.
    /// Groups that do not reconcile are reported, not raised.
    pub fn run(&self, candidates: &Table, ledger: &Table) -> Result<MatchReport> {
        let mut reservations = ReservationSet::new();
        self.run_with_reservations(candidates, ledger, &mut reservations)
    }

    /// Runs one pass, skipping ledger rows already in `reservations` and
    /// adding every row this pass claims.
    ///
    /// Match identifiers restart at 1 for each pass.
    pub fn run_with_reservations(
        &self,
        candidates: &Table,
        ledger: &Table,
        reservations: &mut ReservationSet,
    ) -> Result<MatchReport> {
        let layout = CandidateLayout::resolve(candidates, &self.candidate_columns)?;
        let pool = self.load_ledger_pool(ledger)?;
        let groups = group_candidates(candidates, &layout)?;

        let mut rows = Vec::new();
        let mut reports = Vec::with_capacity(groups.len());
        let mut next_match = 1;

        for (key, group) in &groups {
            let attempt =
                self.match_group(key, group, candidates, &layout, &pool, reservations);
            let outcome = match attempt {
                Ok(picked) => {
                    let match_id = self.options.match_id(next_match);
                    next_match += 1;

                    let match_type = MatchType {
                        finance: group.finance.len(),
                        ledger: picked.len(),
                    };

                    for &entry in &picked {
                        reservations.reserve(&pool[entry].id);
                    }

                    let tag = |source: MatchSource, values: &[String]| MatchedRow {
                        match_id: match_id.clone(),
                        match_type,
                        source,
                        values: values.to_vec(),
                    };
                    rows.push(tag(MatchSource::Bank, &candidates.rows()[group.bank[0]]));
                    for &row in &group.finance {
                        rows.push(tag(MatchSource::Finance, &candidates.rows()[row]));
                    }
                    for &entry in &picked {
                        rows.push(tag(MatchSource::Tally, &ledger.rows()[pool[entry].row]));
                    }

                    GroupOutcome::Matched {
                        match_id,
                        match_type,
                    }
                }
                Err(outcome) => outcome,
            };

            debug!("Group {}: {}", key, outcome);
            reports.push(GroupReport {
                group_key: key.to_string(),
                outcome,
            });
        }

        info!(
            "Matched {} of {} candidate groups, {} ledger rows reserved",
            next_match - 1,
            reports.len(),
            reservations.len()
        );

        Ok(MatchReport {
            candidate_headers: candidates.headers().to_vec(),
            ledger_headers: ledger.headers().to_vec(),
            rows,
            groups: reports,
        })
    }

    /// Validates ledger columns and prepares lookup entries in pool order.
    ///
    /// Rows with a blank identifier cannot be reserved and are left out.
    fn load_ledger_pool(&self, ledger: &Table) -> Result<Vec<LedgerEntry>> {
        let id_idx = ledger.column_index(&self.ledger_columns.id)?;
        let voucher_idx = ledger.column_index(&self.ledger_columns.voucher)?;
        let credit_idx = ledger.column_index(&self.ledger_columns.credit)?;

        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut pool = Vec::with_capacity(ledger.len());

        for row in 0..ledger.len() {
            let id = ledger.cell(row, id_idx);
            if id.is_empty() {
                warn!("Ledger row {}: Blank identifier, excluded from matching", row + 1);
                continue;
            }
            if seen.insert(id, row).is_some() {
                return Err(ReconError::DuplicateLedgerId {
                    id: id.to_string(),
                    row: row + 1,
                });
            }

            let credit_cell = ledger.cell(row, credit_idx);
            let credit = Amount::parse(credit_cell);
            if credit.is_none() && !credit_cell.is_empty() {
                warn!(
                    "Ledger row {}: Non-numeric credit '{}', row can never match",
                    row + 1,
                    credit_cell
                );
            }

            pool.push(LedgerEntry {
                row,
                id: id.to_string(),
                voucher: voucher_digits(ledger.cell(row, voucher_idx)),
                credit,
            });
        }

        Ok(pool)
    }

    /// Attempts one group against the unreserved part of the pool.
    ///
    /// Returns the picked pool positions, one per finance row, on success.
    /// Never touches `reservations`; the caller commits a successful pick.
    fn match_group(
        &self,
        key: &str,
        group: &CandidateGroup,
        candidates: &Table,
        layout: &CandidateLayout,
        pool: &[LedgerEntry],
        reservations: &ReservationSet,
    ) -> std::result::Result<Vec<usize>, GroupOutcome> {
        if group.bank.len() != 1 || group.finance.is_empty() {
            return Err(GroupOutcome::Ineligible {
                bank: group.bank.len(),
                finance: group.finance.len(),
            });
        }

        let bank_amount = parse_group_amount(
            candidates,
            group.bank[0],
            layout.bank_withdrawal,
            &self.candidate_columns.bank_withdrawal,
        )?;

        let finance = group
            .finance
            .iter()
            .map(|&row| -> std::result::Result<(String, Amount), GroupOutcome> {
                let amount = parse_group_amount(
                    candidates,
                    row,
                    layout.finance_credit,
                    &self.candidate_columns.finance_credit,
                )?;
                Ok((voucher_digits(candidates.cell(row, layout.finance_voucher)), amount))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Greedy: first unreserved row in pool order; one miss ends the search.
        let mut picked = Vec::with_capacity(finance.len());
        for (voucher, amount) in &finance {
            let hit = pool.iter().position(|entry| {
                !reservations.contains(&entry.id)
                    && entry.voucher == *voucher
                    && entry.credit == Some(*amount)
            });
            match hit {
                Some(idx) => picked.push(idx),
                None => {
                    debug!(
                        "Group {}: No ledger row for voucher '{}' amount {}",
                        key, voucher, amount
                    );
                    break;
                }
            }
        }

        if picked.len() != finance.len() {
            return Err(GroupOutcome::CountMismatch {
                finance: finance.len(),
                ledger: picked.len(),
            });
        }

        let finance_sum = Amount::checked_sum(finance.iter().map(|(_, amount)| *amount))
            .ok_or_else(|| GroupOutcome::SumOverflow {
                column: self.candidate_columns.finance_credit.clone(),
            })?;
        if !finance_sum.within(bank_amount, self.options.epsilon) {
            return Err(GroupOutcome::FinanceSumMismatch {
                expected: bank_amount,
                actual: finance_sum,
            });
        }

        let ledger_sum = Amount::checked_sum(
            picked
                .iter()
                .map(|&idx| pool[idx].credit.unwrap_or(Amount::ZERO)),
        )
        .ok_or_else(|| GroupOutcome::SumOverflow {
            column: self.ledger_columns.credit.clone(),
        })?;
        if !ledger_sum.within(bank_amount, self.options.epsilon) {
            return Err(GroupOutcome::LedgerSumMismatch {
                expected: bank_amount,
                actual: ledger_sum,
            });
        }

        let mut distinct = HashSet::with_capacity(picked.len());
        if let Some(&dup) = picked.iter().find(|&&idx| !distinct.insert(idx)) {
            let ledger_id = pool[dup].id.clone();
            match self.options.duplicate_ledger {
                DuplicateLedgerPolicy::Reject => {
                    return Err(GroupOutcome::DuplicateLedgerRow { ledger_id });
                }
                DuplicateLedgerPolicy::Allow => {
                    warn!(
                        "Group {}: Ledger row {} matched to more than one finance row",
                        key, ledger_id
                    );
                }
            }
        }

        Ok(picked)
    }
}

/// Partitions candidate rows by group key, ordered by key.
///
/// Rows with a blank group key belong to no group.
fn group_candidates<'t>(
    candidates: &'t Table,
    layout: &CandidateLayout,
) -> Result<BTreeMap<&'t str, CandidateGroup>> {
    let mut groups: BTreeMap<&str, CandidateGroup> = BTreeMap::new();

    for row in 0..candidates.len() {
        let tag_cell = candidates.cell(row, layout.source);
        let tag = SourceTag::parse(tag_cell).ok_or_else(|| ReconError::InvalidSourceTag {
            row: row + 1,
            value: tag_cell.to_string(),
        })?;

        let key = candidates.cell(row, layout.group_key);
        if key.is_empty() {
            debug!("Candidate row {}: Blank group key, skipped", row + 1);
            continue;
        }

        let group = groups.entry(key).or_default();
        match tag {
            SourceTag::Bank => group.bank.push(row),
            SourceTag::Finance => group.finance.push(row),
        }
    }

    Ok(groups)
}

fn parse_group_amount(
    candidates: &Table,
    row: usize,
    col: usize,
    column: &str,
) -> std::result::Result<Amount, GroupOutcome> {
    let cell = candidates.cell(row, col);
    Amount::parse(cell).ok_or_else(|| {
        warn!("Candidate row {}: Non-numeric {} '{}'", row + 1, column, cell);
        GroupOutcome::InvalidAmount {
            column: column.to_string(),
            value: cell.to_string(),
        }
    })
}
