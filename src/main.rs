//! Three-way reconciliation CLI
//!
//! Matches pre-grouped bank/finance candidate rows against an accounting
//! ledger export, or tags a source table with deterministic row identifiers.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- match candidates.csv ledger.csv [report.csv] > matched.csv
//! cargo run -- tag ledger MDB tally.csv > tally_tagged.csv
//! cargo run -- tag statement OBL statement.csv > statement_tagged.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug`, `info` or `warn` to control logging verbosity

use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::process;
use threeway_recon::{tag_table, IdColumns, IdScheme, ReconError, Result, Table, ThreeWayMatcher};

const USAGE: &str = "Usage: threeway-recon match <candidates.csv> <ledger.csv> [report.csv]\n       \
                     threeway-recon tag <statement|ledger> <code> <input.csv>";

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("match") => {
            let (candidates_path, ledger_path) = match (args.get(2), args.get(3)) {
                (Some(c), Some(l)) => (c, l),
                _ => return Err(usage("Missing input file")),
            };
            run_match(candidates_path, ledger_path, args.get(4).map(String::as_str))
        }
        Some("tag") => {
            let (kind, code, input_path) = match (args.get(2), args.get(3), args.get(4)) {
                (Some(k), Some(c), Some(i)) => (k.as_str(), c.as_str(), i),
                _ => return Err(usage("Missing tag arguments")),
            };
            run_tag(kind, code, input_path)
        }
        Some(other) => Err(usage(&format!("Unknown command '{}'", other))),
        None => Err(usage("Missing command")),
    }
}

fn usage(message: &str) -> ReconError {
    ReconError::Usage(format!("{}\n{}", message, USAGE))
}

fn load_table(name: &str, path: &str) -> Result<Table> {
    let file = File::open(path)?;
    Table::from_csv(name, BufReader::new(file))
}

fn run_match(candidates_path: &str, ledger_path: &str, report_path: Option<&str>) -> Result<()> {
    let candidates = load_table("candidate", candidates_path)?;
    let ledger = load_table("ledger", ledger_path)?;

    let report = ThreeWayMatcher::default().run(&candidates, &ledger)?;

    if let Some(path) = report_path {
        let file = File::create(path)?;
        report.write_report(BufWriter::new(file))?;
    }

    let stdout = io::stdout();
    let handle = stdout.lock();
    report.write_output(handle)?;

    Ok(())
}

fn run_tag(kind: &str, code: &str, input_path: &str) -> Result<()> {
    let (scheme, columns) = match kind {
        "statement" => (IdScheme::statement(code), IdColumns::statement()),
        "ledger" => (IdScheme::ledger(code), IdColumns::ledger()),
        other => return Err(usage(&format!("Unknown table kind '{}'", other))),
    };

    let table = load_table(kind, input_path)?;
    let tagged = tag_table(&table, &scheme, &columns)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    tagged.write_csv(handle)?;

    Ok(())
}
