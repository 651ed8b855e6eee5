//! Integration tests for the threeway-recon CLI.
//!
//! These tests run the actual binary and verify output against expected CSV files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Run the binary with the given arguments and return stdout
fn run_cli(args: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("threeway-recon").unwrap();
    let assert = cmd.args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Trimmed, non-empty lines. Row order is part of the contract, so no sorting.
fn csv_lines(csv: &str) -> Vec<String> {
    csv.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[test]
fn test_match_against_expected_output() {
    let output = run_cli(&[
        "match",
        &test_data_path("candidates.csv"),
        &test_data_path("ledger.csv"),
    ]);
    let expected = fs::read_to_string(test_data_path("expected_matched.csv")).unwrap();

    assert_eq!(csv_lines(&output), csv_lines(&expected));
}

#[test]
fn test_match_is_deterministic_across_runs() {
    let candidates = test_data_path("candidates.csv");
    let ledger = test_data_path("ledger.csv");
    let first = run_cli(&["match", &candidates, &ledger]);
    let second = run_cli(&["match", &candidates, &ledger]);

    assert_eq!(first, second);
}

#[test]
fn test_match_writes_group_report() {
    let dir = tempdir().unwrap();
    let report_path = dir.path().join("report.csv");
    let report_str = report_path.to_str().unwrap();

    run_cli(&[
        "match",
        &test_data_path("candidates.csv"),
        &test_data_path("ledger.csv"),
        report_str,
    ]);

    let report = fs::read_to_string(&report_path).unwrap();
    let lines = csv_lines(&report);
    assert_eq!(lines[0], "group_key,outcome,match_id,detail");
    assert!(lines[1].starts_with("BF_0001,matched,BFTM_0001,"));
    assert!(lines[2].starts_with("BF_0002,matched,BFTM_0002,"));
    assert!(lines[3].starts_with("BF_0003,count_mismatch,,"));
    assert!(lines[4].starts_with("BF_0004,ineligible,,"));
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_missing_column_error_names_table_and_column() {
    let mut cmd = Command::cargo_bin("threeway-recon").unwrap();
    cmd.arg("match")
        .arg(test_data_path("candidates_missing_column.csv"))
        .arg(test_data_path("ledger.csv"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "Missing column 'B_Withdrawal' in candidate table",
        ));
}

#[test]
fn test_tag_ledger_against_expected_output() {
    let output = run_cli(&["tag", "ledger", "MDB", &test_data_path("tally_raw.csv")]);
    let expected = fs::read_to_string(test_data_path("expected_tally_tagged.csv")).unwrap();

    assert_eq!(csv_lines(&output), csv_lines(&expected));
}

#[test]
fn test_tag_statement_against_expected_output() {
    let output = run_cli(&["tag", "statement", "OBL", &test_data_path("statement_raw.csv")]);
    let expected = fs::read_to_string(test_data_path("expected_statement_tagged.csv")).unwrap();

    assert_eq!(csv_lines(&output), csv_lines(&expected));
}

#[test]
fn test_tagged_ledger_feeds_matcher() {
    let dir = tempdir().unwrap();
    let tagged_path = dir.path().join("tally_tagged.csv");
    let tagged = run_cli(&["tag", "ledger", "MDB", &test_data_path("tally_raw.csv")]);
    fs::write(&tagged_path, tagged).unwrap();

    let output = run_cli(&[
        "match",
        &test_data_path("candidates.csv"),
        tagged_path.to_str().unwrap(),
    ]);

    assert!(output.contains("T_MDB_134d6e6_1f4_000001"));
    assert!(output.contains("BFTM_0002,1 to 2 to 2,Tally"));
}

#[test]
fn test_missing_file_error() {
    let mut cmd = Command::cargo_bin("threeway-recon").unwrap();
    cmd.args(["match", "nonexistent.csv", "also_missing.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("threeway-recon").unwrap();
    cmd.arg("match")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing input file"));
}

#[test]
fn test_unknown_command_error() {
    let mut cmd = Command::cargo_bin("threeway-recon").unwrap();
    cmd.arg("reconcile")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown command 'reconcile'"));
}
