//! CLI smoke tests: `build` then `query` through the compiled binary, in the style of
//! `retrocompressor`'s `tests/cli_test.rs`.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn build_then_query_reports_a_match() {
    let dir = tempfile::tempdir().unwrap();
    let text_path = dir.path().join("genome.fa");
    std::fs::write(&text_path, ">seq\nACGTACGT\n").unwrap();

    Command::cargo_bin("sbtdex")
        .unwrap()
        .arg("build")
        .arg(&text_path)
        .arg("1")
        .assert()
        .success();

    let comp_path = dir.path().join("genome.fa.comp");
    assert!(comp_path.exists());

    Command::cargo_bin("sbtdex")
        .unwrap()
        .arg("query")
        .arg(&comp_path)
        .arg("ACG")
        .assert()
        .success()
        .stdout(predicate::str::contains("match"));
}

#[test]
fn query_reports_no_match_for_an_absent_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let text_path = dir.path().join("genome.fa");
    std::fs::write(&text_path, ">seq\nACGTACGT\n").unwrap();

    Command::cargo_bin("sbtdex")
        .unwrap()
        .arg("build")
        .arg(&text_path)
        .arg("1")
        .assert()
        .success();

    let comp_path = dir.path().join("genome.fa.comp");
    Command::cargo_bin("sbtdex")
        .unwrap()
        .arg("query")
        .arg(&comp_path)
        .arg("TTTTT")
        .assert()
        .success()
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn build_rejects_an_out_of_range_block_size() {
    let dir = tempfile::tempdir().unwrap();
    let text_path = dir.path().join("genome.fa");
    std::fs::write(&text_path, ">seq\nACGTACGT\n").unwrap();

    Command::cargo_bin("sbtdex")
        .unwrap()
        .arg("build")
        .arg(&text_path)
        .arg("9")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn build_reports_io_failure_for_a_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing_path = dir.path().join("does-not-exist.fa");

    Command::cargo_bin("sbtdex")
        .unwrap()
        .arg("build")
        .arg(&missing_path)
        .arg("1")
        .assert()
        .failure()
        .code(2);
}
