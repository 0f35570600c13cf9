// Regression tests: the CLI renders diagnostics with source context and
// exits nonzero on malformed grammars.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn cli_check_reports_diagnostics_on_error() {
    let bad_file = "tests/bad_grammar.pegma";
    fs::write(bad_file, "root...\n").unwrap();

    let mut cmd = Command::cargo_bin("pegma").unwrap();
    cmd.arg("check").arg(bad_file);
    cmd.assert()
        .failure()
        .stderr(contains("no children found for name-extended rule 'root'"));

    let _ = fs::remove_file(bad_file);
}

#[test]
fn cli_format_prints_canonical_rendering() {
    let good_file = "tests/good_grammar.pegma";
    fs::write(good_file, "word:   'a'|'b'\n").unwrap();

    let mut cmd = Command::cargo_bin("pegma").unwrap();
    cmd.arg("format").arg(good_file);
    cmd.assert().success().stdout(contains("word: 'a' | 'b'"));

    let _ = fs::remove_file(good_file);
}
