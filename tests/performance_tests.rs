use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

mod common;

#[test]
fn test_long_script_streaming() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("long.csv");
    common::generate_script(&path, 20, 250).expect("Failed to generate script");

    let mut cmd = Command::new(cargo_bin!("atm-ledger"));
    cmd.arg(&path);

    // Every holder nets zero over the rounds.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,user1,GOV-1,100"))
        .stdout(predicate::str::contains("20,user20,GOV-20,100"));
}
