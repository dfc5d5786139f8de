use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn runs_genesis_demo_against_a_fresh_data_dir() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = assert_fs::TempDir::new()?;

    let mut cmd = Command::cargo_bin("logpass-node")?;
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd.current_dir(data_dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("block 1: genesis accepted"));

    Ok(())
}

#[test]
fn rejects_an_unknown_flag() {
    let mut cmd = Command::cargo_bin("logpass-node").unwrap();
    cmd.arg("--not-a-real-flag");
    cmd.assert().failure();
}
