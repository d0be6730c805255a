use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn bench_reports_real_time_factor() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tricut"));
    cmd.args(["bench", "--seconds", "0.05", "--iterations", "2", "--block-size", "64"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EQ bench (block=64"))
        .stdout(predicate::str::contains("rt "));
}

#[test]
fn bench_rejects_zero_block_size() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tricut"));
    cmd.args(["bench", "--block-size", "0"]).assert().failure();
}
