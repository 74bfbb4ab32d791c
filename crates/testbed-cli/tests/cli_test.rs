use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_missing_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pay-testbed")?;
    cmd.args(["--config", "does/not/exist.json", "get"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("config file"));

    Ok(())
}

#[test]
fn test_help_lists_operations() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pay-testbed")?;
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("list-payments"))
        .stdout(predicate::str::contains("payment-details"));

    Ok(())
}

#[test]
fn test_refund_requires_payment_id() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pay-testbed")?;
    cmd.arg("create-refund");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--payment-id"));

    Ok(())
}
