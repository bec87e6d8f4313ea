use std::fs;

use assert_cmd::Command; // Bring Command into scope
use predicates::prelude::*; // Bring predicate traits into scope
use tempfile::tempdir;

#[test]
fn test_check_config_prints_summary() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("AppSettings.json"),
        r#"{ "Application": { "Title": "Checked", "Timeout": 12 } }"#,
    )?;

    let mut cmd = Command::cargo_bin("apphost")?;
    cmd.arg("--check-config").arg("--config-dir").arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Environment: Production"))
        .stdout(predicate::str::contains("Title: Checked"))
        .stdout(predicate::str::contains("Timeout: 12s"))
        .stdout(predicate::str::contains("STANDARD"))
        .stdout(predicate::str::contains("Configuration OK"));

    Ok(())
}

#[test]
fn test_trailing_overrides_win() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("AppSettings.json"),
        r#"{ "Application": { "Title": "FromFile" } }"#,
    )?;

    let mut cmd = Command::cargo_bin("apphost")?;
    cmd.arg("--check-config")
        .arg("--config-dir")
        .arg(dir.path())
        .arg("Application:Title=FromCli");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Title: FromCli"));

    Ok(())
}

#[test]
fn test_environment_file_and_api_profile() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("HostSettings.json"), r#"{ "environment": "Staging" }"#)?;
    fs::write(
        dir.path().join("AppSettings.Staging.json"),
        r#"{ "Application": { "ApiBaseUrl": "https://api.example" } }"#,
    )?;

    let mut cmd = Command::cargo_bin("apphost")?;
    cmd.arg("--check-config").arg("--config-dir").arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Environment: Staging"))
        .stdout(predicate::str::contains("API, STANDARD"));

    Ok(())
}

#[test]
fn test_malformed_settings_fail_before_session() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("AppSettings.json"), r#"{ "Application": { "#)?;

    let mut cmd = Command::cargo_bin("apphost")?;
    cmd.arg("--config-dir").arg(dir.path()).write_stdin("Ada\n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to build host"))
        .stderr(predicate::str::contains("Malformed JSON"))
        .stdout(predicate::str::contains("Session ended").not());

    Ok(())
}

#[test]
fn test_console_session_greets_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("AppSettings.json"),
        r#"{ "Application": { "Title": "Greeter", "Greeting": "Welcome" } }"#,
    )?;

    let mut cmd = Command::cargo_bin("apphost")?;
    cmd.arg("--config-dir").arg(dir.path()).write_stdin("Ada\nquit\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Greeter"))
        .stdout(predicate::str::contains("Welcome, Ada!"))
        .stdout(predicate::str::contains("Session ended"));

    Ok(())
}

#[test]
fn test_empty_stdin_ends_session() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("apphost")?;
    cmd.arg("--config-dir").arg(dir.path()).write_stdin("");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Session ended"));

    Ok(())
}

#[test]
fn test_log_output_stays_off_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("apphost")?;
    cmd.env("RUST_LOG", "info")
        .arg("--config-dir")
        .arg(dir.path())
        .write_stdin("Ada\nquit\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello, Ada!"))
        .stdout(predicate::str::contains("Building apphost").not())
        .stderr(predicate::str::contains("Building apphost"));

    Ok(())
}
