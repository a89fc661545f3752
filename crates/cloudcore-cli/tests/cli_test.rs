#![allow(deprecated)] // TODO: migrate Command::cargo_bin to cargo_bin_cmd!

use assert_cmd::Command;
use predicates::prelude::*;

mod common;
use common::TestConfig;

fn cloudserver() -> Command {
    let mut cmd = Command::cargo_bin("cloudserver").unwrap();
    cmd.env_remove("OS_PASSWORD").env_remove("RUST_LOG");
    cmd
}

/// Help lists the server options
#[test]
fn test_cli_help() {
    cloudserver()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Create or delete a server"))
        .stdout(predicate::str::contains("--create"))
        .stdout(predicate::str::contains("--terminate"))
        .stdout(predicate::str::contains("--auth-url"))
        .stdout(predicate::str::contains("--openrc"));
}

#[test]
fn test_missing_essential_options() {
    cloudserver()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("The following options are missing"))
        .stderr(predicate::str::contains("username"))
        .stderr(predicate::str::contains("project"))
        .stderr(predicate::str::contains("domain").not());
}

#[test]
fn test_single_missing_option() {
    cloudserver()
        .args(["--username", "jdoe"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("The following option is missing:\nproject"));
}

#[test]
fn test_missing_config_file() {
    let dir = TestConfig::new();
    let path = dir.missing("absent.yaml");

    cloudserver()
        .arg("-f")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not find configuration file"));
}

/// Command-line values win over the file; null file entries are ignored
#[test]
fn test_file_supplies_essentials() {
    let dir = TestConfig::new();
    let path = dir.write(
        "config.yaml",
        "username: jdoe\nproject: file-project\ndomain: ~\npassword: ~\n",
    );

    // all essentials present, so the tool goes on to ask for the password
    cloudserver()
        .arg("-f")
        .arg(&path)
        .write_stdin("")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Enter your Cloud password: "))
        .stderr(predicate::str::contains("missing").not());
}

#[test]
fn test_openrc_supplies_essentials() {
    let dir = TestConfig::new();
    let rc = dir.write(
        "openrc",
        "export OS_USERNAME=jdoe\nexport OS_PROJECT_NAME='rc-project'\nexport OS_PASSWORD=ignored\n",
    );

    cloudserver()
        .arg("--openrc")
        .arg(&rc)
        .write_stdin("")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Enter your Cloud password: "));
}

#[test]
fn test_unknown_provider() {
    cloudserver()
        .args([
            "--username", "jdoe", "-p", "demo", "--password", "pw", "-P", "gcp",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider"));
}

#[test]
fn test_unreachable_identity_service() {
    cloudserver()
        .args([
            "--username",
            "jdoe",
            "-p",
            "demo",
            "--password",
            "pw",
            "--timeout",
            "2",
            "-a",
            "http://127.0.0.1:9/v3",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cloud initialisation failed"));
}
