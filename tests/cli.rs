use assert_cmd::Command;
use godown::auth::{encode_unsigned, Claims};
use predicates::prelude::*;
use std::path::Path;

// Nothing listens here; any test that reaches the network would fail loudly.
const DEAD_API: &str = "http://127.0.0.1:9/api";

fn godown(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("godown").unwrap();
    cmd.env("GODOWN_HOME", home)
        .env("GODOWN_API_URL", DEAD_API)
        .env_remove("GODOWN_LOG")
        .env_remove("GODOWN_DEBOUNCE_MS")
        .env_remove("GODOWN_TIMEOUT_SECS");
    cmd
}

fn write_token(home: &Path, exp: Option<i64>) {
    let token = encode_unsigned(&Claims {
        sub: Some("u1".to_string()),
        exp,
    })
    .unwrap();
    std::fs::write(home.join("token"), token).unwrap();
}

#[test]
fn test_help_lists_commands() {
    let temp_dir = tempfile::tempdir().unwrap();
    godown(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("location"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn test_logged_out_commands_ask_for_login() {
    let temp_dir = tempfile::tempdir().unwrap();
    for args in [vec!["whoami"], vec!["tree"], vec![], vec!["item", "rm", "i1"]] {
        godown(temp_dir.path())
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not logged in"));
    }
}

#[test]
fn test_logout_without_session() {
    let temp_dir = tempfile::tempdir().unwrap();
    godown(temp_dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn test_logout_removes_token() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_token(temp_dir.path(), None);

    godown(temp_dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));
    assert!(!temp_dir.path().join("token").exists());
}

#[test]
fn test_expired_token_is_discarded() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_token(temp_dir.path(), Some(1_000));

    godown(temp_dir.path())
        .arg("tree")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
    assert!(!temp_dir.path().join("token").exists());
}

#[test]
fn test_config_works_offline() {
    let temp_dir = tempfile::tempdir().unwrap();
    godown(temp_dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("api_url = {}", DEAD_API)))
        .stdout(predicate::str::contains("debounce_ms = 300"));
}

#[test]
fn test_api_url_flag_overrides_environment() {
    let temp_dir = tempfile::tempdir().unwrap();
    godown(temp_dir.path())
        .args(["config", "--api-url", "http://inventory.test/api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api_url = http://inventory.test/api"));
}

#[test]
fn test_config_file_is_read() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("godown.toml"), "debounce_ms = 150\n").unwrap();
    godown(temp_dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("debounce_ms = 150"));
}

#[test]
fn test_location_add_needs_a_kind() {
    let temp_dir = tempfile::tempdir().unwrap();
    godown(temp_dir.path())
        .args(["location", "add", "Main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--godown").or(predicate::str::contains("--parent")));
}

#[test]
fn test_item_fields_checked_before_any_request() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_token(temp_dir.path(), None);

    godown(temp_dir.path())
        .args([
            "item", "add", "l1", "--name", "Saw", "--quantity", "-2", "--category", "Tools",
            "--price", "5", "--brand", "Acme",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quantity must be a non-negative whole number"));
    assert!(temp_dir.path().join("token").exists());
}

#[test]
fn test_unreachable_server_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_token(temp_dir.path(), None);

    godown(temp_dir.path())
        .arg("tree")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
