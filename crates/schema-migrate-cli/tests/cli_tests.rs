//! CLI integration tests for schema-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes, and end-to-end runs against a temporary SQLite database.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

/// Get a command for the schema-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("schema-migrate").unwrap()
}

fn write_file(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn sqlite_config(dir: &Path, allow_clean_db: bool) -> String {
    let db = dir.join("app.db");
    write_file(
        dir,
        "config.yaml",
        &format!(
            "database:\n  type: sqlite3\n  database: \"{}\"\nmigrator:\n  allow_clean_db: {}\n",
            db.display(),
            allow_clean_db
        ),
    )
}

const MIGRATIONS: &str = r#"
migrations:
  - id: create user table
    step:
      type: add_table
      name: user
      columns:
        - { name: id, column_type: big_int, is_primary_key: true, is_auto_increment: true }
        - { name: login, column_type: varchar, length: 190 }
  - id: add unique index user.login
    step:
      type: add_index
      table: user
      index: { cols: [login], kind: unique }
"#;

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("health-check"))
        .stdout(predicate::str::contains("clean-db"))
        .stdout(predicate::str::contains("dialects"));
}

#[test]
fn test_apply_subcommand_help() {
    cmd()
        .args(["apply", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--file"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("schema-migrate"));
}

#[test]
fn test_global_flags_and_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"))
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_unknown_dialect_exits_with_code_1() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "database:").unwrap();
    writeln!(file, "  type: oracle").unwrap();
    writeln!(file, "  database: orcl").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unsupported dialect: oracle"));
}

#[test]
fn test_missing_host_exits_with_code_1() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "database:").unwrap();
    writeln!(file, "  type: postgres").unwrap();
    writeln!(file, "  database: app").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "status"])
        .assert()
        .code(1);
}

// =============================================================================
// Dialects
// =============================================================================

#[test]
fn test_dialects_needs_no_config() {
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "dialects"])
        .assert()
        .success()
        .stdout(predicate::str::contains("postgres"))
        .stdout(predicate::str::contains("mariadb"))
        .stdout(predicate::str::contains("sqlite3"))
        .stdout(predicate::str::contains("sql_server"));
}

#[test]
fn test_dialects_json() {
    cmd()
        .args(["--output-json", "dialects"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"aliases\""));
}

// =============================================================================
// Clean DB Guards
// =============================================================================

#[test]
fn test_clean_db_requires_opt_in() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(dir.path(), false);

    cmd()
        .args(["--config", &config, "clean-db", "--force"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("allow_clean_db"));
}

#[test]
fn test_clean_db_requires_force() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(dir.path(), true);

    cmd()
        .args(["--config", &config, "clean-db"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));
}

// =============================================================================
// SQLite End-to-End
// =============================================================================

#[test]
fn test_dry_run_renders_without_connecting() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(dir.path(), false);
    let file = write_file(dir.path(), "migrations.yaml", MIGRATIONS);

    cmd()
        .args(["--config", &config, "apply", "--file", &file, "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE TABLE IF NOT EXISTS `user`"))
        .stdout(predicate::str::contains(
            "CREATE UNIQUE INDEX `UQE_user_login` ON `user` (`login`);",
        ));

    assert!(!dir.path().join("app.db").exists());
}

#[test]
fn test_apply_then_status() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(dir.path(), true);
    let file = write_file(dir.path(), "migrations.yaml", MIGRATIONS);

    cmd()
        .args(["--config", &config, "apply", "--file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied: 2"));

    cmd()
        .args(["--config", &config, "apply", "--file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already applied: 2"));

    cmd()
        .args(["--config", &config, "--output-json", "status", "--file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"create user table\""))
        .stdout(predicate::str::contains("\"pending\": []"));

    cmd()
        .args(["--config", &config, "clean-db", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Database cleaned"));
}

#[test]
fn test_failed_step_exits_with_code_3() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(dir.path(), false);
    let file = write_file(
        dir.path(),
        "migrations.yaml",
        "migrations:\n  - { id: broken, step: { type: raw_sql, sql: \"SELEC 1;\" } }\n",
    );

    cmd()
        .args(["--config", &config, "apply", "--file", &file])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Migration 'broken' failed on sqlite3"));
}

#[test]
fn test_health_check_sqlite() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(dir.path(), false);

    cmd()
        .args(["--config", &config, "--output-json", "health-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"connected\": true"));
}

#[test]
fn test_rust_log_overrides_verbosity() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(dir.path(), false);

    cmd()
        .env("RUST_LOG", "debug")
        .args(["--config", &config, "--verbosity", "error", "health-check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Opening sqlite3 session"));

    cmd()
        .env_remove("RUST_LOG")
        .args(["--config", &config, "--verbosity", "error", "health-check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Opening sqlite3 session").not());
}
