//! Integration tests for the planboard binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const ENV_KEYS: [&str; 5] = [
    "PLANBOARD_HOST",
    "PLANBOARD_PORT",
    "PLANBOARD_DB_PATH",
    "PLANBOARD_PUBLIC_URL",
    "PLANBOARD_LOG_LEVEL",
];

/// A planboard Command running in `dir` with no inherited overrides.
fn planboard(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("planboard");
    cmd.current_dir(dir.path());
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_planboard_help() {
        let dir = create_temp_project();
        planboard(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("init"));
    }

    #[test]
    fn test_planboard_version() {
        let dir = create_temp_project();
        planboard(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("planboard"));
    }

    #[test]
    fn test_serve_help_lists_flags() {
        let dir = create_temp_project();
        planboard(&dir)
            .args(["serve", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--port"))
            .stdout(predicate::str::contains("--db-path"))
            .stdout(predicate::str::contains("--dev"));
    }

    #[test]
    fn test_unknown_command_fails() {
        let dir = create_temp_project();
        planboard(&dir).arg("frobnicate").assert().failure();
    }
}

// =============================================================================
// Database Init Tests
// =============================================================================

mod init {
    use super::*;

    #[test]
    fn test_init_creates_default_database() {
        let dir = create_temp_project();
        planboard(&dir)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Planboard database initialized"));

        assert!(dir.path().join(".planboard/planboard.db").exists());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = create_temp_project();
        planboard(&dir).arg("init").assert().success();
        planboard(&dir).arg("init").assert().success();
        assert!(dir.path().join(".planboard/planboard.db").exists());
    }

    #[test]
    fn test_init_honors_db_path_env() {
        let dir = create_temp_project();
        planboard(&dir)
            .env("PLANBOARD_DB_PATH", "data/board.db")
            .arg("init")
            .assert()
            .success();

        assert!(dir.path().join("data/board.db").exists());
        assert!(!dir.path().join(".planboard/planboard.db").exists());
    }

    #[test]
    fn test_init_honors_config_file() {
        let dir = create_temp_project();
        fs::write(
            dir.path().join("custom.toml"),
            "[database]\npath = \"store/custom.db\"\n",
        )
        .unwrap();

        planboard(&dir)
            .args(["--config", "custom.toml", "init"])
            .assert()
            .success();

        assert!(dir.path().join("store/custom.db").exists());
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();
        planboard(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("using defaults"))
            .stdout(predicate::str::contains("port = 3141"))
            .stdout(predicate::str::contains("cookie_name = \"planboard-session\""));
    }

    #[test]
    fn test_config_show_applies_env_and_flags() {
        let dir = create_temp_project();
        planboard(&dir)
            .env("PLANBOARD_PORT", "9000")
            .args(["-v", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 9000"))
            .stdout(predicate::str::contains("level = \"debug\""));
    }

    #[test]
    fn test_config_init_creates_toml() {
        let dir = create_temp_project();
        planboard(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Wrote default configuration"));

        assert!(dir.path().join(".planboard/planboard.toml").exists());

        // A second init refuses to overwrite.
        planboard(&dir)
            .args(["config", "init"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_show_reads_default_file() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".planboard")).unwrap();
        fs::write(
            dir.path().join(".planboard/planboard.toml"),
            "[server]\nport = 4000\n\n[invite]\ncode_length = 12\n",
        )
        .unwrap();

        planboard(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Config file"))
            .stdout(predicate::str::contains("port = 4000"))
            .stdout(predicate::str::contains("code_length = 12"));
    }

    #[test]
    fn test_config_validate_defaults() {
        let dir = create_temp_project();
        planboard(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("valid"));
    }

    #[test]
    fn test_config_validate_rejects_short_invite_code() {
        let dir = create_temp_project();
        fs::write(dir.path().join("bad.toml"), "[invite]\ncode_length = 3\n").unwrap();

        planboard(&dir)
            .args(["--config", "bad.toml", "config", "validate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("code_length"));
    }

    #[test]
    fn test_config_validate_rejects_misspelled_log_level() {
        let dir = create_temp_project();
        fs::write(dir.path().join("bad.toml"), "[logging]\nlevel = \"inof\"\n").unwrap();

        planboard(&dir)
            .args(["--config", "bad.toml", "config", "validate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("logging.level"));
    }

    #[test]
    fn test_config_validate_rejects_endless_sessions() {
        let dir = create_temp_project();
        fs::write(dir.path().join("bad.toml"), "[auth]\nsession_ttl_hours = 4000000000\n").unwrap();

        planboard(&dir)
            .args(["--config", "bad.toml", "config", "validate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("session_ttl_hours"));
    }

    #[test]
    fn test_invalid_port_env_fails_fast() {
        let dir = create_temp_project();
        planboard(&dir)
            .env("PLANBOARD_PORT", "not-a-port")
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("PLANBOARD_PORT"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = create_temp_project();
        planboard(&dir)
            .args(["--config", "missing.toml", "config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing.toml"));
    }
}
