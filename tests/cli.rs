//! CLI integration tests for ebpfhub admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use chrono::Utc;
use ebpfhub::auth::token_key;
use ebpfhub::store::{SqliteStore, Store};
use predicates::prelude::*;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ebpfhub").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .env_remove("ALGOLIA_APPLICATION_ID")
            .env_remove("ALGOLIA_API_KEY");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["admin", "init", "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn issue_token(&self, extra: &[&str]) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([
                "admin",
                "issue-token",
                "--account",
                "account-1",
                "--data-dir",
                &self.data_dir_str(),
            ])
            .args(extra)
            .assert()
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("ebpfhub.db")).expect("open store")
    }
}

fn extract_token(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("ebpfhub_"))
        .expect("token in output")
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Database ready"));

    assert!(ctx.data_dir().join("ebpfhub.db").exists());
}

#[test]
fn test_init_is_idempotent() {
    let ctx = TestContext::new();

    ctx.init().success();
    ctx.init().success();
}

#[test]
fn test_issue_token_resolves_to_account() {
    let ctx = TestContext::new();
    ctx.init().success();

    let output = ctx.issue_token(&[]).success().get_output().stdout.clone();
    let token = extract_token(&output);

    let identity = ctx
        .store()
        .get_identity(&token_key(&token))
        .unwrap()
        .expect("identity stored");
    assert_eq!(identity.belong, "account-1");
    assert!(identity.expires_at.is_none());
}

#[test]
fn test_issue_token_with_expiry() {
    let ctx = TestContext::new();
    ctx.init().success();

    let output = ctx
        .issue_token(&["--expires-in-seconds", "3600"])
        .success()
        .get_output()
        .stdout
        .clone();
    let token = extract_token(&output);

    let identity = ctx
        .store()
        .get_identity(&token_key(&token))
        .unwrap()
        .expect("identity stored");
    let expires_at = identity.expires_at.expect("expiry set");
    assert!(expires_at > Utc::now());
    assert!(!identity.is_expired(Utc::now()));
}

#[test]
fn test_issue_token_rejects_non_positive_expiry() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.issue_token(&["--expires-in-seconds", "0"])
        .failure()
        .stderr(predicate::str::contains("must be positive"));
}

#[test]
fn test_issue_token_requires_init() {
    let ctx = TestContext::new();

    ctx.issue_token(&[])
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_sync_requires_search_credentials() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["admin", "sync", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ALGOLIA_APPLICATION_ID is not set"));
}

#[test]
fn test_sync_with_empty_outbox() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .env("ALGOLIA_APPLICATION_ID", "app")
        .env("ALGOLIA_API_KEY", "key")
        .args(["admin", "sync", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Delivered 0 pending search writes, 0 still failing",
        ));
}

#[test]
fn test_sync_reads_config_file() {
    let ctx = TestContext::new();
    ctx.init().success();

    let config_path = ctx.data_dir().join("ebpfhub.toml");
    std::fs::write(
        &config_path,
        "[search]\napplication_id = \"app\"\napi_key = \"key\"\n",
    )
    .unwrap();

    ctx.cmd()
        .args([
            "admin",
            "sync",
            "--config",
            &config_path.to_string_lossy(),
            "--data-dir",
            &ctx.data_dir_str(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Delivered 0"));
}
