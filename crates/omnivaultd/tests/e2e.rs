// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: a real daemon on a temp-directory socket, driven
//! through the client library.
//!
//! Each test gets an isolated daemon with its own state directory, so tests
//! are independent and order-insensitive. KDF cost is lowered to keep the
//! suite fast; the crypto path is otherwise identical to production.

#![cfg(unix)]

use std::collections::HashMap;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use omnivault_client::Client;
use omnivault_config::{OmniVaultConfig, Paths};
use omnivault_daemon::Daemon;

// ---- Harness ----

struct TestDaemon {
    client: Client,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
    paths: Paths,
    _dir: TempDir,
}

impl TestDaemon {
    /// Start a daemon in a fresh temp directory.
    async fn start() -> Self {
        Self::start_with_auto_lock(None).await
    }

    async fn start_with_auto_lock(auto_lock: Option<Duration>) -> Self {
        let dir = TempDir::new().unwrap();
        let paths = Paths::in_dir(dir.path(), 19839);

        let mut config = OmniVaultConfig::default();
        config.vault.kdf_time_cost = 1;
        config.vault.kdf_memory_cost = 8_192;
        config.vault.kdf_parallelism = 1;

        let mut daemon = Daemon::new(paths.clone(), &config);
        if let Some(timeout) = auto_lock {
            daemon = daemon.with_auto_lock(timeout);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if let Err(e) = daemon.run(cancel).await {
                    panic!("daemon exited with error: {e}");
                }
            }
        });

        let client = Client::new(&paths);
        for _ in 0..200 {
            if client.is_running().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(client.is_running().await, "daemon did not come up");

        Self {
            client,
            cancel,
            handle,
            paths,
            _dir: dir,
        }
    }

    /// Restart the daemon against the same state directory.
    async fn restart(&mut self) {
        self.cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(5), &mut self.handle).await;

        let mut config = OmniVaultConfig::default();
        config.vault.kdf_time_cost = 1;
        config.vault.kdf_memory_cost = 8_192;
        config.vault.kdf_parallelism = 1;

        let daemon = Daemon::new(self.paths.clone(), &config);
        self.cancel = CancellationToken::new();
        self.handle = tokio::spawn({
            let cancel = self.cancel.clone();
            async move {
                if let Err(e) = daemon.run(cancel).await {
                    panic!("daemon exited with error: {e}");
                }
            }
        });

        for _ in 0..200 {
            if self.client.is_running().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("daemon did not come back up");
    }

    async fn shutdown(self) {
        self.cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

fn daemon_err(err: omnivault_client::ClientError) -> omnivault_client::DaemonError {
    match err {
        omnivault_client::ClientError::Daemon(e) => e,
        other => panic!("expected daemon error, got: {other}"),
    }
}

// ---- Scenario 1: init -> set -> get ----

#[tokio::test]
async fn s1_init_set_get() {
    let daemon = TestDaemon::start().await;

    daemon.client.init("correcthorse").await.unwrap();
    daemon
        .client
        .set("db/pw", Some("s3cret".to_string()), HashMap::new(), HashMap::new())
        .await
        .unwrap();

    let secret = daemon.client.get("db/pw").await.unwrap();
    assert_eq!(secret.path, "db/pw");
    assert_eq!(secret.value.as_deref(), Some("s3cret"));
    assert!(secret.created_at.is_some());

    let status = daemon.client.status().await.unwrap();
    assert!(status.running);
    assert!(!status.locked);
    assert!(status.vault_exists);
    assert_eq!(status.secret_count, 1);
    assert!(status.unlocked_at.is_some());

    daemon.shutdown().await;
}

// ---- Scenario 2: lock -> unlock ----

#[tokio::test]
async fn s2_lock_then_unlock() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();
    daemon
        .client
        .set("db/pw", Some("s3cret".to_string()), HashMap::new(), HashMap::new())
        .await
        .unwrap();

    daemon.client.lock().await.unwrap();
    let err = daemon_err(daemon.client.get("db/pw").await.unwrap_err());
    assert!(err.is_locked());
    assert_eq!(err.status, 403);

    daemon.client.unlock("correcthorse").await.unwrap();
    let secret = daemon.client.get("db/pw").await.unwrap();
    assert_eq!(secret.value.as_deref(), Some("s3cret"));

    daemon.shutdown().await;
}

// ---- Scenario 3: wrong password ----

#[tokio::test]
async fn s3_wrong_password() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();
    daemon.client.lock().await.unwrap();

    let err = daemon_err(daemon.client.unlock("wronghorse").await.unwrap_err());
    assert!(err.is_invalid_password());
    assert_eq!(err.status, 401);

    let status = daemon.client.status().await.unwrap();
    assert!(status.locked);

    daemon.shutdown().await;
}

// ---- Scenario 4: prefix listing ----

#[tokio::test]
async fn s4_prefix_list() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();

    for path in ["a/1", "a/2", "b/1"] {
        daemon
            .client
            .set(path, Some("x".to_string()), HashMap::new(), HashMap::new())
            .await
            .unwrap();
    }

    let listed = daemon.client.list("a/").await.unwrap();
    let paths: Vec<&str> = listed.secrets.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(paths, vec!["a/1", "a/2"]);
    assert_eq!(listed.count, 2);

    let all = daemon.client.list("").await.unwrap();
    let paths: Vec<&str> = all.secrets.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(paths, vec!["a/1", "a/2", "b/1"]);
    assert_eq!(all.count, 3);

    daemon.shutdown().await;
}

// ---- Scenario 5: change password ----

#[tokio::test]
async fn s5_change_password() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();
    daemon
        .client
        .set("db/pw", Some("s3cret".to_string()), HashMap::new(), HashMap::new())
        .await
        .unwrap();

    daemon
        .client
        .change_password("correcthorse", "tr0ub4dor")
        .await
        .unwrap();

    // Still unlocked; reads keep working.
    let secret = daemon.client.get("db/pw").await.unwrap();
    assert_eq!(secret.value.as_deref(), Some("s3cret"));

    daemon.client.lock().await.unwrap();
    let err = daemon_err(daemon.client.unlock("correcthorse").await.unwrap_err());
    assert!(err.is_invalid_password());

    daemon.client.unlock("tr0ub4dor").await.unwrap();
    let secret = daemon.client.get("db/pw").await.unwrap();
    assert_eq!(secret.value.as_deref(), Some("s3cret"));

    daemon.shutdown().await;
}

// ---- Scenario 6: auto-lock ----

#[tokio::test]
async fn s6_auto_lock_after_idle() {
    let daemon = TestDaemon::start_with_auto_lock(Some(Duration::from_millis(100))).await;
    daemon.client.init("correcthorse").await.unwrap();
    daemon
        .client
        .set("p", Some("s".to_string()), HashMap::new(), HashMap::new())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    let status = daemon.client.status().await.unwrap();
    assert!(status.locked, "vault should have auto-locked");

    let err = daemon_err(daemon.client.get("p").await.unwrap_err());
    assert!(err.is_locked());

    daemon.shutdown().await;
}

#[tokio::test]
async fn auto_lock_deadline_is_pushed_by_activity() {
    let daemon = TestDaemon::start_with_auto_lock(Some(Duration::from_millis(400))).await;
    daemon.client.init("correcthorse").await.unwrap();

    // Keep touching the store more often than the timeout.
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        daemon.client.list("").await.unwrap();
    }
    let status = daemon.client.status().await.unwrap();
    assert!(!status.locked, "activity must keep the vault unlocked");

    daemon.shutdown().await;
}

// ---- Error surface ----

#[tokio::test]
async fn status_before_init_reports_no_vault() {
    let daemon = TestDaemon::start().await;

    let status = daemon.client.status().await.unwrap();
    assert!(status.running);
    assert!(status.locked);
    assert!(!status.vault_exists);
    assert_eq!(status.secret_count, 0);
    assert!(status.unlocked_at.is_none());

    daemon.shutdown().await;
}

#[tokio::test]
async fn unlock_without_vault_is_not_found() {
    let daemon = TestDaemon::start().await;

    let err = daemon_err(daemon.client.unlock("whatever").await.unwrap_err());
    assert!(err.is_not_found());
    assert_eq!(err.status, 404);

    daemon.shutdown().await;
}

#[tokio::test]
async fn init_twice_conflicts() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();

    let err = daemon_err(daemon.client.init("correcthorse").await.unwrap_err());
    assert!(err.is_already_exists());
    assert_eq!(err.status, 409);

    daemon.shutdown().await;
}

#[tokio::test]
async fn short_password_rejected_at_init() {
    let daemon = TestDaemon::start().await;

    let err = daemon_err(daemon.client.init("short").await.unwrap_err());
    assert_eq!(err.status, 400);
    // The vault must not have been created.
    let status = daemon.client.status().await.unwrap();
    assert!(!status.vault_exists);

    daemon.shutdown().await;
}

#[tokio::test]
async fn get_missing_secret_is_not_found() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();

    let err = daemon_err(daemon.client.get("no/such/path").await.unwrap_err());
    assert!(err.is_not_found());
    assert_eq!(err.status, 404);

    daemon.shutdown().await;
}

#[tokio::test]
async fn delete_missing_secret_succeeds() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();

    let resp = daemon.client.delete("never/existed").await.unwrap();
    assert!(resp.success);

    daemon.shutdown().await;
}

// ---- Multi-field secrets ----

#[tokio::test]
async fn fields_and_tags_round_trip() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();

    let fields = HashMap::from([
        ("username".to_string(), "alice".to_string()),
        ("password".to_string(), "hunter2".to_string()),
    ]);
    let tags = HashMap::from([("env".to_string(), "prod".to_string())]);

    daemon
        .client
        .set("db/main", None, fields.clone(), tags.clone())
        .await
        .unwrap();

    let secret = daemon.client.get("db/main").await.unwrap();
    assert_eq!(secret.fields, fields);
    assert_eq!(secret.tags, tags);

    let listed = daemon.client.list("").await.unwrap();
    assert_eq!(listed.secrets.len(), 1);
    assert!(!listed.secrets[0].has_value);
    assert!(listed.secrets[0].has_fields);
    assert_eq!(listed.secrets[0].tags, vec!["env"]);
    assert!(listed.secrets[0].updated_at.is_some());

    daemon.shutdown().await;
}

// ---- Lifecycle ----

#[tokio::test]
async fn secrets_survive_daemon_restart() {
    let mut daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();
    daemon
        .client
        .set("k", Some("v".to_string()), HashMap::new(), HashMap::new())
        .await
        .unwrap();

    daemon.restart().await;

    // Fresh process: vault exists but is locked.
    let status = daemon.client.status().await.unwrap();
    assert!(status.vault_exists);
    assert!(status.locked);

    daemon.client.unlock("correcthorse").await.unwrap();
    let secret = daemon.client.get("k").await.unwrap();
    assert_eq!(secret.value.as_deref(), Some("v"));

    daemon.shutdown().await;
}

#[tokio::test]
async fn stop_request_shuts_daemon_down() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();

    let resp = daemon.client.stop().await.unwrap();
    assert!(resp.success);

    // The daemon tears down shortly after replying.
    let mut stopped = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if !daemon.client.is_running().await {
            stopped = true;
            break;
        }
    }
    assert!(stopped, "daemon still reachable after /stop");

    // Runtime files are removed as the last shutdown step.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!daemon.paths.socket_path.exists(), "socket not cleaned up");
    assert!(!daemon.paths.pid_file.exists(), "PID file not cleaned up");

    daemon.shutdown().await;
}

#[tokio::test]
async fn cancel_driven_shutdown_preserves_vault() {
    let mut daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();
    daemon
        .client
        .set("k", Some("v".to_string()), HashMap::new(), HashMap::new())
        .await
        .unwrap();

    // Cancel-driven shutdown (same path as SIGTERM).
    daemon.restart().await;

    daemon.client.unlock("correcthorse").await.unwrap();
    assert_eq!(
        daemon.client.get("k").await.unwrap().value.as_deref(),
        Some("v")
    );

    daemon.shutdown().await;
}

#[tokio::test]
async fn change_password_while_locked_is_permitted() {
    let daemon = TestDaemon::start().await;
    daemon.client.init("correcthorse").await.unwrap();
    daemon
        .client
        .set("k", Some("v".to_string()), HashMap::new(), HashMap::new())
        .await
        .unwrap();
    daemon.client.lock().await.unwrap();

    daemon
        .client
        .change_password("correcthorse", "tr0ub4dor")
        .await
        .unwrap();

    // Still locked afterwards.
    let status = daemon.client.status().await.unwrap();
    assert!(status.locked);

    daemon.client.unlock("tr0ub4dor").await.unwrap();
    assert_eq!(
        daemon.client.get("k").await.unwrap().value.as_deref(),
        Some("v")
    );

    daemon.shutdown().await;
}
