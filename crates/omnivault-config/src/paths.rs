// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem layout for the vault and the daemon runtime files.
//!
//! Everything lives in one owner-only directory:
//!
//! ```text
//! <config_dir>/
//!   vault.enc        encrypted secrets (JSON)
//!   vault.meta       vault metadata (JSON, plaintext)
//!   omnivaultd.sock  IPC endpoint (POSIX only)
//!   omnivaultd.pid   daemon PID file
//! ```
//!
//! On POSIX the directory is `~/.omnivault`; elsewhere it sits under the
//! user's local app-data directory. Tests inject a temp directory via
//! [`Paths::in_dir`] so multiple daemons can run in parallel.

use std::path::{Path, PathBuf};

/// All filesystem paths used by OmniVault.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base configuration directory (mode 0700).
    pub config_dir: PathBuf,

    /// Encrypted vault data file.
    pub vault_file: PathBuf,

    /// Vault metadata file (salt, KDF params, verification blob).
    pub meta_file: PathBuf,

    /// Unix socket path for the daemon (POSIX only).
    pub socket_path: PathBuf,

    /// Loopback TCP address for the daemon (used where Unix sockets are
    /// unavailable).
    pub tcp_addr: String,

    /// Daemon PID file.
    pub pid_file: PathBuf,
}

impl Paths {
    /// Paths for the current user's default OmniVault directory.
    pub fn new(tcp_port: u16) -> Self {
        #[cfg(unix)]
        let config_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".omnivault");

        #[cfg(not(unix))]
        let config_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("OmniVault");

        Self::build(config_dir, tcp_port)
    }

    /// Paths rooted at an explicit directory. Used by tests and by the
    /// `--dir` daemon flag to run isolated instances.
    pub fn in_dir(dir: impl AsRef<Path>, tcp_port: u16) -> Self {
        Self::build(dir.as_ref().to_path_buf(), tcp_port)
    }

    fn build(config_dir: PathBuf, tcp_port: u16) -> Self {
        Self {
            vault_file: config_dir.join("vault.enc"),
            meta_file: config_dir.join("vault.meta"),
            socket_path: config_dir.join("omnivaultd.sock"),
            tcp_addr: format!("127.0.0.1:{tcp_port}"),
            pid_file: config_dir.join("omnivaultd.pid"),
            config_dir,
        }
    }

    /// Create the configuration directory if needed, owner-only.
    pub fn ensure_config_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(
                &self.config_dir,
                std::fs::Permissions::from_mode(0o700),
            )?;
        }

        Ok(())
    }

    /// Whether a vault has been initialized in this directory.
    pub fn vault_exists(&self) -> bool {
        self.meta_file.exists()
    }

    /// Remove a stale socket file, if any. Best-effort.
    pub fn cleanup_socket(&self) {
        #[cfg(unix)]
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                tracing::warn!(error = %e, path = %self.socket_path.display(), "failed to remove stale socket");
            }
        }
    }

    /// Remove the PID file, if any. Best-effort.
    pub fn cleanup_pid_file(&self) {
        if self.pid_file.exists() {
            if let Err(e) = std::fs::remove_file(&self.pid_file) {
                tracing::warn!(error = %e, path = %self.pid_file.display(), "failed to remove PID file");
            }
        }
    }
}
