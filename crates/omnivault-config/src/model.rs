// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the OmniVault daemon.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level OmniVault configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OmniVaultConfig {
    /// Daemon behavior settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Key derivation settings for new vaults.
    #[serde(default)]
    pub vault: VaultConfig,
}

impl Default for OmniVaultConfig {
    fn default() -> Self {
        Self {
            daemon: DaemonConfig::default(),
            vault: VaultConfig::default(),
        }
    }
}

/// Daemon behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Seconds of inactivity before the vault auto-locks.
    #[serde(default = "default_auto_lock_secs")]
    pub auto_lock_secs: u64,

    /// Loopback TCP port used where Unix sockets are unavailable.
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            auto_lock_secs: default_auto_lock_secs(),
            tcp_port: default_tcp_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_auto_lock_secs() -> u64 {
    // 15 minutes.
    900
}

fn default_tcp_port() -> u16 {
    19839
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Argon2id cost settings applied when a vault is created or re-keyed.
///
/// Existing vaults always unlock with the parameters persisted in their
/// metadata, so raising these later does not break old vaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Argon2id iteration count.
    #[serde(default = "default_kdf_time_cost")]
    pub kdf_time_cost: u32,

    /// Argon2id memory cost in KiB.
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id parallelism lanes.
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_time_cost: default_kdf_time_cost(),
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_kdf_time_cost() -> u32 {
    3
}

fn default_kdf_memory_cost() -> u32 {
    // 64 MB.
    65_536
}

fn default_kdf_parallelism() -> u32 {
    4
}
