// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./omnivault.toml` >
//! `~/.config/omnivault/omnivault.toml` > `/etc/omnivault/omnivault.toml`
//! with environment variable overrides via the `OMNIVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::OmniVaultConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/omnivault/omnivault.toml` (system-wide)
/// 3. `~/.config/omnivault/omnivault.toml` (user XDG config)
/// 4. `./omnivault.toml` (local directory)
/// 5. `OMNIVAULT_*` environment variables
pub fn load_config() -> Result<OmniVaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OmniVaultConfig::default()))
        .merge(Toml::file("/etc/omnivault/omnivault.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("omnivault/omnivault.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("omnivault.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file or env lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<OmniVaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OmniVaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OmniVaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OmniVaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `OMNIVAULT_DAEMON_AUTO_LOCK_SECS` must map to
/// `daemon.auto_lock_secs`, not `daemon.auto.lock.secs`.
fn env_provider() -> Env {
    Env::prefixed("OMNIVAULT_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: OMNIVAULT_DAEMON_AUTO_LOCK_SECS -> "daemon_auto_lock_secs"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("daemon_", "daemon.", 1)
            .replacen("vault_", "vault.", 1);
        mapped.into()
    })
}
