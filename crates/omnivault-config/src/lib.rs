// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the OmniVault daemon.
//!
//! Three pieces: the TOML config model ([`model`]), the layered loader
//! ([`loader`]), and the filesystem layout ([`paths`]) covering the vault
//! files and the IPC endpoint.

pub mod loader;
pub mod model;
pub mod paths;

pub use loader::{load_config, load_config_from_str};
pub use model::OmniVaultConfig;
pub use paths::Paths;
