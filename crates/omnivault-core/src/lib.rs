// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types for the OmniVault encrypted secret store.
//!
//! This crate holds everything shared between the store, the daemon, and the
//! client library: the error taxonomy, the [`Secret`] domain model, and the
//! IPC wire protocol types.

pub mod error;
pub mod protocol;
pub mod types;

pub use error::{OmniVaultError, Result};
pub use types::{Metadata, Secret};
