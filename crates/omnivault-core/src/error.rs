// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the OmniVault secret store.
//!
//! The variants mirror the stable error taxonomy surfaced over IPC. Crypto
//! failures (bad tag, truncated ciphertext) are collapsed into [`Corrupt`]
//! so the daemon never acts as a decryption oracle over secret data; only
//! [`InvalidPassword`] is deliberately distinguishable, because it is
//! produced by the verification blob and not by decrypting secrets.
//!
//! [`Corrupt`]: OmniVaultError::Corrupt
//! [`InvalidPassword`]: OmniVaultError::InvalidPassword

use thiserror::Error;

/// The primary error type used across the store, daemon, and client crates.
#[derive(Debug, Error)]
pub enum OmniVaultError {
    /// Malformed request body, missing path, or invalid parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An operation requires a vault that has not been initialized.
    #[error("vault does not exist, run init first")]
    VaultNotFound,

    /// `init` was called but a vault already exists on disk.
    #[error("vault already exists")]
    AlreadyExists,

    /// The supplied master password failed verification.
    #[error("invalid password")]
    InvalidPassword,

    /// A secret operation was attempted while the vault is locked.
    #[error("vault is locked")]
    VaultLocked,

    /// No secret is stored under the given path.
    #[error("secret '{0}' not found")]
    SecretNotFound(String),

    /// AEAD open failure, bad base64, or a malformed vault file.
    #[error("corrupted data: {0}")]
    Corrupt(String),

    /// Disk I/O failure while reading or writing vault files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (invalid TOML, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, OmniVaultError>;
