// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from the master password.
//!
//! Derives a 32-byte key using Argon2id (Algorithm::Argon2id, Version::V0x13).
//! The cost parameters are persisted in the vault metadata so a vault always
//! unlocks with the parameters it was created with, even after the defaults
//! are raised.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use omnivault_core::{OmniVaultError, Result};

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Argon2id cost parameters, serialized into the vault metadata under the
/// exact key names shown (`time`, `memory`, `threads`, `key_len`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Iteration count.
    pub time: u32,
    /// Memory cost in KiB.
    pub memory: u32,
    /// Parallelism lanes.
    pub threads: u32,
    /// Derived key length in bytes. Only 32 is supported.
    pub key_len: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time: 3,
            memory: 65_536,
            threads: 4,
            key_len: KEY_LEN as u32,
        }
    }
}

/// Derive a 32-byte key from a password and salt using Argon2id.
///
/// The same password + salt + params always produce the same key. The
/// returned key is wrapped in [`Zeroizing`] for automatic memory zeroing
/// on drop.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if params.key_len as usize != KEY_LEN {
        return Err(OmniVaultError::Corrupt(format!(
            "unsupported key length {} (expected {KEY_LEN})",
            params.key_len
        )));
    }

    let argon_params = Params::new(params.memory, params.time, params.threads, Some(KEY_LEN))
        .map_err(|e| OmniVaultError::Internal(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password, salt, output.as_mut())
        .map_err(|e| OmniVaultError::Internal(format!("Argon2id key derivation failed: {e}")))?;

    Ok(output)
}
