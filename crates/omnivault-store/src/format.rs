// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk vault files and atomic writes.
//!
//! Two JSON files make up a vault:
//!
//! - `vault.meta` -- plaintext metadata: format version, creation time, the
//!   Argon2id salt and parameters, and the encrypted verification blob.
//! - `vault.enc` -- the data file: a map from secret path to the base64
//!   `nonce ∥ ciphertext ∥ tag` blob of that secret's JSON.
//!
//! Writes go to a sibling temp file followed by a rename, so a reader never
//! observes a half-written vault. Both files are created owner-only (0600).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use omnivault_core::{OmniVaultError, Result};

use crate::kdf::Argon2Params;

/// Current vault format version. Migrations are out of scope; a mismatch is
/// treated as corruption.
pub const CURRENT_VERSION: u32 = 1;

/// Plaintext vault metadata, stored as `vault.meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultMeta {
    /// Format version, starting at 1.
    pub version: u32,

    /// When the vault was first initialized.
    pub created_at: DateTime<Utc>,

    /// Argon2id salt (base64 in JSON, 32 random bytes).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// KDF parameters in force for this vault.
    pub argon2_params: Argon2Params,

    /// Encrypted verification blob used to check candidate passwords.
    pub verification: String,
}

/// Encrypted vault data, stored as `vault.enc`.
///
/// A `BTreeMap` keeps the serialized file deterministic and makes prefix
/// listing naturally sorted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultData {
    pub secrets: BTreeMap<String, String>,
}

/// Read and validate the metadata file.
pub fn read_meta(path: &Path) -> Result<VaultMeta> {
    if !path.exists() {
        return Err(OmniVaultError::VaultNotFound);
    }

    let bytes = std::fs::read(path)?;
    let meta: VaultMeta = serde_json::from_slice(&bytes)
        .map_err(|e| OmniVaultError::Corrupt(format!("vault metadata: {e}")))?;

    if meta.version != CURRENT_VERSION {
        return Err(OmniVaultError::Corrupt(format!(
            "unsupported vault version {} (expected {CURRENT_VERSION})",
            meta.version
        )));
    }

    Ok(meta)
}

/// Atomically write the metadata file.
pub fn write_meta(path: &Path, meta: &VaultMeta) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(meta)
        .map_err(|e| OmniVaultError::Internal(format!("serialize vault metadata: {e}")))?;
    write_atomic(path, &bytes)
}

/// Read the data file. A missing file is an empty vault, not an error --
/// `init` writes metadata first, and a fresh vault has no secrets yet.
pub fn read_data(path: &Path) -> Result<VaultData> {
    if !path.exists() {
        return Ok(VaultData::default());
    }

    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| OmniVaultError::Corrupt(format!("vault data: {e}")))
}

/// Atomically write the data file.
pub fn write_data(path: &Path, data: &VaultData) -> Result<()> {
    let bytes = serde_json::to_vec(data)
        .map_err(|e| OmniVaultError::Internal(format!("serialize vault data: {e}")))?;
    write_atomic(path, &bytes)
}

/// Write `bytes` to a sibling temp file (mode 0600), then rename over the
/// target. The temp file lives in the same directory so the rename stays on
/// one filesystem and is atomic.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| OmniVaultError::Internal(format!("bad vault path: {}", path.display())))?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path)?;
        file.write_all(bytes)?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
