// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The crypto session: holds the derived master key between unlock and lock.
//!
//! A session is `Locked` (no key) or `Unlocked` (key present). Unlocking
//! derives the key from the password; it does not by itself prove the
//! password is correct -- that is what the verification blob is for. Without
//! it, any password would "unlock" the vault and silently corrupt every
//! subsequent read.

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use omnivault_core::{OmniVaultError, Result};

use crate::crypto;
use crate::kdf::{self, Argon2Params, KEY_LEN};

/// Fixed magic string encrypted under the master key as the verification
/// blob. Part of the on-disk format.
pub const VERIFICATION_MAGIC: &str = "omnivault-v1";

/// Length of a freshly generated salt in bytes.
pub const SALT_LEN: usize = 32;

/// Minimum accepted salt length in bytes.
pub const MIN_SALT_LEN: usize = 16;

/// Holds KDF parameters, the salt, and -- while unlocked -- the derived key.
///
/// The key is wrapped in [`Zeroizing`] so its bytes are overwritten with
/// zeros when cleared, whether by [`lock`](Self::lock) or by drop.
pub struct CryptoSession {
    params: Argon2Params,
    salt: Vec<u8>,
    key: Option<Zeroizing<[u8; KEY_LEN]>>,
}

impl std::fmt::Debug for CryptoSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoSession")
            .field("params", &self.params)
            .field("unlocked", &self.key.is_some())
            .finish()
    }
}

impl CryptoSession {
    /// Create a locked session.
    ///
    /// With `salt: None` a fresh random 32-byte salt is generated. A
    /// supplied salt shorter than 16 bytes is rejected.
    pub fn new(salt: Option<Vec<u8>>, params: Argon2Params) -> Result<Self> {
        let salt = match salt {
            Some(salt) => {
                if salt.len() < MIN_SALT_LEN {
                    return Err(OmniVaultError::Corrupt(format!(
                        "salt must be at least {MIN_SALT_LEN} bytes (got {})",
                        salt.len()
                    )));
                }
                salt
            }
            None => crypto::random_bytes(SALT_LEN)?,
        };

        Ok(Self {
            params,
            salt,
            key: None,
        })
    }

    /// Derive the key from `password` and transition to `Unlocked`.
    ///
    /// Does not check the password against anything -- callers verify first
    /// via [`verify_password`](Self::verify_password). Re-unlocking an
    /// already unlocked session just re-derives.
    pub fn unlock(&mut self, password: &SecretString) -> Result<()> {
        let key = kdf::derive_key(
            password.expose_secret().as_bytes(),
            &self.salt,
            &self.params,
        )?;
        self.key = Some(key);
        Ok(())
    }

    /// Zeroize and release the key, transitioning to `Locked`. Idempotent.
    pub fn lock(&mut self) {
        // Dropping the Zeroizing wrapper overwrites the key bytes.
        self.key = None;
    }

    /// Whether a key is currently held.
    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// Check a candidate password against a stored verification blob.
    ///
    /// Derives a temporary key, attempts to open the blob, and compares the
    /// plaintext to the magic string in constant time. The temporary key is
    /// zeroized before returning. A wrong password returns `false`, never
    /// an error.
    pub fn verify_password(&self, password: &SecretString, verification: &str) -> bool {
        let Ok(key) = kdf::derive_key(
            password.expose_secret().as_bytes(),
            &self.salt,
            &self.params,
        ) else {
            return false;
        };

        match crypto::decrypt(&key, verification) {
            Ok(plaintext) => crypto::constant_time_eq(&plaintext, VERIFICATION_MAGIC.as_bytes()),
            Err(_) => false,
        }
        // `key` drops here; Zeroizing overwrites it.
    }

    /// Encrypt the magic string under the current key. Requires `Unlocked`.
    pub fn create_verification_blob(&self) -> Result<String> {
        self.encrypt_bytes(VERIFICATION_MAGIC.as_bytes())
    }

    /// Encrypt raw bytes. Requires `Unlocked`.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String> {
        crypto::encrypt(self.key()?, plaintext)
    }

    /// Decrypt a blob to raw bytes. Requires `Unlocked`.
    pub fn decrypt_bytes(&self, blob: &str) -> Result<Vec<u8>> {
        crypto::decrypt(self.key()?, blob)
    }

    /// Encrypt a UTF-8 string. Requires `Unlocked`.
    pub fn encrypt_string(&self, plaintext: &str) -> Result<String> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Decrypt a blob to a UTF-8 string. Requires `Unlocked`.
    pub fn decrypt_string(&self, blob: &str) -> Result<String> {
        let bytes = self.decrypt_bytes(blob)?;
        String::from_utf8(bytes)
            .map_err(|_| OmniVaultError::Corrupt("decrypted value is not valid UTF-8".to_string()))
    }

    /// The salt used for key derivation (persisted in vault metadata).
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// The Argon2id parameters (persisted in vault metadata).
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    fn key(&self) -> Result<&[u8; KEY_LEN]> {
        self.key.as_deref().ok_or(OmniVaultError::VaultLocked)
    }
}
