// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open operations.
//!
//! Every call to [`encrypt`] generates a fresh random 96-bit nonce via the
//! system CSPRNG. Nonce reuse would be catastrophic for GCM security.
//!
//! Layout of an encrypted blob, base64-encoded as a single string:
//!
//! ```text
//! [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use omnivault_core::{OmniVaultError, Result};

use crate::kdf::KEY_LEN;

/// Length of the AES-256-GCM nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` with AES-256-GCM under a fresh random nonce.
///
/// Returns base64 of `nonce ∥ ciphertext ∥ tag`. Two calls with the same
/// inputs produce different output because the nonce is random.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| OmniVaultError::Internal("failed to create AES-256-GCM key".to_string()))?;
    let less_safe = LessSafeKey::new(unbound);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| OmniVaultError::Internal("failed to generate random nonce".to_string()))?;

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // Seal in place: the buffer is extended with the authentication tag.
    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| OmniVaultError::Internal("AES-256-GCM encryption failed".to_string()))?;

    // Prepend the nonce so callers only handle one opaque blob.
    let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&in_out);

    Ok(BASE64.encode(blob))
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Fails with [`OmniVaultError::Corrupt`] on bad base64, input shorter than
/// the nonce, or authentication failure (wrong key or tampered data).
pub fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|_| OmniVaultError::Corrupt("ciphertext is not valid base64".to_string()))?;

    if raw.len() < NONCE_LEN {
        return Err(OmniVaultError::Corrupt(
            "ciphertext shorter than nonce".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
    let nonce_arr: [u8; NONCE_LEN] = nonce_bytes
        .try_into()
        .map_err(|_| OmniVaultError::Corrupt("malformed nonce".to_string()))?;
    let nonce = Nonce::assume_unique_for_key(nonce_arr);

    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| OmniVaultError::Internal("failed to create AES-256-GCM key".to_string()))?;
    let less_safe = LessSafeKey::new(unbound);

    let mut in_out = ciphertext.to_vec();
    let plaintext = less_safe
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| {
            OmniVaultError::Corrupt(
                "AES-256-GCM authentication failed (wrong key or tampered data)".to_string(),
            )
        })?;

    Ok(plaintext.to_vec())
}

/// Generate `n` cryptographically secure random bytes.
///
/// Fails loudly if the system CSPRNG is unavailable; there is no fallback.
pub fn random_bytes(n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| OmniVaultError::Internal("failed to generate random bytes".to_string()))?;
    Ok(buf)
}

/// Constant-time equality for verification-blob checks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && ring::constant_time::verify_slices_are_equal(a, b).is_ok()
}
