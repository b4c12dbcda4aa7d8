// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted secret store for OmniVault.
//!
//! The store keeps two JSON files on disk: a plaintext metadata file
//! (version, salt, Argon2id parameters, verification blob) and a data file
//! mapping secret paths to per-secret AES-256-GCM ciphertexts. The master
//! key is derived from the user's password with Argon2id, held only in
//! memory by a [`CryptoSession`], and zeroized on lock.
//!
//! Per-secret ciphertexts keep edits cheap (no full-vault rewrite per `set`)
//! and localize tamper damage to a single entry.

pub mod crypto;
pub mod format;
pub mod kdf;
pub mod session;
pub mod store;

pub use kdf::Argon2Params;
pub use session::CryptoSession;
pub use store::EncryptedStore;
