// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The encrypted store: vault lifecycle and secret CRUD.
//!
//! One [`EncryptedStore`] owns one vault (a metadata file and a data file)
//! plus the in-memory [`CryptoSession`]. All interior state sits behind a
//! single `RwLock`: reads (`get`, `exists`, `list`, `secret_count`) share
//! the lock, everything touching session state takes it exclusively. The
//! locked-state check always happens under the guard, so it cannot race
//! with a concurrent `lock()`.
//!
//! Argon2id work (unlock, password verification, re-keying) runs *before*
//! the write guard is taken -- derivation takes hundreds of milliseconds and
//! must not starve readers.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{debug, info};

use omnivault_core::{OmniVaultError, Result, Secret};

use crate::format::{self, VaultData, VaultMeta, CURRENT_VERSION};
use crate::kdf::Argon2Params;
use crate::session::CryptoSession;

/// File-backed encrypted secret store.
pub struct EncryptedStore {
    vault_path: PathBuf,
    meta_path: PathBuf,
    default_params: Argon2Params,
    inner: RwLock<StoreInner>,
}

/// State guarded by the store lock. `session`/`data` are `Some` exactly
/// while the vault is unlocked. Metadata is never cached: `unlock` and
/// `change_password` read it from disk, which stays authoritative.
struct StoreInner {
    session: Option<CryptoSession>,
    data: Option<VaultData>,
    dirty: bool,
    auto_save: bool,
    unlocked_at: Option<DateTime<Utc>>,
}

impl EncryptedStore {
    /// Create a store handle for the given file pair. No I/O happens until
    /// `init` or `unlock`.
    pub fn new(vault_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>) -> Self {
        Self::with_argon2_params(vault_path, meta_path, Argon2Params::default())
    }

    /// Like [`new`](Self::new) but with explicit Argon2id parameters for
    /// newly created or re-keyed vaults. Tests use low-cost parameters;
    /// existing vaults always unlock with the parameters stored in their
    /// metadata.
    pub fn with_argon2_params(
        vault_path: impl Into<PathBuf>,
        meta_path: impl Into<PathBuf>,
        params: Argon2Params,
    ) -> Self {
        Self {
            vault_path: vault_path.into(),
            meta_path: meta_path.into(),
            default_params: params,
            inner: RwLock::new(StoreInner {
                session: None,
                data: None,
                dirty: false,
                auto_save: true,
                unlocked_at: None,
            }),
        }
    }

    /// Whether a vault has been initialized on disk.
    pub fn vault_exists(&self) -> bool {
        self.meta_path.exists()
    }

    /// When auto-save is on (the default), every mutation persists the data
    /// file immediately. With it off, writes accumulate in memory and reach
    /// disk on the next save or on `lock()`.
    pub async fn set_auto_save(&self, on: bool) {
        self.inner.write().await.auto_save = on;
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a new vault protected by `password`, leaving it unlocked.
    ///
    /// Generates a fresh random salt, derives the master key, encrypts the
    /// verification magic, and writes both vault files.
    pub async fn init(&self, password: &SecretString) -> Result<()> {
        // Cheap existence check before burning KDF time; re-checked under
        // the guard below.
        if self.vault_exists() {
            return Err(OmniVaultError::AlreadyExists);
        }

        let mut session = CryptoSession::new(None, self.default_params)?;
        session.unlock(password)?;
        let verification = session.create_verification_blob()?;

        let meta = VaultMeta {
            version: CURRENT_VERSION,
            created_at: Utc::now(),
            salt: session.salt().to_vec(),
            argon2_params: *session.params(),
            verification,
        };

        let mut guard = self.inner.write().await;
        if self.vault_exists() {
            return Err(OmniVaultError::AlreadyExists);
        }

        format::write_meta(&self.meta_path, &meta)?;
        let data = VaultData::default();
        format::write_data(&self.vault_path, &data)?;

        guard.session = Some(session);
        guard.data = Some(data);
        guard.dirty = false;
        guard.unlocked_at = Some(Utc::now());

        info!(path = %self.meta_path.display(), "vault initialized");
        Ok(())
    }

    /// Unlock the vault with the master password.
    ///
    /// Verifies the password against the stored verification blob before
    /// installing the session; a wrong password leaves the store locked
    /// with no state mutated.
    pub async fn unlock(&self, password: &SecretString) -> Result<()> {
        let meta = format::read_meta(&self.meta_path)?;

        let mut session = CryptoSession::new(Some(meta.salt.clone()), meta.argon2_params)?;
        if !session.verify_password(password, &meta.verification) {
            return Err(OmniVaultError::InvalidPassword);
        }
        session.unlock(password)?;

        // A data-file failure here drops the session; the key zeroizes on
        // drop and the store stays locked.
        let data = format::read_data(&self.vault_path)?;

        let mut guard = self.inner.write().await;
        guard.session = Some(session);
        guard.data = Some(data);
        guard.dirty = false;
        guard.unlocked_at = Some(Utc::now());

        info!("vault unlocked");
        Ok(())
    }

    /// Lock the vault: persist pending writes, zeroize the key, and drop
    /// decrypted state. Idempotent.
    pub async fn lock(&self) -> Result<()> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        if inner.session.is_none() {
            return Ok(());
        }

        // Pending writes must not be lost; a save failure leaves the vault
        // unlocked so the caller can retry.
        if inner.dirty {
            if let Some(data) = &inner.data {
                format::write_data(&self.vault_path, data)?;
            }
            inner.dirty = false;
        }

        if let Some(mut session) = inner.session.take() {
            session.lock();
        }
        inner.data = None;
        inner.unlocked_at = None;

        info!("vault locked");
        Ok(())
    }

    /// Whether the vault is currently locked.
    pub async fn is_locked(&self) -> bool {
        let guard = self.inner.read().await;
        !guard.session.as_ref().is_some_and(CryptoSession::is_unlocked)
    }

    /// When the vault was last unlocked, if it currently is.
    pub async fn unlocked_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.unlocked_at
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Decrypt and return the secret stored under `path`.
    ///
    /// The returned [`Secret`] is an owned deep copy; callers never alias
    /// the store's internal state.
    pub async fn get(&self, path: &str) -> Result<Secret> {
        let guard = self.inner.read().await;
        let (session, data) = unlocked_state(&guard)?;

        let blob = data
            .secrets
            .get(path)
            .ok_or_else(|| OmniVaultError::SecretNotFound(path.to_string()))?;

        let json = session.decrypt_string(blob)?;
        let secret: Secret = serde_json::from_str(&json)
            .map_err(|e| OmniVaultError::Corrupt(format!("secret payload: {e}")))?;

        debug!(path = %path, "secret read");
        Ok(secret)
    }

    /// Encrypt and store `secret` under `path`, creating or replacing.
    ///
    /// `created_at` is stamped on first insert and preserved across
    /// updates; `modified_at` is refreshed on every write.
    pub async fn set(&self, path: &str, mut secret: Secret) -> Result<()> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let (session, data) = unlocked_state_mut(inner.session.as_ref(), inner.data.as_mut())?;

        let now = Utc::now();
        let existing_created_at = data
            .secrets
            .get(path)
            .and_then(|blob| session.decrypt_string(blob).ok())
            .and_then(|json| serde_json::from_str::<Secret>(&json).ok())
            .and_then(|existing| existing.metadata.created_at);

        secret.metadata.created_at = existing_created_at
            .or(secret.metadata.created_at)
            .or(Some(now));
        secret.metadata.modified_at = Some(now);

        let json = serde_json::to_string(&secret)
            .map_err(|e| OmniVaultError::Internal(format!("serialize secret: {e}")))?;
        let blob = session.encrypt_string(&json)?;

        data.secrets.insert(path.to_string(), blob);
        inner.dirty = true;

        if inner.auto_save {
            format::write_data(&self.vault_path, data)?;
            inner.dirty = false;
        }

        debug!(path = %path, "secret stored");
        Ok(())
    }

    /// Remove the secret under `path`. Removing a missing path is not an
    /// error.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let (_, data) = unlocked_state_mut(inner.session.as_ref(), inner.data.as_mut())?;

        data.secrets.remove(path);
        inner.dirty = true;

        if inner.auto_save {
            format::write_data(&self.vault_path, data)?;
            inner.dirty = false;
        }

        debug!(path = %path, "secret deleted");
        Ok(())
    }

    /// Whether a secret exists under `path`. Pure lookup, no decryption.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let guard = self.inner.read().await;
        let (_, data) = unlocked_state(&guard)?;
        Ok(data.secrets.contains_key(path))
    }

    /// All secret paths starting with `prefix` (byte prefix; empty lists
    /// everything), sorted.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let guard = self.inner.read().await;
        let (_, data) = unlocked_state(&guard)?;

        // BTreeMap iteration is already sorted.
        Ok(data
            .secrets
            .keys()
            .filter(|path| prefix.is_empty() || path.starts_with(prefix))
            .cloned()
            .collect())
    }

    /// Number of stored secrets. Returns 0 while locked (no data loaded).
    pub async fn secret_count(&self) -> usize {
        let guard = self.inner.read().await;
        guard.data.as_ref().map_or(0, |d| d.secrets.len())
    }

    // ------------------------------------------------------------------
    // Re-keying
    // ------------------------------------------------------------------

    /// Change the master password, re-encrypting every secret.
    ///
    /// Works whether the vault is locked or unlocked: the old password is
    /// verified against the verification blob and a temporary old-key
    /// session drives decryption. The complete re-encrypted map is built
    /// first; only then are metadata and data rewritten and the in-memory
    /// session swapped. On any failure the previous session and files stay
    /// authoritative. A locked vault stays locked afterwards.
    pub async fn change_password(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<()> {
        let meta = format::read_meta(&self.meta_path)?;

        // Temporary session holding the old key (zeroized on drop).
        let mut old_session = CryptoSession::new(Some(meta.salt.clone()), meta.argon2_params)?;
        if !old_session.verify_password(old_password, &meta.verification) {
            return Err(OmniVaultError::InvalidPassword);
        }
        old_session.unlock(old_password)?;

        // New session with a fresh salt and the current default parameters.
        let mut new_session = CryptoSession::new(None, self.default_params)?;
        new_session.unlock(new_password)?;
        let verification = new_session.create_verification_blob()?;

        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        // Unlocked: in-memory data is authoritative (it may be dirty).
        // Locked: read the data file directly.
        let source = match &inner.data {
            Some(data) => data.clone(),
            None => format::read_data(&self.vault_path)?,
        };

        let mut reencrypted = VaultData::default();
        for (path, blob) in &source.secrets {
            let plaintext = old_session.decrypt_bytes(blob).map_err(|_| {
                OmniVaultError::Corrupt(format!("failed to re-encrypt secret '{path}'"))
            })?;
            reencrypted
                .secrets
                .insert(path.clone(), new_session.encrypt_bytes(&plaintext)?);
        }

        let new_meta = VaultMeta {
            version: meta.version,
            created_at: meta.created_at,
            salt: new_session.salt().to_vec(),
            argon2_params: *new_session.params(),
            verification,
        };

        format::write_meta(&self.meta_path, &new_meta)?;
        format::write_data(&self.vault_path, &reencrypted)?;

        old_session.lock();
        if inner.session.is_some() {
            if let Some(mut previous) = inner.session.take() {
                previous.lock();
            }
            inner.session = Some(new_session);
            inner.data = Some(reencrypted);
            inner.dirty = false;
        } else {
            // Vault was locked; the new key must not linger.
            new_session.lock();
        }

        info!("master password changed");
        Ok(())
    }
}

/// Shared-guard accessor: session + data, or `VaultLocked`.
fn unlocked_state(inner: &StoreInner) -> Result<(&CryptoSession, &VaultData)> {
    let session = inner
        .session
        .as_ref()
        .filter(|s| s.is_unlocked())
        .ok_or(OmniVaultError::VaultLocked)?;
    let data = inner.data.as_ref().ok_or(OmniVaultError::VaultLocked)?;
    Ok((session, data))
}

/// Exclusive-guard accessor taking split borrows so the caller can keep
/// mutating the rest of `StoreInner`.
fn unlocked_state_mut<'a>(
    session: Option<&'a CryptoSession>,
    data: Option<&'a mut VaultData>,
) -> Result<(&'a CryptoSession, &'a mut VaultData)> {
    let session = session
        .filter(|s| s.is_unlocked())
        .ok_or(OmniVaultError::VaultLocked)?;
    let data = data.ok_or(OmniVaultError::VaultLocked)?;
    Ok((session, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use tempfile::{tempdir, TempDir};

    fn test_params() -> Argon2Params {
        Argon2Params {
            time: 1,
            memory: 8_192,
            threads: 1,
            key_len: 32,
        }
    }

    fn test_store() -> (EncryptedStore, TempDir) {
        let dir = tempdir().unwrap();
        let store = EncryptedStore::with_argon2_params(
            dir.path().join("vault.enc"),
            dir.path().join("vault.meta"),
            test_params(),
        );
        (store, dir)
    }

    fn reopen(dir: &TempDir) -> EncryptedStore {
        EncryptedStore::with_argon2_params(
            dir.path().join("vault.enc"),
            dir.path().join("vault.meta"),
            test_params(),
        )
    }

    fn pw(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn init_set_get_roundtrip() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        assert!(!store.is_locked().await);

        store
            .set("db/pw", Secret::with_value("s3cret"))
            .await
            .unwrap();

        let secret = store.get("db/pw").await.unwrap();
        assert_eq!(secret.value.as_deref(), Some("s3cret"));
        assert!(secret.metadata.created_at.is_some());
        assert!(secret.metadata.modified_at.is_some());
        assert_eq!(store.secret_count().await, 1);
    }

    #[tokio::test]
    async fn init_on_existing_vault_fails() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();

        let result = store.init(&pw("another")).await;
        assert!(matches!(result, Err(OmniVaultError::AlreadyExists)));
    }

    #[tokio::test]
    async fn unlock_missing_vault_fails() {
        let (store, _dir) = test_store();
        let result = store.unlock(&pw("anything")).await;
        assert!(matches!(result, Err(OmniVaultError::VaultNotFound)));
    }

    #[tokio::test]
    async fn lock_then_unlock_restores_secrets() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store
            .set("db/pw", Secret::with_value("s3cret"))
            .await
            .unwrap();

        store.lock().await.unwrap();
        assert!(store.is_locked().await);
        assert!(matches!(
            store.get("db/pw").await,
            Err(OmniVaultError::VaultLocked)
        ));
        assert_eq!(store.secret_count().await, 0);

        store.unlock(&pw("correcthorse")).await.unwrap();
        let secret = store.get("db/pw").await.unwrap();
        assert_eq!(secret.value.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn wrong_password_leaves_store_locked() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.lock().await.unwrap();

        let result = store.unlock(&pw("wronghorse")).await;
        assert!(matches!(result, Err(OmniVaultError::InvalidPassword)));
        assert!(store.is_locked().await);
        assert!(store.unlocked_at().await.is_none());
    }

    #[tokio::test]
    async fn lock_is_idempotent() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.lock().await.unwrap();
        store.lock().await.unwrap();
        assert!(store.is_locked().await);
    }

    #[tokio::test]
    async fn created_at_is_stable_across_updates() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();

        store.set("k", Secret::with_value("v1")).await.unwrap();
        let first = store.get("k").await.unwrap();

        store.set("k", Secret::with_value("v2")).await.unwrap();
        let second = store.get("k").await.unwrap();

        assert_eq!(second.value.as_deref(), Some("v2"));
        assert_eq!(second.metadata.created_at, first.metadata.created_at);
        assert!(second.metadata.modified_at >= first.metadata.modified_at);
    }

    #[tokio::test]
    async fn list_filters_by_prefix_and_sorts() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();

        for path in ["b/1", "a/2", "a/1"] {
            store.set(path, Secret::with_value("x")).await.unwrap();
        }
        // Re-inserting must not create duplicates.
        store.set("a/1", Secret::with_value("y")).await.unwrap();

        assert_eq!(store.list("a/").await.unwrap(), vec!["a/1", "a/2"]);
        assert_eq!(store.list("").await.unwrap(), vec!["a/1", "a/2", "b/1"]);
        assert!(store.list("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_and_tolerates_missing() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.set("k", Secret::with_value("v")).await.unwrap();

        store.delete("k").await.unwrap();
        assert!(!store.exists("k").await.unwrap());
        assert!(matches!(
            store.get("k").await,
            Err(OmniVaultError::SecretNotFound(_))
        ));

        // Deleting again is fine.
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn binary_secret_round_trips() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();

        let secret = Secret {
            value_bytes: Some(vec![0x00, 0xFF, 0x10, 0x80]),
            ..Secret::default()
        };
        store.set("bin", secret).await.unwrap();

        let loaded = store.get("bin").await.unwrap();
        assert_eq!(loaded.value_bytes.as_deref(), Some(&[0x00, 0xFF, 0x10, 0x80][..]));
    }

    #[tokio::test]
    async fn secrets_survive_process_restart() {
        let (store, dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.set("k", Secret::with_value("v")).await.unwrap();
        store.lock().await.unwrap();
        drop(store);

        let store2 = reopen(&dir);
        assert!(store2.vault_exists());
        store2.unlock(&pw("correcthorse")).await.unwrap();
        assert_eq!(store2.get("k").await.unwrap().value.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn auto_save_off_defers_until_lock() {
        let (store, dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.set_auto_save(false).await;
        store.set("k", Secret::with_value("v")).await.unwrap();

        // Nothing on disk yet: a second instance sees an empty vault.
        let observer = reopen(&dir);
        observer.unlock(&pw("correcthorse")).await.unwrap();
        assert_eq!(observer.secret_count().await, 0);

        // Lock persists the pending write.
        store.lock().await.unwrap();
        let observer2 = reopen(&dir);
        observer2.unlock(&pw("correcthorse")).await.unwrap();
        assert_eq!(
            observer2.get("k").await.unwrap().value.as_deref(),
            Some("v")
        );
    }

    #[tokio::test]
    async fn tampered_ciphertext_never_decrypts() {
        let (store, dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.set("k", Secret::with_value("v")).await.unwrap();
        store.lock().await.unwrap();

        // Flip one bit of the stored blob.
        let data_path = dir.path().join("vault.enc");
        let mut json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&data_path).unwrap()).unwrap();
        let blob = json["secrets"]["k"].as_str().unwrap();
        let mut raw = BASE64.decode(blob).unwrap();
        raw[4] ^= 0x01;
        json["secrets"]["k"] = serde_json::Value::String(BASE64.encode(&raw));
        std::fs::write(&data_path, serde_json::to_vec(&json).unwrap()).unwrap();

        store.unlock(&pw("correcthorse")).await.unwrap();
        assert!(matches!(
            store.get("k").await,
            Err(OmniVaultError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn stale_temp_file_never_shadows_vault() {
        let (store, dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.set("k", Secret::with_value("v")).await.unwrap();

        // Simulate a crash between serialize and rename.
        std::fs::write(dir.path().join(".vault.enc.tmp"), b"half-written").unwrap();

        store.lock().await.unwrap();
        store.unlock(&pw("correcthorse")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().value.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn change_password_reencrypts_everything() {
        let (store, dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.set("db/pw", Secret::with_value("s3cret")).await.unwrap();
        store.set("api/key", Secret::with_value("k123")).await.unwrap();

        let meta_before = format::read_meta(&dir.path().join("vault.meta")).unwrap();

        store
            .change_password(&pw("correcthorse"), &pw("tr0ub4dor"))
            .await
            .unwrap();

        // Still unlocked with the new session; reads keep working.
        assert_eq!(
            store.get("db/pw").await.unwrap().value.as_deref(),
            Some("s3cret")
        );

        // Fresh salt was generated.
        let meta_after = format::read_meta(&dir.path().join("vault.meta")).unwrap();
        assert_ne!(meta_before.salt, meta_after.salt);

        // Old password no longer unlocks; new one does.
        store.lock().await.unwrap();
        assert!(matches!(
            store.unlock(&pw("correcthorse")).await,
            Err(OmniVaultError::InvalidPassword)
        ));
        store.unlock(&pw("tr0ub4dor")).await.unwrap();
        assert_eq!(
            store.get("api/key").await.unwrap().value.as_deref(),
            Some("k123")
        );
    }

    #[tokio::test]
    async fn change_password_with_wrong_old_changes_nothing() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.set("k", Secret::with_value("v")).await.unwrap();

        let result = store.change_password(&pw("wronghorse"), &pw("new")).await;
        assert!(matches!(result, Err(OmniVaultError::InvalidPassword)));

        // Old password still works after a lock cycle.
        store.lock().await.unwrap();
        store.unlock(&pw("correcthorse")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().value.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn change_password_while_locked_keeps_vault_locked() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.set("k", Secret::with_value("v")).await.unwrap();
        store.lock().await.unwrap();

        store
            .change_password(&pw("correcthorse"), &pw("tr0ub4dor"))
            .await
            .unwrap();
        assert!(store.is_locked().await);

        store.unlock(&pw("tr0ub4dor")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().value.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn mutating_ops_while_locked_fail() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        store.lock().await.unwrap();

        assert!(matches!(
            store.set("k", Secret::with_value("v")).await,
            Err(OmniVaultError::VaultLocked)
        ));
        assert!(matches!(
            store.delete("k").await,
            Err(OmniVaultError::VaultLocked)
        ));
        assert!(matches!(
            store.exists("k").await,
            Err(OmniVaultError::VaultLocked)
        ));
        assert!(matches!(
            store.list("").await,
            Err(OmniVaultError::VaultLocked)
        ));
    }

    #[tokio::test]
    async fn concurrent_readers_share_the_lock() {
        let (store, _dir) = test_store();
        store.init(&pw("correcthorse")).await.unwrap();
        for i in 0..8 {
            store
                .set(&format!("k/{i}"), Secret::with_value(format!("v{i}")))
                .await
                .unwrap();
        }

        let store = std::sync::Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.get(&format!("k/{i}")).await.unwrap()
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let secret = handle.await.unwrap();
            assert_eq!(secret.value.as_deref(), Some(format!("v{i}").as_str()));
        }
    }
}
