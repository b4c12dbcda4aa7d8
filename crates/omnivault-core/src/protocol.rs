// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire protocol for daemon IPC.
//!
//! Request and response bodies exchanged between the daemon and the client
//! library, one struct per route. These shapes are a compatibility surface:
//! renaming a field here breaks every deployed client.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OmniVaultError;

/// Minimum master password length, enforced at the `/init` boundary
/// (and for the new password on `/change-password`), not inside the store.
pub const MIN_PASSWORD_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body for `POST /init`.
#[derive(Debug, Serialize, Deserialize)]
pub struct InitRequest {
    pub password: String,
}

/// Body for `POST /unlock`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub password: String,
}

/// Body for `POST /change-password`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Body for `PUT /secret/<path>`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SetSecretRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Body for `GET /status`. Always available, even while locked.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub locked: bool,
    pub vault_exists: bool,
    pub secret_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
    pub uptime: String,
}

/// Body for `GET /secret/<path>`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SecretResponse {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One entry in `GET /secrets` -- metadata only, no secret material.
#[derive(Debug, Serialize, Deserialize)]
pub struct SecretListItem {
    pub path: String,
    pub has_value: bool,
    pub has_fields: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for `GET /secrets`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub secrets: Vec<SecretListItem>,
    pub count: usize,
}

/// Generic success envelope for mutating routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl SuccessResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Error envelope returned on any non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Stable machine-readable error codes carried in [`ErrorBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    VaultLocked,
    VaultNotFound,
    SecretNotFound,
    InvalidPassword,
    InvalidRequest,
    InternalError,
    AlreadyExists,
}

impl ErrorCode {
    /// The wire representation, e.g. `VAULT_LOCKED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VaultLocked => "VAULT_LOCKED",
            Self::VaultNotFound => "VAULT_NOT_FOUND",
            Self::SecretNotFound => "SECRET_NOT_FOUND",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
            Self::AlreadyExists => "ALREADY_EXISTS",
        }
    }

    /// The HTTP status this code is served with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::VaultLocked => 403,
            Self::VaultNotFound | Self::SecretNotFound => 404,
            Self::InvalidPassword => 401,
            Self::InvalidRequest => 400,
            Self::InternalError => 500,
            Self::AlreadyExists => 409,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&OmniVaultError> for ErrorCode {
    fn from(err: &OmniVaultError) -> Self {
        match err {
            OmniVaultError::InvalidRequest(_) => Self::InvalidRequest,
            OmniVaultError::VaultNotFound => Self::VaultNotFound,
            OmniVaultError::AlreadyExists => Self::AlreadyExists,
            OmniVaultError::InvalidPassword => Self::InvalidPassword,
            OmniVaultError::VaultLocked => Self::VaultLocked,
            OmniVaultError::SecretNotFound(_) => Self::SecretNotFound,
            // Crypto and I/O failures are deliberately collapsed so the
            // error code never leaks which ciphertext failed to open.
            OmniVaultError::Corrupt(_)
            | OmniVaultError::Io(_)
            | OmniVaultError::Config(_)
            | OmniVaultError::Internal(_) => Self::InternalError,
        }
    }
}
