// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side error types.

use thiserror::Error;

use omnivault_core::protocol::ErrorCode;

/// Errors returned by [`Client`](crate::Client) methods.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the daemon endpoint at all.
    #[error("daemon unreachable: {0}")]
    Connect(String),

    /// The request was sent but transport or decoding failed.
    #[error("request failed: {0}")]
    Transport(String),

    /// The daemon answered with a structured error body.
    #[error(transparent)]
    Daemon(#[from] DaemonError),
}

impl ClientError {
    /// The structured daemon error, if that is what this is.
    pub fn as_daemon(&self) -> Option<&DaemonError> {
        match self {
            Self::Daemon(err) => Some(err),
            _ => None,
        }
    }
}

/// A structured error from the daemon: HTTP status, machine-readable code,
/// and human-readable message.
#[derive(Debug, Clone)]
pub struct DaemonError {
    pub status: u16,
    pub code: Option<ErrorCode>,
    pub message: String,
}

impl std::error::Error for DaemonError {}

impl std::fmt::Display for DaemonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl DaemonError {
    /// The vault is locked.
    pub fn is_locked(&self) -> bool {
        self.code == Some(ErrorCode::VaultLocked)
    }

    /// The secret or the vault itself was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            Some(ErrorCode::SecretNotFound) | Some(ErrorCode::VaultNotFound)
        )
    }

    /// The supplied master password was wrong.
    pub fn is_invalid_password(&self) -> bool {
        self.code == Some(ErrorCode::InvalidPassword)
    }

    /// A vault already exists (returned by `init`).
    pub fn is_already_exists(&self) -> bool {
        self.code == Some(ErrorCode::AlreadyExists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daemon_error(code: ErrorCode) -> DaemonError {
        DaemonError {
            status: code.http_status(),
            code: Some(code),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn predicates_match_their_codes() {
        assert!(daemon_error(ErrorCode::VaultLocked).is_locked());
        assert!(daemon_error(ErrorCode::SecretNotFound).is_not_found());
        assert!(daemon_error(ErrorCode::VaultNotFound).is_not_found());
        assert!(daemon_error(ErrorCode::InvalidPassword).is_invalid_password());
        assert!(daemon_error(ErrorCode::AlreadyExists).is_already_exists());
        assert!(!daemon_error(ErrorCode::VaultLocked).is_not_found());
    }

    #[test]
    fn display_includes_code_when_present() {
        let err = daemon_error(ErrorCode::VaultLocked);
        assert_eq!(err.to_string(), "VAULT_LOCKED: boom");

        let bare = DaemonError {
            status: 500,
            code: None,
            message: "boom".to_string(),
        };
        assert_eq!(bare.to_string(), "boom");
    }
}
