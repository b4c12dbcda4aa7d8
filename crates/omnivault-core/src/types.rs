// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The [`Secret`] domain model.
//!
//! A secret is a logical record keyed by a UTF-8 path. It carries a primary
//! string value, an optional binary value (which takes precedence when both
//! are present), named sub-fields for multi-field records, and metadata.
//!
//! The serialized form uses camelCase field names and base64 for the binary
//! value; this is the exact JSON that gets encrypted into the vault, so the
//! names are part of the on-disk format.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored secret: primary value, optional extra fields, and metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Secret {
    /// The primary secret value as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// The secret value as raw bytes, for binary secrets.
    /// Takes precedence over `value` when both are set.
    #[serde(with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub value_bytes: Option<Vec<u8>>,

    /// Additional named fields for multi-field secrets
    /// (username/password/host and the like).
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,

    /// Timestamps and tags.
    pub metadata: Metadata,
}

impl Secret {
    /// Create a secret holding a single string value.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// The primary value, with `value_bytes` taking precedence.
    ///
    /// Binary values are converted lossily; callers that need the raw bytes
    /// should use [`primary_bytes`](Self::primary_bytes).
    pub fn primary_value(&self) -> Option<String> {
        match &self.value_bytes {
            Some(bytes) if !bytes.is_empty() => {
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
            _ => self.value.clone(),
        }
    }

    /// The primary value as bytes, with `value_bytes` taking precedence.
    pub fn primary_bytes(&self) -> Option<Vec<u8>> {
        match &self.value_bytes {
            Some(bytes) if !bytes.is_empty() => Some(bytes.clone()),
            _ => self.value.as_ref().map(|v| v.as_bytes().to_vec()),
        }
    }

    /// Look up a named field. An empty name or `"value"` falls back to the
    /// primary value.
    pub fn get_field(&self, name: &str) -> Option<String> {
        if name.is_empty() || name == "value" {
            return self.primary_value();
        }
        self.fields.get(name).cloned()
    }

    /// Set a named field. An empty name or `"value"` sets the primary value.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        if name.is_empty() || name == "value" {
            self.value = Some(value.into());
            return;
        }
        self.fields.insert(name.to_string(), value.into());
    }

    /// Whether this secret carries a primary value (string or bytes).
    pub fn has_value(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !v.is_empty())
            || self.value_bytes.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Whether this secret carries any named fields.
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// Timestamps and tags attached to a secret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    /// When the secret was first inserted. Set once, never updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the secret was last written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    /// Key-value tags for categorization.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

/// Serde adapter: `Option<Vec<u8>>` as a base64 string in JSON.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(b) => serializer.serialize_str(&BASE64.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(s) => BASE64
                .decode(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
