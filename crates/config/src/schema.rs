//! Config schema types.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    pub chat: ChatConfig,
}

impl FerryConfig {
    /// Check limits that would otherwise reject every request.
    pub fn validate(&self) -> Result<()> {
        self.chat.attachments.validate()
    }
}

/// Chat request handling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub attachments: AttachmentsConfig,
}

/// Limits applied to inline base64 attachments on `chat.send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentsConfig {
    /// Maximum decoded size of a single attachment. Default 5,000,000 bytes.
    pub max_bytes: usize,
    /// Maximum decoded size for the deprecated markdown embedding path.
    /// Default 2,000,000 bytes.
    pub legacy_max_bytes: usize,
    /// Base64 characters decoded from the start of a payload for MIME sniffing.
    pub sniff_prefix_chars: usize,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            max_bytes: 5_000_000,
            legacy_max_bytes: 2_000_000,
            sniff_prefix_chars: 5472,
        }
    }
}

impl AttachmentsConfig {
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("chat.attachments.max_bytes", self.max_bytes),
            ("chat.attachments.legacy_max_bytes", self.legacy_max_bytes),
            ("chat.attachments.sniff_prefix_chars", self.sniff_prefix_chars),
        ];
        match limits.into_iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(Error::ZeroLimit { field }),
            None => Ok(()),
        }
    }
}
