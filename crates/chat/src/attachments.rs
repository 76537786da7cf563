//! Inline attachment parsing for chat messages.
//!
//! Clients send attachments as base64 strings (optionally wrapped in a data
//! URL) together with a claimed MIME type. Each one is validated, sniffed and
//! turned into a [`MediaBlock`]. Structural problems reject the request;
//! attachments that simply are not image or audio are dropped with a warning
//! and reported in [`ParsedMessage::skipped`].

use std::sync::Arc;

use {
    ferry_config::AttachmentsConfig,
    ferry_media::{
        MagicSniffer, MediaKind, MimeSniffer,
        base64::{estimate_base64_decoded_bytes, is_valid_base64, strip_data_url, strip_whitespace},
        mime::normalize_mime,
    },
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use crate::{Error, Result};

/// MIME types downstream providers accept natively.
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "audio/mpeg",
    "audio/ogg",
    "audio/wav",
    "audio/webm",
];

/// An attachment as sent by a client.
///
/// `content` is left untyped so that a non-string payload can be reported
/// with the attachment's label instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAttachment {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

impl ChatAttachment {
    /// Attachment with string content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(serde_json::Value::String(content.into())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Name used in errors and warnings: file name, then type, then
    /// `attachment-{n}` (1-based). Empty strings are ignored.
    pub fn label(&self, index: usize) -> String {
        [self.file_name.as_deref(), self.kind.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .map_or_else(|| format!("attachment-{}", index + 1), str::to_owned)
    }

    pub(crate) fn content_str(&self) -> Option<&str> {
        self.content.as_ref().and_then(serde_json::Value::as_str)
    }
}

/// A validated media content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBlock {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub mime_type: String,
    /// Base64 payload without whitespace or data URL prefix.
    pub data: String,
}

impl MediaBlock {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Whether the MIME type is one providers accept without conversion.
    pub fn is_supported_media_type(&self) -> bool {
        SUPPORTED_MEDIA_TYPES.contains(&self.mime_type.as_str())
    }
}

/// Why an attachment was dropped without failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The bytes were recognised, but not as image or audio.
    NonMedia { sniffed: String },
    /// The bytes were not recognised and the declared type is not media.
    UndetectedMime,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonMedia { sniffed } => write!(f, "detected non-media ({sniffed})"),
            Self::UndetectedMime => f.write_str("unable to detect valid media mime type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAttachment {
    /// Position in the request's attachment list.
    pub index: usize,
    pub label: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Message text plus the media blocks extracted from its attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// The original message, untouched.
    pub message: String,
    /// Accepted attachments in request order.
    pub images: Vec<MediaBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedAttachment>,
}

impl ParsedMessage {
    fn text_only(message: &str) -> Self {
        Self {
            message: message.to_string(),
            ..Self::default()
        }
    }
}

/// Optional sink for attachment warnings, e.g. a per-connection log.
///
/// Warnings always go to `tracing` as well.
pub trait AttachmentLog: Send + Sync {
    fn warn(&self, message: &str);
}

/// Validates and classifies chat attachments.
#[derive(Clone)]
pub struct AttachmentParser {
    max_bytes: usize,
    sniffer: Arc<dyn MimeSniffer>,
    log: Option<Arc<dyn AttachmentLog>>,
}

impl std::fmt::Debug for AttachmentParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentParser")
            .field("max_bytes", &self.max_bytes)
            .field("has_log", &self.log.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for AttachmentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentParser {
    /// Decoded bytes allowed per attachment unless configured otherwise.
    pub const DEFAULT_MAX_BYTES: usize = 5_000_000;

    pub fn new() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            sniffer: Arc::new(MagicSniffer::new()),
            log: None,
        }
    }

    pub fn from_config(config: &AttachmentsConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            sniffer: Arc::new(MagicSniffer::new().with_prefix_chars(config.sniff_prefix_chars)),
            log: None,
        }
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn with_sniffer(mut self, sniffer: Arc<dyn MimeSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn AttachmentLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Parse `attachments` into media blocks, returning `message` verbatim.
    ///
    /// Attachments are processed one at a time in order. `None` entries are
    /// ignored. The first non-string, malformed or oversized payload aborts
    /// the call.
    pub async fn parse(
        &self,
        message: &str,
        attachments: &[Option<ChatAttachment>],
    ) -> Result<ParsedMessage> {
        let mut parsed = ParsedMessage::text_only(message);
        if attachments.is_empty() {
            return Ok(parsed);
        }

        for (index, attachment) in attachments.iter().enumerate() {
            let Some(attachment) = attachment else {
                continue;
            };
            let label = attachment.label(index);

            let Some(content) = attachment.content_str() else {
                return Err(Error::NonStringContent { label });
            };
            let b64 = strip_whitespace(strip_data_url(content.trim()));
            if !is_valid_base64(&b64) {
                return Err(Error::InvalidBase64 { label });
            }
            let size = estimate_base64_decoded_bytes(&b64);
            if size == 0 || size > self.max_bytes {
                return Err(Error::SizeLimit {
                    label,
                    size,
                    max: self.max_bytes,
                });
            }

            let declared = attachment.mime_type.as_deref().unwrap_or_default();
            let provided = normalize_mime(Some(declared));
            let sniffed = normalize_mime(self.sniffer.sniff_base64(&b64).await.as_deref());
            let effective = sniffed
                .as_deref()
                .or(provided.as_deref())
                .unwrap_or(declared)
                .to_string();

            let Some(kind) = MediaKind::from_mime(&effective) else {
                let reason = match sniffed {
                    Some(sniffed) => SkipReason::NonMedia { sniffed },
                    None => SkipReason::UndetectedMime,
                };
                self.warn(index, &format!("attachment {label}: {reason}, dropping"));
                parsed.skipped.push(SkippedAttachment {
                    index,
                    label,
                    reason,
                });
                continue;
            };

            if let (Some(sniffed), Some(provided)) = (&sniffed, &provided)
                && sniffed != provided
            {
                self.warn(
                    index,
                    &format!("attachment {label}: mime mismatch ({provided} -> {sniffed}), using sniffed"),
                );
            }

            debug!(index, %kind, mime = %effective, size, "accepted attachment");
            parsed.images.push(MediaBlock {
                kind,
                mime_type: effective,
                data: b64,
            });
        }

        Ok(parsed)
    }

    fn warn(&self, index: usize, message: &str) {
        warn!(index, "{message}");
        if let Some(log) = &self.log {
            log.warn(message);
        }
    }
}

/// Per-call overrides for [`parse_message_with_attachments`].
#[derive(Clone, Default)]
pub struct ParseOptions {
    /// Decoded byte ceiling; defaults to [`AttachmentParser::DEFAULT_MAX_BYTES`].
    pub max_bytes: Option<usize>,
    pub log: Option<Arc<dyn AttachmentLog>>,
}

/// Parse attachments with the default magic-number sniffer.
pub async fn parse_message_with_attachments(
    message: &str,
    attachments: &[Option<ChatAttachment>],
    opts: ParseOptions,
) -> Result<ParsedMessage> {
    let mut parser = AttachmentParser::new();
    if let Some(max_bytes) = opts.max_bytes {
        parser = parser.with_max_bytes(max_bytes);
    }
    if let Some(log) = opts.log {
        parser = parser.with_log(log);
    }
    parser.parse(message, attachments).await
}
