//! MIME normalization, media classification and magic-number sniffing.
//!
//! Callers should trust the sniffed type over whatever the client declared:
//! the declared type is only a fallback when the bytes are not recognised.

use {
    async_trait::async_trait,
    image::ImageFormat,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::base64::decode_prefix;

/// Kind of media a content block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Classify a (normalized) MIME type. Anything that is not `image/*` or
    /// `audio/*` is not media.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if is_image_mime(mime) {
            Some(Self::Image)
        } else if is_audio_mime(mime) {
            Some(Self::Audio)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

pub fn is_audio_mime(mime: &str) -> bool {
    mime.starts_with("audio/")
}

/// Lowercase the `type/subtype` part and drop any `;parameter` suffix.
/// Returns `None` when nothing is left.
pub fn normalize_mime(mime: Option<&str>) -> Option<String> {
    let essence = mime?.split(';').next()?.trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}

/// Detect a MIME type from leading file bytes.
///
/// The `image` crate gets the first look so image types map the same way
/// the media pipeline decodes them; everything else (audio, video, archives,
/// documents) is left to `infer`.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if let Ok(format) = image::guess_format(bytes)
        && let Some(mime) = image_format_mime(format)
    {
        return Some(mime);
    }
    infer::get(bytes).map(|kind| kind.mime_type())
}

fn image_format_mime(format: ImageFormat) -> Option<&'static str> {
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Avif => "image/avif",
        ImageFormat::Qoi => "image/qoi",
        ImageFormat::OpenExr => "image/x-exr",
        ImageFormat::Hdr => "image/vnd.radiance",
        ImageFormat::Dds => "image/vnd-ms.dds",
        ImageFormat::Farbfeld => "image/x-farbfeld",
        _ => return None,
    };
    Some(mime)
}

/// Collaborator that infers a MIME type from a clean base64 payload.
#[async_trait]
pub trait MimeSniffer: Send + Sync {
    /// Returns `None` when the leading bytes are not recognised.
    async fn sniff_base64(&self, base64: &str) -> Option<String>;
}

/// Default sniffer: decodes a bounded prefix of the payload and matches
/// magic numbers with [`sniff_mime`].
#[derive(Debug, Clone)]
pub struct MagicSniffer {
    prefix_chars: usize,
}

impl MagicSniffer {
    /// 5472 base64 characters decode to 4104 bytes, which covers the
    /// container headers `infer` inspects.
    pub const DEFAULT_PREFIX_CHARS: usize = 5472;

    pub fn new() -> Self {
        Self {
            prefix_chars: Self::DEFAULT_PREFIX_CHARS,
        }
    }

    #[must_use]
    pub fn with_prefix_chars(mut self, prefix_chars: usize) -> Self {
        self.prefix_chars = prefix_chars;
        self
    }
}

impl Default for MagicSniffer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MimeSniffer for MagicSniffer {
    async fn sniff_base64(&self, base64: &str) -> Option<String> {
        match decode_prefix(base64, self.prefix_chars) {
            Ok(bytes) => sniff_mime(&bytes).map(str::to_owned),
            Err(e) => {
                debug!(error = %e, "mime sniff skipped, payload prefix does not decode");
                None
            },
        }
    }
}
