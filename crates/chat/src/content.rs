//! Conversion of parsed attachments into multimodal user-message content.
//!
//! Uses the OpenAI chat-completions shape:
//! ```json
//! { "type": "text", "text": "..." }
//! { "type": "image_url", "image_url": { "url": "data:image/png;base64,..." } }
//! { "type": "input_audio", "input_audio": { "data": "...", "format": "mp3" } }
//! ```

use {
    ferry_media::MediaKind,
    serde::{Deserialize, Serialize},
};

use crate::attachments::{MediaBlock, ParsedMessage};

/// A single block of multimodal content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    InputAudio { input_audio: InputAudio },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudio {
    /// Base64 audio without a data URL prefix.
    pub data: String,
    /// Short format name, e.g. `mp3` or `wav`.
    pub format: String,
}

impl From<&MediaBlock> for ContentBlock {
    fn from(block: &MediaBlock) -> Self {
        match block.kind {
            MediaKind::Image => Self::ImageUrl {
                image_url: ImageUrl {
                    url: block.data_uri(),
                },
            },
            MediaKind::Audio => Self::InputAudio {
                input_audio: InputAudio {
                    data: block.data.clone(),
                    format: audio_format(&block.mime_type).to_string(),
                },
            },
        }
    }
}

fn audio_format(mime: &str) -> &str {
    match mime.strip_prefix("audio/").unwrap_or(mime) {
        "mpeg" | "mp3" => "mp3",
        "wav" | "wave" | "x-wav" => "wav",
        subtype => subtype,
    }
}

impl ParsedMessage {
    /// Text block (when the message is not blank) followed by one block per
    /// accepted attachment.
    pub fn to_content_blocks(&self) -> Vec<ContentBlock> {
        let text = (!self.message.trim().is_empty()).then(|| ContentBlock::Text {
            text: self.message.clone(),
        });
        text.into_iter()
            .chain(self.images.iter().map(ContentBlock::from))
            .collect()
    }
}
