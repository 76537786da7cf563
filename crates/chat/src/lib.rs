//! Chat attachment handling for the gateway's `chat.send` path.
//!
//! [`AttachmentParser`] turns inline base64 uploads into typed media blocks;
//! [`build_message_with_attachments`] is the older markdown embedding kept
//! for callers that have not migrated.

pub mod attachments;
pub mod content;
pub mod embed;
pub mod error;

#[allow(deprecated)]
pub use embed::{build_message_with_attachments, build_message_with_config};
pub use {
    attachments::{
        AttachmentLog, AttachmentParser, ChatAttachment, MediaBlock, ParseOptions, ParsedMessage,
        SkipReason, SkippedAttachment, parse_message_with_attachments,
    },
    content::{ContentBlock, ImageUrl, InputAudio},
    error::{Error, Result},
    ferry_media::MediaKind,
};
