//! Media helpers for inbound attachments: base64 structure checks, decoded size
//! estimation, MIME normalization and magic-number sniffing.

pub mod base64;
pub mod error;
pub mod mime;

pub use {
    error::{Error, Result},
    mime::{MagicSniffer, MediaKind, MimeSniffer},
};
