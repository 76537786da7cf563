use thiserror::Error;

/// Fatal attachment errors. Any of these rejects the whole request.
#[derive(Debug, Error)]
pub enum Error {
    #[error("attachment {label}: content must be base64 string")]
    NonStringContent { label: String },

    #[error("attachment {label}: invalid base64 content")]
    InvalidBase64 { label: String },

    #[error("attachment {label}: exceeds size limit ({size} > {max} bytes)")]
    SizeLimit {
        label: String,
        size: usize,
        max: usize,
    },

    #[error("attachment {label}: only image/* supported")]
    UnsupportedMime { label: String },
}

impl Error {
    /// Display label of the attachment that failed.
    pub fn label(&self) -> &str {
        match self {
            Self::NonStringContent { label }
            | Self::InvalidBase64 { label }
            | Self::SizeLimit { label, .. }
            | Self::UnsupportedMime { label } => label,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
