#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to decode base64 payload: {0}")]
    Decode(#[from] ::base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
