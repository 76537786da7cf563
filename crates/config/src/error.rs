use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
