use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be encoded for hashing.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
