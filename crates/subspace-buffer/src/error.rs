use thiserror::Error;

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("not enough data: needed {needed} bytes, had {available}")]
    NotEnoughData { needed: usize, available: usize },
    #[error("string of {len} bytes is not valid UTF-8 (lossily decoded)")]
    InvalidString { len: usize },
}

pub type BufferResult<T> = Result<T, BufferError>;
