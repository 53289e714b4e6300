#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("map data too short to contain a tile table")]
    Truncated,
    #[error("tile table is not a whole number of 4-byte tile entries")]
    Misaligned,
}

pub type WorldResult<T> = Result<T, WorldError>;
