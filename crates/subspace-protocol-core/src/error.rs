use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("packet shorter than the minimum frame size")]
    Truncated,
    #[error("packet of {0} bytes exceeds the transport's maximum payload size")]
    TooLarge(usize),
    #[error("failed CRC check, packet discarded")]
    BadChecksum,
    #[error("unknown core subtype 0x{0:02x}")]
    UnknownCoreType(u8),
    #[error(transparent)]
    Buffer(#[from] subspace_buffer::BufferError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
