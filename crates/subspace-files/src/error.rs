#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("io error on {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("failed to inflate downloaded file {filename} ({size} bytes)")]
    Inflate { filename: String, size: usize },

    #[error("checksum mismatch for {filename}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { filename: String, expected: u32, actual: u32 },
}

pub type FileResult<T> = Result<T, FileError>;
