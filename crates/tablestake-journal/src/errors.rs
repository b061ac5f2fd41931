use tablestake_core::CoreError;
use thiserror::Error;

/// Errors that can occur during journal operations.
#[derive(Error, Debug)]
pub enum JournalError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid file header (magic, version, flags, or reserved bytes).
    #[error("invalid journal header: {0}")]
    InvalidHeader(String),
    /// Invalid frame structure (reserved bytes or length).
    #[error("invalid frame at offset {offset}: {reason}")]
    InvalidFrame {
        /// Byte offset where the frame starts.
        offset: u64,
        /// Reason for invalidity.
        reason: String,
    },
    /// Payload exceeds the frame size limit.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// Actual payload size.
        size: u64,
        /// Maximum allowed size.
        max: u32,
    },
    /// Envelope payload is not UTF-8.
    #[error("invalid UTF-8 in envelope payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Envelope payload is not a valid envelope.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// File has bytes but fewer than a full header.
    #[error("file is not empty but shorter than a journal header")]
    FileNotEmpty,
    /// Torn frame detected in strict mode.
    #[error("truncated frame at offset {offset}")]
    TruncatedFrame {
        /// Byte offset where truncation occurred.
        offset: u64,
    },
    /// Event id recomputation failed.
    #[error("event verification failed: {0}")]
    Core(#[from] CoreError),
}
