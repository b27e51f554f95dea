/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is shorter than its fixed header.
    #[error("frame truncated ({len} bytes, header needs 5)")]
    Truncated { len: usize },

    /// The cipher rejected the payload (length not a block multiple, or bad padding).
    #[error("failed to decrypt {len}-byte payload")]
    Decrypt { len: usize },

    /// The payload decrypted but is not well-formed JSON.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    /// A command could not be serialized.
    #[error("failed to serialize command: {0}")]
    Encode(#[source] serde_json::Error),

    /// The declared payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
