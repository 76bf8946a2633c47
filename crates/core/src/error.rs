/// Result alias that carries the custom [`KaraError`] type.
pub type Result<T> = std::result::Result<T, KaraError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum KaraError {
    /// Tempo parameters that leave the lyric grid undefined. Rejected at the
    /// input boundary; the grid arithmetic itself assumes they are valid.
    #[error("invalid tempo: {0}")]
    InvalidTempo(String),
    /// Caller handed a value the operation cannot work with.
    #[error("{0}")]
    InvalidInput(&'static str),
    /// The audio payload could not be decoded.
    #[error("audio decode failed: {0}")]
    Audio(String),
    /// The project container could not be written.
    #[error("project encode failed: {0}")]
    ProjectEncode(#[from] bson::ser::Error),
    /// The project container could not be read back.
    #[error("project decode failed: {0}")]
    ProjectDecode(#[from] bson::de::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Free-form error message.
    #[error("{0}")]
    Message(String),
}

impl KaraError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for KaraError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for KaraError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
