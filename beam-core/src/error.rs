use thiserror::Error;

/// Reasons a data-channel message could not be turned into a [`crate::Frame`].
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("text frame is not valid transfer JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("text frame is not valid UTF-8")]
    InvalidUtf8,
}
