use crate::error::FrameError;
use crate::utils::DEFAULT_FILE_NAME;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub file_name: String,
    /// MIME-like type, possibly empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub file_type: String,
}

impl FileMetadata {
    pub fn new(file_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
        }
    }

    /// Metadata applied to a payload that had none.
    pub fn placeholder() -> Self {
        Self::new(DEFAULT_FILE_NAME, "")
    }

    fn or_placeholder_name(mut self) -> Self {
        if self.file_name.is_empty() {
            self.file_name = DEFAULT_FILE_NAME.to_string();
        }
        self
    }

    /// Text form sent over the data channel.
    pub fn to_text(&self) -> String {
        let msg = ControlMessage::FileMetadata(self.clone());
        serde_json::to_string(&msg).unwrap_or_default()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Textual messages of the transfer protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ControlMessage {
    FileMetadata(FileMetadata),
}

/// One data-channel message after the text/binary split has been decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Metadata(FileMetadata),
    Payload(Bytes),
}

impl Frame {
    /// `is_text` is the transport's own flag for string messages.
    pub fn decode(is_text: bool, data: Bytes) -> Result<Self, FrameError> {
        if !is_text {
            return Ok(Frame::Payload(data));
        }

        let text = std::str::from_utf8(&data).map_err(|_| FrameError::InvalidUtf8)?;
        let ControlMessage::FileMetadata(meta) = serde_json::from_str::<ControlMessage>(text)?;
        Ok(Frame::Metadata(meta.or_placeholder_name()))
    }
}
