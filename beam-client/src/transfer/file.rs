use crate::transfer::mime_type_for;
use beam_core::utils::DEFAULT_FILE_NAME;
use beam_core::{FileMetadata, Frame};
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};

/// A file queued for sending: its metadata plus the full content.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingFile {
    pub metadata: FileMetadata,
    pub bytes: Bytes,
}

impl OutgoingFile {
    pub fn new(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            metadata: FileMetadata::new(file_name, file_type),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. The name is the last path component and the
    /// type is guessed from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(file_name, mime_type_for(path), bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The two data-channel frames, in wire order.
    pub fn frames(&self) -> [Frame; 2] {
        [
            Frame::Metadata(self.metadata.clone()),
            Frame::Payload(self.bytes.clone()),
        ]
    }
}

/// A completed incoming transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedFile {
    pub file_name: String,
    pub file_type: String,
    pub bytes: Bytes,
}

impl ReceivedFile {
    pub fn new(metadata: FileMetadata, bytes: Bytes) -> Self {
        Self {
            file_name: metadata.file_name,
            file_type: metadata.file_type,
            bytes,
        }
    }

    pub fn is_text(&self) -> bool {
        self.file_type.starts_with("text/")
    }

    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }

    /// Decoded content for text files, cut to `max_chars` characters.
    pub fn text_preview(&self, max_chars: usize) -> Option<String> {
        if !self.is_text() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.bytes);
        Some(text.chars().take(max_chars).collect())
    }

    /// Write the content under `dir` and return the final path.
    ///
    /// Only the last component of the announced name is used. An existing
    /// file is never overwritten; a numeric suffix is added instead.
    pub async fn save_into(&self, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let name = sanitize_file_name(&self.file_name);
        let mut target = dir.join(&name);
        let mut n = 1;
        while tokio::fs::try_exists(&target).await? {
            target = dir.join(numbered_name(&name, n));
            n += 1;
        }

        tokio::fs::write(&target, &self.bytes).await?;
        Ok(target)
    }
}

fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match last {
        "" | "." | ".." => DEFAULT_FILE_NAME.to_string(),
        other => other.to_string(),
    }
}

fn numbered_name(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{name} ({n})"),
    }
}
