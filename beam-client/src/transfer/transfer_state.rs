use crate::transfer::ReceivedFile;
use beam_core::{FileMetadata, Frame};
use tracing::debug;

/// Receive side of the metadata-then-payload protocol for one session.
///
/// Holds at most one pending metadata record. A payload consumes it, or the
/// placeholder name when none arrived, and completes exactly one file.
#[derive(Debug, Default)]
pub struct TransferState {
    pending: Option<FileMetadata>,
}

impl TransferState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, frame: Frame) -> Option<ReceivedFile> {
        match frame {
            Frame::Metadata(meta) => {
                if let Some(previous) = self.pending.replace(meta) {
                    debug!("Metadata for '{}' replaced before payload", previous.file_name);
                }
                None
            }
            Frame::Payload(bytes) => {
                let meta = self.pending.take().unwrap_or_else(FileMetadata::placeholder);
                Some(ReceivedFile::new(meta, bytes))
            }
        }
    }

    pub fn pending(&self) -> Option<&FileMetadata> {
        self.pending.as_ref()
    }

    /// Drop pending metadata. Returns whether a transfer was in flight.
    pub fn abort(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
