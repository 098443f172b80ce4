use crate::error::ClientError;
use crate::transfer::OutgoingFile;
use beam_core::RoomId;
use tokio::sync::oneshot;

/// Requests from an [`EngineHandle`](crate::EngineHandle) to the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    JoinRoom(RoomId),
    SendFile {
        file: OutgoingFile,
        reply: oneshot::Sender<Result<usize, ClientError>>,
    },
    Shutdown,
}
