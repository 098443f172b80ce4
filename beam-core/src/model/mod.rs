mod peer;
mod room;
mod signaling;
mod transfer;

pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{ClientMessage, IceCandidate, IceServerConfig, ServerMessage, SignalEnvelope};
pub use transfer::{ControlMessage, FileMetadata, Frame};
