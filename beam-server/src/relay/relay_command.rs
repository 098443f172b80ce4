use beam_core::{PeerId, RoomId};
use serde_json::Value;

/// Inbound events for the relay, produced by the WebSocket endpoint.
#[derive(Debug)]
pub enum RelayCommand {
    /// A connection asked to enter a room.
    Join { peer_id: PeerId, room_id: RoomId },

    /// Opaque negotiation payload to fan out to the rest of the room.
    Signal {
        peer_id: PeerId,
        room_id: RoomId,
        envelope: Value,
    },

    /// The WebSocket behind `peer_id` is gone.
    Leave { peer_id: PeerId },
}
