use beam_core::{PeerId, RoomId};
use async_trait::async_trait;
use serde_json::Value;

/// Outbound side of the relay: how room events reach connected clients.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Tell `to` that `peer_id` entered its room; `to` becomes the initiator.
    async fn send_peer_joined(&self, to: PeerId, peer_id: PeerId);

    /// Tell `to` that `peer_id` left its room.
    async fn send_peer_left(&self, to: PeerId, peer_id: PeerId);

    /// Forward an opaque envelope, stamped with the relay-known sender.
    async fn send_signal(&self, to: PeerId, sender_id: PeerId, envelope: Value);

    /// Confirm to `to` that it is now a member of `room_id`.
    async fn send_join_accepted(&self, to: PeerId, room_id: RoomId);

    async fn send_join_rejected(&self, to: PeerId, room_id: RoomId, reason: String);
}
