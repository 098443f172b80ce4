use crate::negotiation::SessionState;
use crate::transfer::ReceivedFile;
use async_trait::async_trait;
use beam_core::PeerId;

/// Receives everything a user interface would display.
#[async_trait]
pub trait EngineObserver: Send + Sync + 'static {
    /// Short human-readable line such as "Connected to peer".
    async fn on_status(&self, text: String);

    async fn on_session_state(&self, _peer_id: PeerId, _state: SessionState) {}

    async fn on_transfer_complete(&self, peer_id: PeerId, file: ReceivedFile);
}
