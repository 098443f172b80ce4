use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use beam_core::{IceCandidate, IceServerConfig, PeerId};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteDescription {
    Offer(String),
    Answer(String),
}

/// Peer-to-peer transport for one remote peer.
///
/// The negotiation layer only drives descriptions and candidates through
/// this trait; NAT traversal and encryption stay inside the implementation.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Create the outgoing data channel (initiator side only).
    async fn open_data_channel(&self, label: &str) -> Result<()>;

    /// Produce an offer, install it as local description and return its SDP.
    async fn create_offer(&self) -> Result<String>;

    /// Produce an answer, install it as local description and return its SDP.
    async fn create_answer(&self) -> Result<String>;

    async fn apply_remote_description(&self, description: RemoteDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn send_text(&self, text: String) -> Result<()>;

    async fn send_binary(&self, data: Bytes) -> Result<()>;

    /// Largest single message the data channel accepts.
    fn max_message_size(&self) -> usize;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Build a transport whose events are tagged with `peer_id`.
    async fn connect(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>>;

    /// Replace the ICE servers used by transports created from now on.
    async fn set_ice_servers(&self, _ice_servers: Vec<IceServerConfig>) {}
}
