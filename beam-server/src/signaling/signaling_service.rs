use crate::relay::RelayCommand;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use beam_core::{IceServerConfig, PeerId, RoomId, ServerMessage};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Connection table for the WebSocket endpoint.
///
/// Each connected socket owns an unbounded outbound queue, so frames to one
/// recipient leave in the order the relay produced them.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    relay_tx: mpsc::Sender<RelayCommand>,
}

impl SignalingService {
    pub fn new(relay_tx: mpsc::Sender<RelayCommand>, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                ice_servers,
            }),
            relay_tx,
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_peer(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(peer_id, tx);
    }

    pub fn remove_peer(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);
    }

    pub fn connected_peers(&self) -> usize {
        self.inner.peers.len()
    }

    /// Hand a command to the relay task. Returns false once the relay is gone.
    pub async fn relay(&self, cmd: RelayCommand) -> bool {
        match self.relay_tx.send(cmd).await {
            Ok(()) => true,
            Err(e) => {
                error!("Relay died: {}", e);
                false
            }
        }
    }

    pub fn send_message(&self, peer_id: &PeerId, msg: ServerMessage) {
        if let Some(peer) = self.inner.peers.get(peer_id) {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to {}: {:?}", peer_id.short(), e);
                    }
                }
                Err(e) => error!("Failed to serialize server message: {}", e),
            }
        } else {
            warn!(
                "Attempted to send message to disconnected peer {}",
                peer_id.short()
            );
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send_peer_joined(&self, to: PeerId, peer_id: PeerId) {
        self.send_message(&to, ServerMessage::PeerJoined { peer_id });
    }

    async fn send_peer_left(&self, to: PeerId, peer_id: PeerId) {
        self.send_message(&to, ServerMessage::PeerLeft { peer_id });
    }

    async fn send_signal(&self, to: PeerId, sender_id: PeerId, envelope: Value) {
        self.send_message(
            &to,
            ServerMessage::Signal {
                envelope,
                sender_id,
            },
        );
    }

    async fn send_join_accepted(&self, to: PeerId, room_id: RoomId) {
        self.send_message(&to, ServerMessage::JoinAccepted { room_id });
    }

    async fn send_join_rejected(&self, to: PeerId, room_id: RoomId, reason: String) {
        self.send_message(&to, ServerMessage::JoinRejected { room_id, reason });
    }
}
