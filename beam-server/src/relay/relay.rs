use crate::relay::RelayCommand;
use crate::room::RoomRegistry;
use crate::signaling::SignalingOutput;
use beam_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const RELAY_QUEUE_DEPTH: usize = 256;

/// Single task that owns the [`RoomRegistry`].
///
/// All joins, leaves and signals funnel through one command channel, so
/// registry mutations never race each other and every envelope is fanned
/// out in the order it arrived.
pub struct Relay {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<RelayCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Relay {
    pub fn new(
        registry: RoomRegistry,
        command_rx: mpsc::Receiver<RelayCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            registry,
            command_rx,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!(
            "Relay event loop started (room capacity {})",
            self.registry.capacity()
        );

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Relay event loop finished");
    }

    async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Join { peer_id, room_id } => {
                match self.registry.join(peer_id.clone(), room_id.clone()) {
                    Ok(outcome) => {
                        if let Some(previous) = outcome.previous {
                            info!(
                                "Peer {} moved out of room '{}'",
                                peer_id.short(),
                                previous.room_id
                            );
                            self.notify_left(&peer_id, &previous.remaining).await;
                        }

                        info!("Peer {} joined room '{}'", peer_id.short(), room_id);
                        self.signaling
                            .send_join_accepted(peer_id.clone(), room_id)
                            .await;
                        for member in outcome.notify {
                            self.signaling
                                .send_peer_joined(member, peer_id.clone())
                                .await;
                        }
                    }
                    Err(e) => {
                        warn!("Join rejected for {}: {}", peer_id.short(), e);
                        self.signaling
                            .send_join_rejected(peer_id, room_id, e.to_string())
                            .await;
                    }
                }
            }

            RelayCommand::Signal {
                peer_id,
                room_id,
                envelope,
            } => {
                if self.registry.room_of(&peer_id) != Some(&room_id) {
                    debug!(
                        "Peer {} is not in room '{}', dropping signal",
                        peer_id.short(),
                        room_id
                    );
                    return;
                }

                let recipients = self.registry.recipients(&peer_id, &room_id);
                if recipients.is_empty() {
                    debug!(
                        "No peer present in room '{}', dropping signal from {}",
                        room_id,
                        peer_id.short()
                    );
                    return;
                }

                for to in recipients {
                    self.signaling
                        .send_signal(to, peer_id.clone(), envelope.clone())
                        .await;
                }
            }

            RelayCommand::Leave { peer_id } => {
                let Some(outcome) = self.registry.leave(&peer_id) else {
                    return;
                };
                info!(
                    "Peer {} left room '{}' ({} remaining)",
                    peer_id.short(),
                    outcome.room_id,
                    outcome.remaining.len()
                );
                self.notify_left(&peer_id, &outcome.remaining).await;
            }
        }
    }

    async fn notify_left(&self, peer_id: &PeerId, remaining: &[PeerId]) {
        for member in remaining {
            self.signaling
                .send_peer_left(member.clone(), peer_id.clone())
                .await;
        }
    }
}
