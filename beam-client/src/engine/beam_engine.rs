use crate::engine::{EngineCommand, RelayConnection};
use crate::error::ClientError;
use crate::negotiation::{DEFAULT_MAX_SESSIONS, EngineObserver, Negotiator};
use crate::transfer::OutgoingFile;
use crate::transport::{TransportConfig, TransportEvent, TransportFactory, WebRtcTransportFactory};
use beam_core::{ClientMessage, PeerId, RoomId, ServerMessage, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const TRANSPORT_QUEUE_DEPTH: usize = 256;
const COMMAND_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Relay WebSocket endpoint, e.g. `ws://127.0.0.1:3000/ws`.
    pub relay_url: String,
    pub transport: TransportConfig,
    pub max_sessions: usize,
}

impl EngineConfig {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            transport: TransportConfig::default(),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

/// Client-side event loop: relay frames, transport events and user commands
/// all land in one task that owns the [`Negotiator`].
pub struct BeamEngine {
    peer_id: PeerId,
    /// Room the relay has confirmed us in.
    room_id: Option<RoomId>,
    /// Room requested but not yet accepted or rejected.
    joining: Option<RoomId>,
    negotiator: Negotiator,
    factory: Arc<dyn TransportFactory>,
    observer: Arc<dyn EngineObserver>,
    relay_tx: mpsc::UnboundedSender<ClientMessage>,
    relay_rx: mpsc::UnboundedReceiver<ServerMessage>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    signal_rx: mpsc::UnboundedReceiver<SignalEnvelope>,
    command_rx: mpsc::Receiver<EngineCommand>,
}

impl BeamEngine {
    /// Connect to the relay and start the engine task.
    pub async fn connect(
        config: EngineConfig,
        observer: Arc<dyn EngineObserver>,
    ) -> Result<EngineHandle, ClientError> {
        let factory = Arc::new(WebRtcTransportFactory::new(config.transport.clone()));
        Self::connect_with_transport(config, factory, observer).await
    }

    /// Like [`BeamEngine::connect`], with peer transports built by `factory`.
    pub async fn connect_with_transport(
        config: EngineConfig,
        factory: Arc<dyn TransportFactory>,
        observer: Arc<dyn EngineObserver>,
    ) -> Result<EngineHandle, ClientError> {
        let relay = RelayConnection::connect(&config.relay_url).await?;
        let peer_id = relay.peer_id.clone();

        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_QUEUE_DEPTH);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);

        let negotiator = Negotiator::new(
            factory.clone(),
            transport_tx,
            signal_tx,
            observer.clone(),
        )
        .with_max_sessions(config.max_sessions);

        let engine = Self {
            peer_id: peer_id.clone(),
            room_id: None,
            joining: None,
            negotiator,
            factory,
            observer,
            relay_tx: relay.outbound,
            relay_rx: relay.inbound,
            transport_rx,
            signal_rx,
            command_rx,
        };
        let task = tokio::spawn(engine.run());

        Ok(EngineHandle {
            peer_id,
            command_tx,
            task,
        })
    }

    async fn run(mut self) {
        info!("Engine {} started", self.peer_id.short());

        loop {
            tokio::select! {
                msg = self.relay_rx.recv() => {
                    match msg {
                        Some(msg) => self.handle_server_message(msg).await,
                        None => {
                            warn!("Relay connection closed");
                            self.status("Relay connection lost").await;
                            break;
                        }
                    }
                }
                Some(event) = self.transport_rx.recv() => {
                    self.negotiator.handle_transport_event(event).await;
                }
                Some(envelope) = self.signal_rx.recv() => {
                    self.forward_signal(envelope);
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(EngineCommand::JoinRoom(room_id)) => self.join_room(room_id).await,
                        Some(EngineCommand::SendFile { file, reply }) => {
                            let result = self.negotiator.send_file_to_all(&file).await;
                            let _ = reply.send(result);
                        }
                        Some(EngineCommand::Shutdown) | None => break,
                    }
                }
            }
        }

        self.negotiator.close_all().await;
        info!("Engine {} stopped", self.peer_id.short());
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { peer_id } => {
                debug!("Ignoring repeated welcome ({})", peer_id.short());
            }
            ServerMessage::IceConfig { ice_servers } => {
                debug!("Relay provided {} ICE servers", ice_servers.len());
                self.factory.set_ice_servers(ice_servers).await;
            }
            ServerMessage::PeerJoined { peer_id } => {
                self.negotiator.handle_peer_joined(peer_id).await;
            }
            ServerMessage::PeerLeft { peer_id } => {
                self.negotiator.handle_peer_left(peer_id).await;
            }
            ServerMessage::Signal {
                envelope,
                sender_id,
            } => {
                self.negotiator.handle_signal(sender_id, envelope).await;
            }
            ServerMessage::JoinAccepted { room_id } => self.handle_join_accepted(room_id).await,
            ServerMessage::JoinRejected { room_id, reason } => {
                warn!("Join of {} rejected: {}", room_id, reason);
                if self.joining.as_ref() == Some(&room_id) {
                    self.joining = None;
                }
                self.status(&format!("Room {} is full", room_id)).await;
            }
        }
    }

    /// The current room stays in effect until the relay accepts the new one.
    async fn join_room(&mut self, room_id: RoomId) {
        debug!("Requesting room {}", room_id);
        self.joining = Some(room_id.clone());
        self.send_relay(ClientMessage::JoinRoom { room_id });
    }

    async fn handle_join_accepted(&mut self, room_id: RoomId) {
        if self.joining.as_ref() == Some(&room_id) {
            self.joining = None;
        }
        if let Some(previous) = self.room_id.as_ref().filter(|r| **r != room_id) {
            info!("Left room {}, closing its sessions", previous);
            self.negotiator.close_all().await;
        }
        self.room_id = Some(room_id.clone());
        self.status(&format!("Joined room: {}", room_id)).await;
    }

    fn forward_signal(&self, envelope: SignalEnvelope) {
        let Some(room_id) = self.room_id.clone() else {
            warn!("Dropping {}: not in a room", envelope.kind());
            return;
        };
        self.send_relay(ClientMessage::Signal {
            room_id,
            envelope: envelope.to_value(),
        });
    }

    fn send_relay(&self, msg: ClientMessage) {
        if self.relay_tx.send(msg).is_err() {
            warn!("Relay writer closed, frame dropped");
        }
    }

    async fn status(&self, text: &str) {
        self.observer.on_status(text.to_string()).await;
    }
}

/// Handle to a running [`BeamEngine`].
pub struct EngineHandle {
    peer_id: PeerId,
    command_tx: mpsc::Sender<EngineCommand>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Identifier the relay assigned to this client.
    pub fn local_peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub async fn join_room(&self, room_id: impl Into<RoomId>) -> Result<(), ClientError> {
        self.command_tx
            .send(EngineCommand::JoinRoom(room_id.into()))
            .await
            .map_err(|_| ClientError::EngineStopped)
    }

    /// Send `file` to every peer with a session. Returns the number of peers.
    ///
    /// Frames are queued until the data channel opens.
    pub async fn send_file(&self, file: OutgoingFile) -> Result<usize, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::SendFile { file, reply })
            .await
            .map_err(|_| ClientError::EngineStopped)?;
        rx.await.map_err(|_| ClientError::EngineStopped)?
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Close all sessions and the relay connection, then wait for the task.
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(EngineCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!("Engine task ended abnormally: {}", e);
        }
    }
}
