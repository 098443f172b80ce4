use crate::error::ClientError;
use crate::negotiation::{EngineObserver, NegotiationSession, Role, SessionState};
use crate::transfer::OutgoingFile;
use crate::transport::{
    LinkState, PeerTransport, RemoteDescription, TransportEvent, TransportFactory,
};
use anyhow::Result;
use beam_core::utils::FILE_CHANNEL_LABEL;
use beam_core::{Frame, IceCandidate, PeerId, SignalEnvelope};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// One session at a time, like a single browser tab.
pub const DEFAULT_MAX_SESSIONS: usize = 1;

/// Drives offer/answer and trickle ICE for every remote peer, and feeds
/// data-channel frames into each session's transfer state.
///
/// Outbound envelopes go to `signal_tx`; the owner forwards them to the relay
/// tagged with the current room.
pub struct Negotiator {
    sessions: HashMap<PeerId, NegotiationSession>,
    factory: Arc<dyn TransportFactory>,
    transport_tx: mpsc::Sender<TransportEvent>,
    signal_tx: mpsc::UnboundedSender<SignalEnvelope>,
    observer: Arc<dyn EngineObserver>,
    max_sessions: usize,
}

impl Negotiator {
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        transport_tx: mpsc::Sender<TransportEvent>,
        signal_tx: mpsc::UnboundedSender<SignalEnvelope>,
        observer: Arc<dyn EngineObserver>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            factory,
            transport_tx,
            signal_tx,
            observer,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn session_state(&self, peer_id: &PeerId) -> Option<SessionState> {
        self.sessions.get(peer_id).map(NegotiationSession::state)
    }

    pub fn session(&self, peer_id: &PeerId) -> Option<&NegotiationSession> {
        self.sessions.get(peer_id)
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.sessions.keys().cloned().collect()
    }

    fn has_capacity(&self) -> bool {
        self.sessions.len() < self.max_sessions
    }

    // --- Relay input ---

    pub async fn handle_peer_joined(&mut self, peer_id: PeerId) {
        if self.sessions.contains_key(&peer_id) {
            debug!("Session with {} already exists", peer_id.short());
            return;
        }
        if !self.has_capacity() {
            self.reject_peer(&peer_id).await;
            return;
        }

        info!("Peer {} joined, starting negotiation", peer_id.short());
        let Some(transport) = self.open_session(&peer_id, Role::Initiator).await else {
            return;
        };
        self.transition(&peer_id, SessionState::Negotiating(Role::Initiator))
            .await;

        if let Err(e) = self.start_offer(&peer_id, transport).await {
            self.fail(&peer_id, e).await;
        }
    }

    pub async fn handle_signal(&mut self, sender_id: PeerId, envelope: Value) {
        let envelope = match SignalEnvelope::from_value(envelope) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Malformed envelope from {}: {}", sender_id.short(), e);
                return;
            }
        };
        debug!("Received {} from {}", envelope.kind(), sender_id.short());

        match envelope {
            SignalEnvelope::Offer { sdp } => self.handle_offer(sender_id, sdp).await,
            SignalEnvelope::Answer { sdp } => self.handle_answer(sender_id, sdp).await,
            SignalEnvelope::IceCandidate { candidate } => {
                self.handle_candidate(sender_id, candidate).await
            }
        }
    }

    pub async fn handle_peer_left(&mut self, peer_id: PeerId) {
        if self.sessions.contains_key(&peer_id) {
            self.close_session(&peer_id, SessionState::Closed, "Peer left")
                .await;
        } else {
            debug!("Peer {} left without a session", peer_id.short());
        }
    }

    async fn handle_offer(&mut self, peer_id: PeerId, sdp: String) {
        let transport = match self.sessions.get(&peer_id) {
            Some(session) => session.transport.clone(),
            None => {
                if !self.has_capacity() {
                    self.reject_peer(&peer_id).await;
                    return;
                }
                match self.open_session(&peer_id, Role::Responder).await {
                    Some(transport) => transport,
                    None => return,
                }
            }
        };

        if self.session_state(&peer_id) == Some(SessionState::Idle) {
            self.transition(&peer_id, SessionState::Negotiating(Role::Responder))
                .await;
        }

        if let Err(e) = self.answer_offer(&peer_id, transport, sdp).await {
            self.fail(&peer_id, e).await;
        }
    }

    async fn handle_answer(&mut self, peer_id: PeerId, sdp: String) {
        let Some(session) = self.sessions.get(&peer_id) else {
            warn!("Answer from {} without a session", peer_id.short());
            return;
        };
        let transport = session.transport.clone();

        let applied = transport
            .apply_remote_description(RemoteDescription::Answer(sdp.clone()))
            .await;
        match applied {
            Ok(()) => {
                if let Some(session) = self.sessions.get_mut(&peer_id) {
                    session.remote_description = Some(sdp);
                }
                self.drain_candidates(&peer_id, transport).await;
            }
            Err(e) => self.fail(&peer_id, e).await,
        }
    }

    async fn handle_candidate(&mut self, peer_id: PeerId, candidate: IceCandidate) {
        if !self.sessions.contains_key(&peer_id) {
            if !self.has_capacity() {
                debug!("Dropping candidate from {}: no free session", peer_id.short());
                return;
            }
            // The offer is still in flight; hold candidates until it lands.
            if self.open_session(&peer_id, Role::Responder).await.is_none() {
                return;
            }
        }

        let Some(session) = self.sessions.get_mut(&peer_id) else {
            return;
        };
        if !session.has_remote_description() {
            session.queue_candidate(candidate);
            debug!(
                "Queued candidate from {} ({} pending)",
                peer_id.short(),
                session.pending_candidate_count()
            );
            return;
        }

        let transport = session.transport.clone();
        if let Err(e) = transport.add_remote_candidate(candidate).await {
            warn!("Failed to add candidate from {}: {:#}", peer_id.short(), e);
        }
    }

    // --- Transport input ---

    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(peer_id, candidate) => {
                if self.sessions.contains_key(&peer_id) {
                    self.send_signal(SignalEnvelope::IceCandidate { candidate });
                }
            }
            TransportEvent::StateChanged(peer_id, link) => {
                self.handle_link_state(peer_id, link).await;
            }
            TransportEvent::ChannelOpen(peer_id) => {
                let Some(session) = self.sessions.get_mut(&peer_id) else {
                    return;
                };
                session.mark_channel_open();
                let _ = self.flush_or_fail(&peer_id).await;
            }
            TransportEvent::Message {
                peer_id,
                is_text,
                data,
            } => {
                self.handle_message(peer_id, is_text, data).await;
            }
            TransportEvent::ChannelClosed(peer_id) => {
                if self.sessions.contains_key(&peer_id) {
                    self.close_session(&peer_id, SessionState::Closed, "Peer disconnected")
                        .await;
                }
            }
        }
    }

    async fn handle_link_state(&mut self, peer_id: PeerId, link: LinkState) {
        if !self.sessions.contains_key(&peer_id) {
            return;
        }
        match link {
            LinkState::Connected => {
                if self.transition(&peer_id, SessionState::Connected).await {
                    self.status("Connected to peer").await;
                }
            }
            LinkState::Failed => {
                self.close_session(&peer_id, SessionState::Failed, "Connection failed")
                    .await;
            }
            LinkState::Disconnected | LinkState::Closed => {
                self.close_session(&peer_id, SessionState::Closed, "Peer disconnected")
                    .await;
            }
            LinkState::New | LinkState::Connecting => {
                debug!("Link with {} is {:?}", peer_id.short(), link);
            }
        }
    }

    async fn handle_message(&mut self, peer_id: PeerId, is_text: bool, data: bytes::Bytes) {
        let frame = match Frame::decode(is_text, data) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping frame from {}: {}", peer_id.short(), e);
                return;
            }
        };
        let Some(session) = self.sessions.get_mut(&peer_id) else {
            return;
        };

        if let Some(file) = session.transfer.accept(frame) {
            info!(
                "Received '{}' ({} bytes) from {}",
                file.file_name,
                file.bytes.len(),
                peer_id.short()
            );
            self.observer.on_transfer_complete(peer_id, file).await;
            self.status("File received").await;
        }
    }

    // --- Sending ---

    /// Queue `file` for `peer_id`; it goes out as soon as the channel is open.
    ///
    /// A file that cannot fit in one data-channel message is refused before
    /// anything is queued. A failed send closes the session as failed.
    pub async fn send_file(
        &mut self,
        peer_id: &PeerId,
        file: &OutgoingFile,
    ) -> Result<(), ClientError> {
        let session = self
            .sessions
            .get_mut(peer_id)
            .ok_or_else(|| ClientError::SessionNotFound(peer_id.clone()))?;

        let max = session.transport.max_message_size();
        if file.len() > max {
            warn!(
                "Refusing '{}' for {}: {} bytes over the {} byte limit",
                file.metadata.file_name,
                peer_id.short(),
                file.len(),
                max
            );
            return Err(ClientError::PayloadTooLarge {
                size: file.len(),
                max,
            });
        }

        for frame in file.frames() {
            session.enqueue_frame(frame);
        }
        if !session.is_channel_open() {
            debug!(
                "Channel to {} not open, {} frames queued",
                peer_id.short(),
                session.queued_frames()
            );
            return Ok(());
        }
        self.flush_or_fail(peer_id).await
    }

    /// Queue `file` for every session. Returns how many peers it was queued for.
    pub async fn send_file_to_all(&mut self, file: &OutgoingFile) -> Result<usize, ClientError> {
        let peers = self.peers();
        if peers.is_empty() {
            return Err(ClientError::NoPeer);
        }
        for peer_id in &peers {
            self.send_file(peer_id, file).await?;
        }
        Ok(peers.len())
    }

    async fn flush_or_fail(&mut self, peer_id: &PeerId) -> Result<(), ClientError> {
        let result = self.flush_outbox(peer_id).await;
        if let Err(e) = &result {
            error!("Failed to send queued frames to {}: {}", peer_id.short(), e);
            self.close_session(peer_id, SessionState::Failed, "Transfer failed")
                .await;
        }
        result
    }

    async fn flush_outbox(&mut self, peer_id: &PeerId) -> Result<(), ClientError> {
        loop {
            let Some(session) = self.sessions.get_mut(peer_id) else {
                return Ok(());
            };
            let Some(frame) = session.next_frame() else {
                return Ok(());
            };
            let transport = session.transport.clone();

            match frame {
                Frame::Metadata(meta) => {
                    transport.send_text(meta.to_text()).await?;
                }
                Frame::Payload(bytes) => {
                    let len = bytes.len();
                    transport.send_binary(bytes).await?;
                    info!("Sent {} bytes to {}", len, peer_id.short());
                    self.status("File sent").await;
                }
            }
        }
    }

    // --- Lifecycle ---

    /// Close every session, e.g. on shutdown.
    pub async fn close_all(&mut self) {
        for peer_id in self.peers() {
            self.close_session(&peer_id, SessionState::Closed, "Session closed")
                .await;
        }
    }

    async fn open_session(
        &mut self,
        peer_id: &PeerId,
        role: Role,
    ) -> Option<Arc<dyn PeerTransport>> {
        let transport = match self
            .factory
            .connect(peer_id.clone(), self.transport_tx.clone())
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                error!("Failed to create transport for {}: {:#}", peer_id.short(), e);
                self.status("Connection failed").await;
                return None;
            }
        };

        let session = NegotiationSession::new(peer_id.clone(), role, transport.clone());
        self.sessions.insert(peer_id.clone(), session);
        Some(transport)
    }

    async fn start_offer(&mut self, peer_id: &PeerId, transport: Arc<dyn PeerTransport>) -> Result<()> {
        transport.open_data_channel(FILE_CHANNEL_LABEL).await?;
        let sdp = transport.create_offer().await?;

        if let Some(session) = self.sessions.get_mut(peer_id) {
            session.local_description = Some(sdp.clone());
        }
        self.send_signal(SignalEnvelope::Offer { sdp });
        Ok(())
    }

    async fn answer_offer(
        &mut self,
        peer_id: &PeerId,
        transport: Arc<dyn PeerTransport>,
        sdp: String,
    ) -> Result<()> {
        transport
            .apply_remote_description(RemoteDescription::Offer(sdp.clone()))
            .await?;
        if let Some(session) = self.sessions.get_mut(peer_id) {
            session.remote_description = Some(sdp);
        }
        self.drain_candidates(peer_id, transport.clone()).await;

        let answer = transport.create_answer().await?;
        if let Some(session) = self.sessions.get_mut(peer_id) {
            session.local_description = Some(answer.clone());
        }
        self.send_signal(SignalEnvelope::Answer { sdp: answer });
        Ok(())
    }

    /// Apply queued remote candidates in arrival order.
    async fn drain_candidates(&mut self, peer_id: &PeerId, transport: Arc<dyn PeerTransport>) {
        let Some(session) = self.sessions.get_mut(peer_id) else {
            return;
        };
        let pending = session.take_pending_candidates();
        if !pending.is_empty() {
            debug!("Applying {} queued candidates from {}", pending.len(), peer_id.short());
        }
        for candidate in pending {
            if let Err(e) = transport.add_remote_candidate(candidate).await {
                warn!("Failed to add candidate from {}: {:#}", peer_id.short(), e);
            }
        }
    }

    async fn transition(&mut self, peer_id: &PeerId, state: SessionState) -> bool {
        let changed = self
            .sessions
            .get_mut(peer_id)
            .map(|session| session.set_state(state))
            .unwrap_or(false);
        if changed {
            debug!("Session with {} is now {}", peer_id.short(), state);
            self.observer
                .on_session_state(peer_id.clone(), state)
                .await;
        }
        changed
    }

    async fn close_session(&mut self, peer_id: &PeerId, state: SessionState, reason: &str) {
        let Some(mut session) = self.sessions.remove(peer_id) else {
            return;
        };
        info!("Closing session with {}: {}", peer_id.short(), reason);

        if session.transfer.abort() {
            self.status("Transfer aborted").await;
        }
        if session.set_state(state) {
            self.observer.on_session_state(peer_id.clone(), state).await;
        }
        self.status(reason).await;

        if let Err(e) = session.transport.close().await {
            debug!("Closing transport for {} failed: {:#}", peer_id.short(), e);
        }
    }

    async fn fail(&mut self, peer_id: &PeerId, err: anyhow::Error) {
        error!("Negotiation with {} failed: {:#}", peer_id.short(), err);
        self.close_session(peer_id, SessionState::Failed, "Connection failed")
            .await;
    }

    async fn reject_peer(&self, peer_id: &PeerId) {
        warn!("Ignoring {}: a session is already active", peer_id.short());
        self.status(&format!("Ignoring peer {}: already connected", peer_id.short()))
            .await;
    }

    fn send_signal(&self, envelope: SignalEnvelope) {
        debug!("Sending {}", envelope.kind());
        if self.signal_tx.send(envelope).is_err() {
            warn!("Signal output closed, envelope dropped");
        }
    }

    async fn status(&self, text: &str) {
        self.observer.on_status(text.to_string()).await;
    }
}
