use crate::transfer::TransferState;
use crate::transport::PeerTransport;
use beam_core::{Frame, IceCandidate, PeerId};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Saw `peer-joined`, opens the data channel and sends the offer.
    Initiator,
    /// Answers an incoming offer.
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Negotiating(Role),
    Connected,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Negotiating(Role::Initiator) => write!(f, "negotiating (initiator)"),
            SessionState::Negotiating(Role::Responder) => write!(f, "negotiating (responder)"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Closed => write!(f, "closed"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

/// Negotiation and transfer state for one remote peer.
pub struct NegotiationSession {
    pub peer_id: PeerId,
    pub role: Role,
    state: SessionState,
    pub transport: Arc<dyn PeerTransport>,
    pub local_description: Option<String>,
    pub remote_description: Option<String>,
    /// Remote candidates that arrived before the remote description.
    pending_candidates: VecDeque<IceCandidate>,
    channel_open: bool,
    /// Frames waiting for the data channel to open.
    outbox: VecDeque<Frame>,
    pub transfer: TransferState,
}

impl NegotiationSession {
    pub fn new(peer_id: PeerId, role: Role, transport: Arc<dyn PeerTransport>) -> Self {
        Self {
            peer_id,
            role,
            state: SessionState::Idle,
            transport,
            local_description: None,
            remote_description: None,
            pending_candidates: VecDeque::new(),
            channel_open: false,
            outbox: VecDeque::new(),
            transfer: TransferState::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns false when the state was already `state`.
    pub fn set_state(&mut self, state: SessionState) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        true
    }

    pub fn has_remote_description(&self) -> bool {
        self.remote_description.is_some()
    }

    pub fn queue_candidate(&mut self, candidate: IceCandidate) {
        self.pending_candidates.push_back(candidate);
    }

    pub fn take_pending_candidates(&mut self) -> VecDeque<IceCandidate> {
        std::mem::take(&mut self.pending_candidates)
    }

    pub fn pending_candidate_count(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel_open
    }

    pub fn mark_channel_open(&mut self) {
        self.channel_open = true;
    }

    pub fn enqueue_frame(&mut self, frame: Frame) {
        self.outbox.push_back(frame);
    }

    pub fn next_frame(&mut self) -> Option<Frame> {
        self.outbox.pop_front()
    }

    pub fn queued_frames(&self) -> usize {
        self.outbox.len()
    }
}

impl fmt::Debug for NegotiationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiationSession")
            .field("peer_id", &self.peer_id)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("pending_candidates", &self.pending_candidates.len())
            .field("channel_open", &self.channel_open)
            .field("outbox", &self.outbox.len())
            .finish()
    }
}
