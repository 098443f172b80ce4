use beam_core::{IceCandidate, PeerId};
use bytes::Bytes;

/// Connection-level state, decoupled from the WebRTC crate's enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events a transport pushes to the negotiation loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// Local trickle-ICE candidate that must go out through the relay.
    CandidateGenerated(PeerId, IceCandidate),

    StateChanged(PeerId, LinkState),

    /// The data channel can carry transfer frames.
    ChannelOpen(PeerId),

    /// Raw data-channel message. `is_text` is the transport's string flag.
    Message {
        peer_id: PeerId,
        is_text: bool,
        data: Bytes,
    },

    ChannelClosed(PeerId),
}
