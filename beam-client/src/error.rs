use beam_core::PeerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no session with peer {0}")]
    SessionNotFound(PeerId),

    #[error("no peer to send to")]
    NoPeer,

    #[error("{size} byte payload exceeds the {max} byte message limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("relay protocol error: {0}")]
    Relay(String),

    #[error("relay connection failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("engine is not running")]
    EngineStopped,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}
