use async_trait::async_trait;
use beam::PeerId;
use beam::client::{EngineObserver, ReceivedFile, SessionState};
use colored::*;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum UiEvent {
    Status(String),
    State(PeerId, SessionState),
    File(PeerId, ReceivedFile),
}

/// Prints status lines and forwards every event to the command loop.
pub struct CliObserver {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl CliObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EngineObserver for CliObserver {
    async fn on_status(&self, text: String) {
        let line = match text.as_str() {
            "Connected to peer" | "File sent" | "File received" => text.green().bold(),
            "Connection failed" | "Transfer aborted" => text.red().bold(),
            t if t.ends_with("is full") => text.red().bold(),
            _ => text.cyan(),
        };
        println!("{}", line);
        let _ = self.tx.send(UiEvent::Status(text));
    }

    async fn on_session_state(&self, peer_id: PeerId, state: SessionState) {
        let _ = self.tx.send(UiEvent::State(peer_id, state));
    }

    async fn on_transfer_complete(&self, peer_id: PeerId, file: ReceivedFile) {
        let _ = self.tx.send(UiEvent::File(peer_id, file));
    }
}
