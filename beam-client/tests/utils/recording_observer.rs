use async_trait::async_trait;
use beam_client::{EngineObserver, ReceivedFile, SessionState};
use beam_core::PeerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const OBSERVE_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Status(String),
    State(PeerId, SessionState),
    File(PeerId, ReceivedFile),
}

/// Observer that keeps everything it is told, in order.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<Observed>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<Observed> {
        self.events.lock().await.clone()
    }

    pub async fn statuses(&self) -> Vec<String> {
        self.events()
            .await
            .into_iter()
            .filter_map(|e| match e {
                Observed::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub async fn states_for(&self, peer_id: &PeerId) -> Vec<SessionState> {
        self.events()
            .await
            .into_iter()
            .filter_map(|e| match e {
                Observed::State(p, s) if &p == peer_id => Some(s),
                _ => None,
            })
            .collect()
    }

    pub async fn files(&self) -> Vec<ReceivedFile> {
        self.events()
            .await
            .into_iter()
            .filter_map(|e| match e {
                Observed::File(_, f) => Some(f),
                _ => None,
            })
            .collect()
    }

    /// Poll until `predicate` holds for the recorded events.
    pub async fn wait_for<F>(&self, timeout_ms: u64, predicate: F) -> bool
    where
        F: Fn(&[Observed]) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if predicate(self.events.lock().await.as_slice()) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

#[async_trait]
impl EngineObserver for RecordingObserver {
    async fn on_status(&self, text: String) {
        self.events.lock().await.push(Observed::Status(text));
    }

    async fn on_session_state(&self, peer_id: PeerId, state: SessionState) {
        self.events.lock().await.push(Observed::State(peer_id, state));
    }

    async fn on_transfer_complete(&self, peer_id: PeerId, file: ReceivedFile) {
        self.events.lock().await.push(Observed::File(peer_id, file));
    }
}
