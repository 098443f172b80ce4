mod test_room_moves;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use beam_client::{BeamEngine, EngineConfig, EngineHandle, TransportConfig};

use crate::utils::{FakeTransportFactory, RecordingObserver};

pub async fn spawn_engine(relay: SocketAddr) -> (EngineHandle, RecordingObserver) {
    let observer = RecordingObserver::new();
    let config = EngineConfig::new(format!("ws://{}/ws", relay))
        .with_transport(TransportConfig::local());

    let handle = BeamEngine::connect(config, Arc::new(observer.clone()))
        .await
        .expect("Engine failed to connect to relay");

    (handle, observer)
}

/// An engine on the real relay whose peer transports are fakes.
pub async fn spawn_fake_engine(
    relay: SocketAddr,
) -> (EngineHandle, RecordingObserver, Arc<FakeTransportFactory>) {
    let observer = RecordingObserver::new();
    let factory = Arc::new(FakeTransportFactory::new());
    let config = EngineConfig::new(format!("ws://{}/ws", relay));

    let handle =
        BeamEngine::connect_with_transport(config, factory.clone(), Arc::new(observer.clone()))
            .await
            .expect("Engine failed to connect to relay");

    (handle, observer, factory)
}

/// Poll `check` until it holds or `timeout_ms` elapses.
pub async fn eventually<F>(timeout_ms: u64, check: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
