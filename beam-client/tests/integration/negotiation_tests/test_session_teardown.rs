use beam_client::{LinkState, SessionState, TransportEvent};
use beam_core::PeerId;
use bytes::Bytes;

use crate::integration::{Harness, init_tracing};

#[tokio::test]
async fn test_peer_left_closes_session() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.connect_as_initiator(&b).await;

    h.negotiator.handle_peer_left(b.clone()).await;

    assert_eq!(h.negotiator.session_state(&b), None);
    assert_eq!(
        h.observer.states_for(&b).await.last(),
        Some(&SessionState::Closed)
    );
    assert!(h.observer.statuses().await.contains(&"Peer left".to_string()));
    assert!(h.factory.transport(&b).unwrap().is_closed());
}

#[tokio::test]
async fn test_failed_link_marks_session_failed() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.connect_as_initiator(&b).await;

    h.negotiator
        .handle_transport_event(TransportEvent::StateChanged(b.clone(), LinkState::Failed))
        .await;

    assert_eq!(
        h.observer.states_for(&b).await.last(),
        Some(&SessionState::Failed)
    );
    assert!(h.observer.statuses().await.contains(&"Connection failed".to_string()));
}

#[tokio::test]
async fn test_disconnect_aborts_pending_transfer() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.connect_as_initiator(&b).await;

    let metadata = r#"{"type":"file-metadata","data":{"fileName":"a.txt","fileType":"text/plain"}}"#;
    h.negotiator
        .handle_transport_event(TransportEvent::Message {
            peer_id: b.clone(),
            is_text: true,
            data: Bytes::from_static(metadata.as_bytes()),
        })
        .await;

    h.negotiator
        .handle_transport_event(TransportEvent::ChannelClosed(b.clone()))
        .await;

    let statuses = h.observer.statuses().await;
    assert!(statuses.contains(&"Transfer aborted".to_string()));
    assert!(h.observer.files().await.is_empty());
    assert_eq!(h.negotiator.session_state(&b), None);
}

#[tokio::test]
async fn test_events_after_close_are_ignored() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.connect_as_initiator(&b).await;
    h.negotiator.handle_peer_left(b.clone()).await;
    let recorded = h.observer.events().await.len();

    h.negotiator
        .handle_transport_event(TransportEvent::StateChanged(b.clone(), LinkState::Closed))
        .await;
    h.negotiator
        .handle_transport_event(TransportEvent::Message {
            peer_id: b.clone(),
            is_text: false,
            data: Bytes::from_static(b"late"),
        })
        .await;
    h.negotiator.handle_peer_left(b).await;

    assert_eq!(h.observer.events().await.len(), recorded);
}

#[tokio::test]
async fn test_close_all_closes_every_session() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.connect_as_initiator(&b).await;

    h.negotiator.close_all().await;

    assert!(h.negotiator.peers().is_empty());
    assert!(h.factory.transport(&b).unwrap().is_closed());
}
