use beam_client::{ClientError, OutgoingFile, TransportEvent};
use beam_core::PeerId;
use bytes::Bytes;

use crate::integration::{Harness, init_tracing};
use crate::utils::TransportCall;

const A_TXT_METADATA: &str =
    r#"{"type":"file-metadata","data":{"fileName":"a.txt","fileType":"text/plain"}}"#;

#[tokio::test]
async fn test_send_on_open_channel_writes_metadata_then_payload() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.connect_as_initiator(&b).await;

    let file = OutgoingFile::new("a.txt", "text/plain", "hello");
    h.negotiator.send_file(&b, &file).await.unwrap();

    assert_eq!(
        h.factory.transport(&b).unwrap().sent(),
        vec![
            TransportCall::SendText(A_TXT_METADATA.to_string()),
            TransportCall::SendBinary(Bytes::from_static(b"hello")),
        ]
    );
    assert_eq!(h.observer.statuses().await.last().map(String::as_str), Some("File sent"));
}

#[tokio::test]
async fn test_send_before_channel_open_is_queued() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.negotiator.handle_peer_joined(b.clone()).await;

    let file = OutgoingFile::new("a.txt", "text/plain", "hello");
    assert_eq!(h.negotiator.send_file_to_all(&file).await.unwrap(), 1);

    let transport = h.factory.transport(&b).unwrap();
    assert!(transport.sent().is_empty());
    assert_eq!(h.negotiator.session(&b).unwrap().queued_frames(), 2);

    h.negotiator
        .handle_transport_event(TransportEvent::ChannelOpen(b.clone()))
        .await;

    assert_eq!(
        transport.sent(),
        vec![
            TransportCall::SendText(A_TXT_METADATA.to_string()),
            TransportCall::SendBinary(Bytes::from_static(b"hello")),
        ]
    );
    assert_eq!(h.negotiator.session(&b).unwrap().queued_frames(), 0);
}

#[tokio::test]
async fn test_send_without_peer_fails() {
    init_tracing();

    let mut h = Harness::new();
    let file = OutgoingFile::new("a.txt", "text/plain", "hello");

    assert!(matches!(
        h.negotiator.send_file_to_all(&file).await,
        Err(ClientError::NoPeer)
    ));

    let stranger = PeerId::new();
    assert!(matches!(
        h.negotiator.send_file(&stranger, &file).await,
        Err(ClientError::SessionNotFound(p)) if p == stranger
    ));
}
