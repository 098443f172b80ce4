use beam_core::{PeerId, RoomId};
use beam_server::RelayCommand;

use crate::integration::{create_test_relay, init_tracing, join_room};
use crate::utils::{SignalEvent, next_event};

#[tokio::test]
async fn test_room_full_rejects_join() {
    init_tracing();

    let (relay_tx, mut signal_rx, signaling) = create_test_relay(2);
    let a = PeerId::new();
    let b = PeerId::new();
    let c = PeerId::new();
    let room = RoomId::from("pair");

    join_room(&relay_tx, &mut signal_rx, &a, &room).await;
    join_room(&relay_tx, &mut signal_rx, &b, &room).await;
    let _ = next_event(&mut signal_rx).await;

    relay_tx
        .send(RelayCommand::Join {
            peer_id: c.clone(),
            room_id: room.clone(),
        })
        .await
        .unwrap();

    match next_event(&mut signal_rx).await {
        SignalEvent::JoinRejected { to, room_id, reason } => {
            assert_eq!(to, c);
            assert_eq!(room_id, room);
            assert!(reason.contains("full"), "reason: {}", reason);
        }
        other => panic!("expected join-rejected, got {:?}", other),
    }

    assert_eq!(signaling.events_for(&a).await.len(), 2);
    assert_eq!(signaling.events_for(&b).await.len(), 1);
}
