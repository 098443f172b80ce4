use beam_core::{PeerId, RoomId};
use beam_server::RelayCommand;

use crate::integration::{create_test_relay, init_tracing, join_room};
use crate::utils::{SignalEvent, next_event};

#[tokio::test]
async fn test_peer_joined_goes_to_earlier_member() {
    init_tracing();

    let (relay_tx, mut signal_rx, signaling) = create_test_relay(2);
    let a = PeerId::new();
    let b = PeerId::new();
    let room = RoomId::from("r1");

    join_room(&relay_tx, &mut signal_rx, &a, &room).await;
    join_room(&relay_tx, &mut signal_rx, &b, &room).await;

    let event = next_event(&mut signal_rx).await;
    assert_eq!(
        event,
        SignalEvent::PeerJoined {
            to: a.clone(),
            peer_id: b.clone()
        }
    );

    assert_eq!(signaling.events_for(&a).await.len(), 2);
    assert_eq!(
        signaling.events_for(&b).await,
        vec![SignalEvent::JoinAccepted {
            to: b.clone(),
            room_id: room
        }],
        "the later joiner must not be told about the earlier one"
    );
}

#[tokio::test]
async fn test_rejoin_same_room_is_acknowledged_without_notices() {
    init_tracing();

    let (relay_tx, mut signal_rx, _signaling) = create_test_relay(2);
    let a = PeerId::new();
    let b = PeerId::new();
    let room = RoomId::from("r1");

    join_room(&relay_tx, &mut signal_rx, &a, &room).await;
    join_room(&relay_tx, &mut signal_rx, &b, &room).await;
    assert!(matches!(
        next_event(&mut signal_rx).await,
        SignalEvent::PeerJoined { .. }
    ));

    // A duplicate peer-joined would arrive between the ack and the leave.
    join_room(&relay_tx, &mut signal_rx, &b, &room).await;
    relay_tx
        .send(RelayCommand::Leave { peer_id: b.clone() })
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut signal_rx).await,
        SignalEvent::PeerLeft {
            to: a,
            peer_id: b
        }
    );
}
