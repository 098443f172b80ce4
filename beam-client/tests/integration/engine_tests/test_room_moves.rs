use std::net::SocketAddr;
use std::sync::Arc;

use beam_client::{EngineHandle, RemoteDescription, Role, SessionState, TransportEvent};
use beam_core::{IceCandidate, PeerId};

use super::{eventually, spawn_fake_engine};
use crate::integration::{init_tracing, start_relay};
use crate::utils::{
    FakeTransportFactory, OBSERVE_TIMEOUT_MS, Observed, RecordingObserver, TransportCall,
};

async fn wait_status(observer: &RecordingObserver, text: &str) -> bool {
    observer
        .wait_for(OBSERVE_TIMEOUT_MS, |events| {
            events.contains(&Observed::Status(text.to_string()))
        })
        .await
}

/// `responder` has applied the offer from `initiator`.
async fn wait_offer_applied(responder: &Arc<FakeTransportFactory>, initiator: &PeerId) -> bool {
    eventually(OBSERVE_TIMEOUT_MS, || {
        responder.transport(initiator).is_some_and(|t| {
            t.remote_inputs()
                .iter()
                .any(|c| matches!(c, TransportCall::ApplyRemote(RemoteDescription::Offer(_))))
        })
    })
    .await
}

struct Pair {
    a: EngineHandle,
    observer_a: RecordingObserver,
    factory_a: Arc<FakeTransportFactory>,
    b: EngineHandle,
    observer_b: RecordingObserver,
    factory_b: Arc<FakeTransportFactory>,
}

/// Two engines negotiating with each other in `room`.
async fn pair_in(relay: SocketAddr, room: &str) -> Pair {
    let (a, observer_a, factory_a) = spawn_fake_engine(relay).await;
    let (b, observer_b, factory_b) = spawn_fake_engine(relay).await;

    a.join_room(room).await.unwrap();
    assert!(wait_status(&observer_a, &format!("Joined room: {room}")).await);
    b.join_room(room).await.unwrap();
    assert!(wait_offer_applied(&factory_b, a.local_peer_id()).await);

    Pair {
        a,
        observer_a,
        factory_a,
        b,
        observer_b,
        factory_b,
    }
}

#[tokio::test]
async fn test_rejected_move_keeps_signaling_in_current_room() {
    init_tracing();

    let relay = start_relay().await;
    let p = pair_in(relay, "lobby").await;
    let a_id = p.a.local_peer_id().clone();
    let b_id = p.b.local_peer_id().clone();

    let (c, _, _) = spawn_fake_engine(relay).await;
    let (d, observer_d, _) = spawn_fake_engine(relay).await;
    c.join_room("full").await.unwrap();
    d.join_room("full").await.unwrap();
    assert!(wait_status(&observer_d, "Joined room: full").await);

    p.a.join_room("full").await.unwrap();
    assert!(wait_status(&p.observer_a, "Room full is full").await);
    assert!(
        !p.observer_a
            .statuses()
            .await
            .contains(&"Joined room: full".to_string())
    );

    // A candidate gathered after the rejection still reaches the lobby peer.
    let candidate = IceCandidate::new("candidate:9 1 udp 2122260223 127.0.0.1 50009 typ host");
    p.factory_a
        .emit(
            &b_id,
            TransportEvent::CandidateGenerated(b_id.clone(), candidate.clone()),
        )
        .await;

    let transport_b = p.factory_b.transport(&a_id).unwrap();
    let delivered = eventually(OBSERVE_TIMEOUT_MS, || {
        transport_b
            .remote_inputs()
            .contains(&TransportCall::AddCandidate(candidate.clone()))
    })
    .await;
    assert!(delivered, "candidate was not relayed to the lobby peer");
    assert_eq!(
        p.observer_a.states_for(&b_id).await.last(),
        Some(&SessionState::Negotiating(Role::Initiator))
    );

    for engine in [p.a, p.b, c, d] {
        engine.shutdown().await;
    }
}

#[tokio::test]
async fn test_accepted_move_closes_sessions_of_previous_room() {
    init_tracing();

    let relay = start_relay().await;
    let p = pair_in(relay, "lobby").await;
    let a_id = p.a.local_peer_id().clone();
    let b_id = p.b.local_peer_id().clone();

    p.a.join_room("other").await.unwrap();
    assert!(wait_status(&p.observer_a, "Joined room: other").await);

    let closed_a = p
        .observer_a
        .wait_for(OBSERVE_TIMEOUT_MS, |events| {
            events.contains(&Observed::State(b_id.clone(), SessionState::Closed))
        })
        .await;
    let closed_b = p
        .observer_b
        .wait_for(OBSERVE_TIMEOUT_MS, |events| {
            events.contains(&Observed::State(a_id.clone(), SessionState::Closed))
        })
        .await;
    assert!(closed_a && closed_b, "lobby session survived the move");
    assert!(p.factory_a.transport(&b_id).unwrap().is_closed());

    p.a.shutdown().await;
    p.b.shutdown().await;
}
