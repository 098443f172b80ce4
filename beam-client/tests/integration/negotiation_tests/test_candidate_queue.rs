use beam_client::RemoteDescription;
use beam_core::{IceCandidate, PeerId, SignalEnvelope};
use serde_json::json;

use crate::integration::{Harness, candidate_json, init_tracing};
use crate::utils::TransportCall;

fn candidate(n: u32) -> IceCandidate {
    let SignalEnvelope::IceCandidate { candidate } =
        SignalEnvelope::from_value(candidate_json(n)).unwrap()
    else {
        unreachable!()
    };
    candidate
}

#[tokio::test]
async fn test_early_candidates_wait_for_offer_and_apply_in_order() {
    init_tracing();

    let mut h = Harness::new();
    let a = PeerId::new();

    h.negotiator.handle_signal(a.clone(), candidate_json(1)).await;
    h.negotiator.handle_signal(a.clone(), candidate_json(2)).await;

    let transport = h.factory.transport(&a).unwrap();
    assert!(transport.remote_inputs().is_empty());
    assert_eq!(h.negotiator.session(&a).unwrap().pending_candidate_count(), 2);

    h.negotiator
        .handle_signal(a.clone(), json!({ "type": "offer", "sdp": "remote-offer" }))
        .await;

    assert_eq!(
        transport.remote_inputs(),
        vec![
            TransportCall::ApplyRemote(RemoteDescription::Offer("remote-offer".to_string())),
            TransportCall::AddCandidate(candidate(1)),
            TransportCall::AddCandidate(candidate(2)),
        ]
    );
    assert_eq!(h.negotiator.session(&a).unwrap().pending_candidate_count(), 0);
}

#[tokio::test]
async fn test_candidates_after_description_apply_immediately() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.negotiator.handle_peer_joined(b.clone()).await;
    h.negotiator
        .handle_signal(b.clone(), json!({ "type": "answer", "sdp": "remote-answer" }))
        .await;

    h.negotiator.handle_signal(b.clone(), candidate_json(7)).await;

    let transport = h.factory.transport(&b).unwrap();
    assert_eq!(
        transport.remote_inputs().last(),
        Some(&TransportCall::AddCandidate(candidate(7)))
    );
    assert_eq!(h.negotiator.session(&b).unwrap().pending_candidate_count(), 0);
}

#[tokio::test]
async fn test_initiator_queues_candidates_until_answer() {
    init_tracing();

    let mut h = Harness::new();
    let b = PeerId::new();
    h.negotiator.handle_peer_joined(b.clone()).await;

    h.negotiator.handle_signal(b.clone(), candidate_json(3)).await;
    let transport = h.factory.transport(&b).unwrap();
    assert!(transport.remote_inputs().is_empty());

    h.negotiator
        .handle_signal(b.clone(), json!({ "type": "answer", "sdp": "remote-answer" }))
        .await;

    assert_eq!(
        transport.remote_inputs(),
        vec![
            TransportCall::ApplyRemote(RemoteDescription::Answer("remote-answer".to_string())),
            TransportCall::AddCandidate(candidate(3)),
        ]
    );
}

#[tokio::test]
async fn test_queued_and_inline_candidates_end_in_same_state() {
    init_tracing();

    let offer = json!({ "type": "offer", "sdp": "remote-offer" });

    let mut early = Harness::new();
    let a = PeerId::new();
    for n in 1..=3 {
        early.negotiator.handle_signal(a.clone(), candidate_json(n)).await;
    }
    early.negotiator.handle_signal(a.clone(), offer.clone()).await;

    let mut late = Harness::new();
    late.negotiator.handle_signal(a.clone(), offer).await;
    for n in 1..=3 {
        late.negotiator.handle_signal(a.clone(), candidate_json(n)).await;
    }

    assert_eq!(
        early.factory.transport(&a).unwrap().remote_inputs(),
        late.factory.transport(&a).unwrap().remote_inputs()
    );
}
