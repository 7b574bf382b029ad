use huddle_core::{ClientMessage, ConnectionId, ServerMessage};

use crate::utils::{candidate, join_room_default, recv_wire, settle};

#[tokio::test]
async fn candidates_ahead_of_the_description_are_buffered_then_flushed_in_order() {
    let mut h = join_room_default().await;

    let bob = h.snapshot_peer("bob").await;
    for n in 1..=3 {
        h.server_tx
            .send(ServerMessage::IceCandidate {
                from: bob.connection_id,
                candidate: candidate(n),
            })
            .await
            .expect("manager loop is gone");
    }

    settle().await;
    assert!(
        h.connector
            .link(bob.connection_id)
            .applied_candidates()
            .is_empty(),
        "no candidate may reach the transport before the remote description"
    );

    h.server_tx
        .send(ServerMessage::Offer {
            from: bob.connection_id,
            sdp: "v=0 bob-offer".to_owned(),
            participant_id: bob.participant_id.clone(),
            display_name: bob.display_name.clone(),
        })
        .await
        .expect("manager loop is gone");
    assert!(matches!(
        recv_wire(&mut h.wire).await,
        ClientMessage::Answer { .. }
    ));

    assert_eq!(
        h.connector.link(bob.connection_id).applied_candidates(),
        vec![candidate(1), candidate(2), candidate(3)]
    );

    // Once the description is in place, candidates go straight through.
    h.server_tx
        .send(ServerMessage::IceCandidate {
            from: bob.connection_id,
            candidate: candidate(4),
        })
        .await
        .expect("manager loop is gone");
    settle().await;
    assert_eq!(
        h.connector.link(bob.connection_id).applied_candidates(),
        vec![candidate(1), candidate(2), candidate(3), candidate(4)]
    );
}

#[tokio::test]
async fn duplicate_candidates_are_applied_once() {
    let mut h = join_room_default().await;

    let bob = h.snapshot_peer("bob").await;
    h.server_tx
        .send(ServerMessage::IceCandidate {
            from: bob.connection_id,
            candidate: candidate(1),
        })
        .await
        .expect("manager loop is gone");
    h.server_tx
        .send(ServerMessage::IceCandidate {
            from: bob.connection_id,
            candidate: candidate(1),
        })
        .await
        .expect("manager loop is gone");

    h.server_tx
        .send(ServerMessage::Offer {
            from: bob.connection_id,
            sdp: "v=0 bob-offer".to_owned(),
            participant_id: bob.participant_id.clone(),
            display_name: bob.display_name.clone(),
        })
        .await
        .expect("manager loop is gone");
    assert!(matches!(
        recv_wire(&mut h.wire).await,
        ClientMessage::Answer { .. }
    ));

    // The replay after the description is deduplicated too.
    h.server_tx
        .send(ServerMessage::IceCandidate {
            from: bob.connection_id,
            candidate: candidate(1),
        })
        .await
        .expect("manager loop is gone");
    h.server_tx
        .send(ServerMessage::IceCandidate {
            from: bob.connection_id,
            candidate: candidate(2),
        })
        .await
        .expect("manager loop is gone");

    settle().await;
    assert_eq!(
        h.connector.link(bob.connection_id).applied_candidates(),
        vec![candidate(1), candidate(2)]
    );
}

#[tokio::test]
async fn candidate_for_an_untracked_connection_is_dropped() {
    let mut h = join_room_default().await;

    h.server_tx
        .send(ServerMessage::IceCandidate {
            from: ConnectionId::new(),
            candidate: candidate(1),
        })
        .await
        .expect("manager loop is gone");

    settle().await;
    assert_eq!(h.connector.link_count(), 0);

    // The loop is still alive and serving.
    h.peer_joins("bob").await;
}
