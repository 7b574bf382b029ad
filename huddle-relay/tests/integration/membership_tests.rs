use std::time::Duration;

use huddle_core::{RoomId, ServerMessage};
use huddle_relay::{RoomCommand, RoomManager};
use std::sync::Arc;

use crate::integration::{create_test_room, init_tracing, member, recv};
use crate::utils::MockSignalingOutput;

#[tokio::test]
async fn first_join_gets_empty_snapshot() {
    init_tracing();
    let (cmd_tx, _signaling, mut rx) = create_test_room("r1");

    let alice = member("alice");
    cmd_tx
        .send(RoomCommand::Join {
            member: alice.clone(),
        })
        .await
        .unwrap();

    let (to, msg) = recv(&mut rx).await;
    assert_eq!(to, alice.connection_id);
    assert_eq!(msg, ServerMessage::ExistingMembers { members: vec![] });
}

#[tokio::test]
async fn second_join_gets_snapshot_and_first_member_gets_broadcast() {
    init_tracing();
    let (cmd_tx, _signaling, mut rx) = create_test_room("r1");

    let alice = member("alice");
    let bob = member("bob");

    cmd_tx
        .send(RoomCommand::Join {
            member: alice.clone(),
        })
        .await
        .unwrap();
    recv(&mut rx).await; // alice's empty snapshot

    cmd_tx
        .send(RoomCommand::Join { member: bob.clone() })
        .await
        .unwrap();

    let (to, msg) = recv(&mut rx).await;
    assert_eq!(to, bob.connection_id);
    assert_eq!(
        msg,
        ServerMessage::ExistingMembers {
            members: vec![alice.clone()]
        }
    );

    let (to, msg) = recv(&mut rx).await;
    assert_eq!(to, alice.connection_id);
    assert_eq!(msg, ServerMessage::ParticipantJoined { member: bob });
}

#[tokio::test]
async fn leave_broadcasts_exactly_once_even_when_paths_race() {
    init_tracing();
    let (cmd_tx, signaling, mut rx) = create_test_room("r1");

    let alice = member("alice");
    let bob = member("bob");
    let carol = member("carol");

    for m in [&alice, &bob, &carol] {
        cmd_tx
            .send(RoomCommand::Join { member: m.clone() })
            .await
            .unwrap();
    }
    // 1 snapshot + (1 snapshot + 1 broadcast) + (1 snapshot + 2 broadcasts)
    for _ in 0..6 {
        recv(&mut rx).await;
    }

    // Explicit leave and the disconnect path racing for the same
    // connection: the second command must be a no-op.
    cmd_tx
        .send(RoomCommand::Leave {
            connection_id: bob.connection_id,
        })
        .await
        .unwrap();
    cmd_tx
        .send(RoomCommand::Leave {
            connection_id: bob.connection_id,
        })
        .await
        .unwrap();

    let (_, msg) = recv(&mut rx).await;
    assert_eq!(
        msg,
        ServerMessage::ParticipantLeft {
            connection_id: bob.connection_id
        }
    );
    let (_, msg) = recv(&mut rx).await;
    assert_eq!(
        msg,
        ServerMessage::ParticipantLeft {
            connection_id: bob.connection_id
        }
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    let left_count = signaling
        .sent()
        .await
        .iter()
        .filter(|(_, m)| matches!(m, ServerMessage::ParticipantLeft { .. }))
        .count();
    assert_eq!(left_count, 2, "one broadcast to alice and one to carol");
}

#[tokio::test]
async fn rejoin_on_same_connection_replaces_membership() {
    init_tracing();
    let (cmd_tx, signaling, mut rx) = create_test_room("r1");

    let alice = member("alice");
    let bob = member("bob");

    cmd_tx
        .send(RoomCommand::Join {
            member: alice.clone(),
        })
        .await
        .unwrap();
    cmd_tx
        .send(RoomCommand::Join { member: bob.clone() })
        .await
        .unwrap();
    for _ in 0..3 {
        recv(&mut rx).await;
    }

    cmd_tx
        .send(RoomCommand::Join {
            member: alice.clone(),
        })
        .await
        .unwrap();

    // The snapshot never lists the rejoining connection itself.
    let (to, msg) = recv(&mut rx).await;
    assert_eq!(to, alice.connection_id);
    assert_eq!(
        msg,
        ServerMessage::ExistingMembers {
            members: vec![bob.clone()]
        }
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(
        signaling
            .sent()
            .await
            .iter()
            .all(|(_, m)| !matches!(m, ServerMessage::ParticipantLeft { .. })),
        "a rejoin must not look like a departure"
    );
}

#[tokio::test]
async fn room_record_persists_after_the_last_leave() {
    init_tracing();
    let (cmd_tx, _signaling, mut rx) = create_test_room("r1");

    let alice = member("alice");
    cmd_tx
        .send(RoomCommand::Join {
            member: alice.clone(),
        })
        .await
        .unwrap();
    recv(&mut rx).await;

    cmd_tx
        .send(RoomCommand::Leave {
            connection_id: alice.connection_id,
        })
        .await
        .unwrap();

    // The actor outlives an emptied membership: a later join lands in
    // the same room and gets a fresh empty snapshot.
    let bob = member("bob");
    cmd_tx
        .send(RoomCommand::Join { member: bob.clone() })
        .await
        .unwrap();

    let (to, msg) = recv(&mut rx).await;
    assert_eq!(to, bob.connection_id);
    assert_eq!(msg, ServerMessage::ExistingMembers { members: vec![] });
}

#[tokio::test]
async fn rooms_are_independent() {
    init_tracing();
    let (signaling, _signal_rx) = MockSignalingOutput::new();
    let manager = RoomManager::new(Arc::new(signaling.clone()));

    let standup = manager.get_room_sender(&RoomId::from("standup"));
    let retro = manager.get_room_sender(&RoomId::from("retro"));

    let alice = member("alice");
    let bob = member("bob");

    standup
        .send(RoomCommand::Join {
            member: alice.clone(),
        })
        .await
        .unwrap();
    retro
        .send(RoomCommand::Join { member: bob.clone() })
        .await
        .unwrap();

    standup
        .send(RoomCommand::Leave {
            connection_id: alice.connection_id,
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Bob only ever saw his own snapshot; nothing leaked across rooms.
    let to_bob = signaling.sent_to(&bob.connection_id).await;
    assert_eq!(
        to_bob,
        vec![ServerMessage::ExistingMembers { members: vec![] }]
    );
}
