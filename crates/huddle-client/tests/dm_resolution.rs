//! DM thread resolution behavior.
//!
//! The resolution contract is best-effort: sequential calls converge on
//! one thread per participant pair regardless of argument order, while
//! concurrently-created duplicates are tolerated rather than prevented.

use std::sync::Arc;

use huddle_client::{ChatApi, ClientError};
use huddle_core::{DmChat, DocumentStore, Timestamp, UserId, store::encode, types::collections};
use huddle_harness::{MemoryStore, SimClock};

fn api() -> ChatApi<MemoryStore, SimClock> {
    ChatApi::new(Arc::new(MemoryStore::new()), SimClock::new())
}

fn uid(id: &str) -> UserId {
    UserId::new(id)
}

#[tokio::test]
async fn first_resolution_creates_a_chat() {
    let api = api();

    let id = api.find_or_create_dm_chat(&uid("u1"), &uid("u2")).await.unwrap();

    let found = api.find_dm_chat(&uid("u1"), &uid("u2")).await.unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.data.participants, vec![uid("u1"), uid("u2")]);
    assert!(found.data.last_message.is_none());
}

#[tokio::test]
async fn sequential_resolutions_return_the_same_chat() {
    let api = api();

    let first = api.find_or_create_dm_chat(&uid("u1"), &uid("u2")).await.unwrap();
    let second = api.find_or_create_dm_chat(&uid("u1"), &uid("u2")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(api.store().document_count(collections::DM_CHATS), 1);
}

#[tokio::test]
async fn participant_order_does_not_matter() {
    let api = api();

    let forward = api.find_or_create_dm_chat(&uid("u1"), &uid("u2")).await.unwrap();
    let reversed = api.find_or_create_dm_chat(&uid("u2"), &uid("u1")).await.unwrap();

    assert_eq!(forward, reversed);
}

#[tokio::test]
async fn distinct_pairs_resolve_to_distinct_chats() {
    let api = api();

    let ab = api.find_or_create_dm_chat(&uid("a"), &uid("b")).await.unwrap();
    let ac = api.find_or_create_dm_chat(&uid("a"), &uid("c")).await.unwrap();

    assert_ne!(ab, ac);
    assert_eq!(api.store().document_count(collections::DM_CHATS), 2);
}

#[tokio::test]
async fn self_chat_is_rejected() {
    let api = api();

    let err = api.find_or_create_dm_chat(&uid("u1"), &uid("u1")).await.unwrap_err();
    assert_eq!(err, ClientError::SelfChat);
    assert_eq!(api.store().document_count(collections::DM_CHATS), 0);
}

#[tokio::test]
async fn duplicate_threads_from_a_lost_race_are_tolerated() {
    let api = api();

    // Simulate both participants creating the thread before either could
    // observe the other's write.
    let chat = DmChat {
        participants: vec![uid("u1"), uid("u2")],
        created_at: Timestamp::from_millis(1),
        updated_at: Timestamp::from_millis(1),
        last_message: None,
    };
    let twin = DmChat { participants: vec![uid("u2"), uid("u1")], ..chat.clone() };
    api.store().create(collections::DM_CHATS, encode(&chat).unwrap()).await.unwrap();
    api.store().create(collections::DM_CHATS, encode(&twin).unwrap()).await.unwrap();

    // Resolution still succeeds and settles on one of the twins.
    let resolved = api.find_or_create_dm_chat(&uid("u1"), &uid("u2")).await.unwrap();
    let chats = api.fetch_dm_chats(&uid("u1")).await.unwrap();
    assert_eq!(chats.len(), 2);
    assert!(chats.iter().any(|c| c.id == resolved));
}
