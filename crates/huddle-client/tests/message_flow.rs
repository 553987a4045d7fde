//! Message send, edit, delete, preview, and read-receipt behavior.

use std::sync::Arc;

use huddle_client::ChatApi;
use huddle_core::{DocId, DocumentStore, UserId, types::collections};
use huddle_harness::{MemoryStore, SimClock};

struct Fixture {
    api: ChatApi<MemoryStore, SimClock>,
    clock: SimClock,
}

fn fixture() -> Fixture {
    let clock = SimClock::new();
    let api = ChatApi::new(Arc::new(MemoryStore::new()), clock.clone());
    Fixture { api, clock }
}

fn uid(id: &str) -> UserId {
    UserId::new(id)
}

#[tokio::test]
async fn posted_messages_fetch_in_created_order() {
    let f = fixture();
    let channel = f.api.create_channel("general").await.unwrap();

    f.api.post_channel_message(&uid("u1"), &channel, "first").await.unwrap();
    f.clock.advance(10);
    f.api.post_channel_message(&uid("u2"), &channel, "second").await.unwrap();

    let messages = f.api.fetch_channel_messages(&channel).await.unwrap();
    let texts: Vec<&str> = messages.iter().map(|m| m.data.text.as_str()).collect();
    assert_eq!(texts, ["first", "second"]);
}

#[tokio::test]
async fn equal_timestamps_fetch_in_id_order() {
    let f = fixture();
    let channel = f.api.create_channel("general").await.unwrap();

    // Clock never advances: both messages share a created_at.
    let first = f.api.post_channel_message(&uid("u1"), &channel, "a").await.unwrap();
    let second = f.api.post_channel_message(&uid("u1"), &channel, "b").await.unwrap();

    let messages = f.api.fetch_channel_messages(&channel).await.unwrap();
    let ids: Vec<&DocId> = messages.iter().map(|m| &m.id).collect();
    assert_eq!(ids, [&first, &second]);
}

#[tokio::test]
async fn messages_stay_inside_their_channel() {
    let f = fixture();
    let general = f.api.create_channel("general").await.unwrap();
    let random = f.api.create_channel("random").await.unwrap();

    f.api.post_channel_message(&uid("u1"), &general, "here").await.unwrap();

    assert_eq!(f.api.fetch_channel_messages(&general).await.unwrap().len(), 1);
    assert!(f.api.fetch_channel_messages(&random).await.unwrap().is_empty());
}

#[tokio::test]
async fn editing_marks_the_message_and_keeps_its_author() {
    let f = fixture();
    let channel = f.api.create_channel("general").await.unwrap();
    let id = f.api.post_channel_message(&uid("u1"), &channel, "typo").await.unwrap();

    f.clock.advance(100);
    f.api.edit_channel_message(&id, "fixed").await.unwrap();

    let messages = f.api.fetch_channel_messages(&channel).await.unwrap();
    let message = &messages[0].data;
    assert_eq!(message.text, "fixed");
    assert!(message.is_edited);
    assert_eq!(message.author_id, uid("u1"));
    assert!(message.updated_at > message.created_at);
}

#[tokio::test]
async fn deleting_twice_surfaces_the_store_error() {
    let f = fixture();
    let channel = f.api.create_channel("general").await.unwrap();
    let id = f.api.post_channel_message(&uid("u1"), &channel, "gone").await.unwrap();

    f.api.delete_channel_message(&id).await.unwrap();
    let err = f.api.delete_channel_message(&id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn dm_send_refreshes_the_parent_preview() {
    let f = fixture();
    let chat = f.api.find_or_create_dm_chat(&uid("u1"), &uid("u2")).await.unwrap();

    f.clock.advance(50);
    f.api.send_dm_message(&chat, &uid("u1"), "hello there").await.unwrap();

    let chats = f.api.fetch_dm_chats(&uid("u2")).await.unwrap();
    let parent = &chats[0];
    assert_eq!(parent.id, chat);
    let preview = parent.data.last_message.as_ref().unwrap();
    assert_eq!(preview.text, "hello there");
    assert_eq!(preview.sender_id, uid("u1"));
    assert_eq!(parent.data.updated_at, preview.sent_at);
    assert!(parent.data.updated_at > parent.data.created_at);
}

#[tokio::test]
async fn dm_list_orders_by_most_recent_activity() {
    let f = fixture();
    let with_b = f.api.find_or_create_dm_chat(&uid("a"), &uid("b")).await.unwrap();
    f.clock.advance(10);
    let with_c = f.api.find_or_create_dm_chat(&uid("a"), &uid("c")).await.unwrap();

    // Newest chat leads until the older one sees activity.
    let chats = f.api.fetch_dm_chats(&uid("a")).await.unwrap();
    assert_eq!(chats[0].id, with_c);

    f.clock.advance(10);
    f.api.send_dm_message(&with_b, &uid("a"), "bump").await.unwrap();

    let chats = f.api.fetch_dm_chats(&uid("a")).await.unwrap();
    assert_eq!(chats[0].id, with_b);
}

#[tokio::test]
async fn failed_preview_write_leaves_the_message_behind() {
    let f = fixture();
    let chat = f.api.find_or_create_dm_chat(&uid("u1"), &uid("u2")).await.unwrap();

    // First write (the message create) succeeds, the parent patch fails.
    f.api.store().fail_writes_after(1);
    let err = f.api.send_dm_message(&chat, &uid("u1"), "half sent").await;
    assert!(err.is_err());

    let messages = f.api.fetch_dm_messages(&chat).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].data.text, "half sent");

    let chats = f.api.fetch_dm_chats(&uid("u1")).await.unwrap();
    assert!(chats[0].data.last_message.is_none(), "preview must be stale, not partially written");
}

#[tokio::test]
async fn mark_read_flips_the_whole_batch() {
    let f = fixture();
    let chat = f.api.find_or_create_dm_chat(&uid("u1"), &uid("u2")).await.unwrap();

    let first = f.api.send_dm_message(&chat, &uid("u2"), "one").await.unwrap();
    let second = f.api.send_dm_message(&chat, &uid("u2"), "two").await.unwrap();

    f.api.mark_read(&[first, second]).await.unwrap();

    let messages = f.api.fetch_dm_messages(&chat).await.unwrap();
    assert!(messages.iter().all(|m| m.data.is_read));
}

#[tokio::test]
async fn mark_read_with_no_ids_is_a_no_op() {
    let f = fixture();
    f.api.mark_read(&[]).await.unwrap();
    assert_eq!(f.api.store().document_count(collections::DM_MESSAGES), 0);
}

#[tokio::test]
async fn rename_stamps_the_channel() {
    let f = fixture();
    let id = f.api.create_channel("genral").await.unwrap();

    f.clock.advance(5);
    f.api.rename_channel(&id, "general").await.unwrap();

    let doc = f.api.store().get(collections::CHANNELS, &id).await.unwrap().unwrap();
    assert_eq!(doc.get("name").and_then(|v| v.as_str()), Some("general"));
    assert!(doc.contains_key("updated_at"));
}

#[tokio::test]
async fn user_directory_search_matches_name_and_email() {
    let f = fixture();
    let profile = |name: &str, email: &str| huddle_core::UserProfile {
        display_name: name.to_owned(),
        email: email.to_owned(),
        profile_picture: String::new(),
        is_online: false,
    };
    f.api.put_user(&uid("u1"), &profile("Ada Lovelace", "ada@example.com")).await.unwrap();
    f.api.put_user(&uid("u2"), &profile("Grace Hopper", "grace@example.com")).await.unwrap();

    let by_name = f.api.search_users("ada").await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].data.display_name, "Ada Lovelace");

    let by_email = f.api.search_users("GRACE@").await.unwrap();
    assert_eq!(by_email.len(), 1);

    let everyone = f.api.search_users("   ").await.unwrap();
    assert_eq!(everyone.len(), 2);
}

#[tokio::test]
async fn workplace_creation_records_the_owner_membership() {
    let f = fixture();
    let id = f.api.create_workplace(&uid("u1"), "Acme", Some("the works")).await.unwrap();

    let mine = f.api.list_workplaces(&uid("u1")).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, id);
    assert_eq!(mine[0].data.name, "Acme");

    assert!(f.api.list_workplaces(&uid("u2")).await.unwrap().is_empty());
}
