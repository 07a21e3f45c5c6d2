use chrono::{DateTime, Duration, TimeZone, Utc};
use qwery_store::{
    FindOptions, Message, MessageRole, PaginationOptions, ProviderSchemas, Repository, Store,
    StoreConfig,
};
use serde_json::json;
use tempfile::TempDir;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

async fn seeded(count: i64) -> (TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir should be available");
    let store = Store::open(&StoreConfig::new(dir.path()), ProviderSchemas::new()).unwrap();
    let repo = store.messages();
    for i in 0..count {
        repo.create(
            Message::new("conv_1", MessageRole::User, json!({"text": format!("m{}", i)}))
                .with_created_at(base() + Duration::seconds(i)),
        )
        .await
        .expect("create should succeed");
    }
    repo.create(Message::new("conv_2", MessageRole::Assistant, json!({"text": "other"})))
        .await
        .unwrap();
    (dir, store)
}

fn texts(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .map(|m| m.content["text"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_pages_walk_backwards_in_time() {
    let (_dir, store) = seeded(5).await;
    let repo = store.messages();

    let first = repo
        .find_by_conversation_id_paginated("conv_1", &PaginationOptions::first(2))
        .await
        .expect("page should load");
    assert_eq!(texts(&first.items), vec!["m3", "m4"]);
    assert!(first.has_more);
    let cursor = first.next_cursor.clone().expect("cursor should be set");

    let second = repo
        .find_by_conversation_id_paginated("conv_1", &PaginationOptions::after(cursor, 2))
        .await
        .unwrap();
    assert_eq!(texts(&second.items), vec!["m1", "m2"]);
    assert!(second.has_more);

    let third = repo
        .find_by_conversation_id_paginated(
            "conv_1",
            &PaginationOptions::after(second.next_cursor.unwrap(), 2),
        )
        .await
        .unwrap();
    assert_eq!(texts(&third.items), vec!["m0"]);
    assert!(!third.has_more);

    let empty = repo
        .find_by_conversation_id_paginated(
            "conv_1",
            &PaginationOptions::after(third.next_cursor.unwrap(), 2),
        )
        .await
        .unwrap();
    assert!(empty.items.is_empty());
    assert!(!empty.has_more);
    assert_eq!(empty.next_cursor, None);
}

#[tokio::test]
async fn test_exact_page_has_no_more() {
    let (_dir, store) = seeded(2).await;
    let page = store
        .messages()
        .find_by_conversation_id_paginated("conv_1", &PaginationOptions::first(2))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_invalid_cursor_is_rejected() {
    let (_dir, store) = seeded(1).await;
    let result = store
        .messages()
        .find_by_conversation_id_paginated("conv_1", &PaginationOptions::after("not-a-date", 2))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_find_by_id_scans_conversations() {
    let (_dir, store) = seeded(3).await;
    let repo = store.messages();

    let all = repo.find_all(FindOptions::new()).await.unwrap();
    assert_eq!(all.len(), 4);
    let in_conv = repo.find_by_conversation_id("conv_1").await.unwrap();
    assert_eq!(texts(&in_conv), vec!["m0", "m1", "m2"]);

    let target = in_conv[1].clone();
    let found = repo.find_by_id(&target.id).await.unwrap().unwrap();
    assert_eq!(found, target);
    assert!(repo.find_by_slug("anything").await.unwrap().is_none());

    let path = store
        .storage()
        .root()
        .join("message")
        .join("conv_1")
        .join(format!("{}.json", target.id));
    assert!(path.exists());

    assert!(repo.delete(&target.id).await.unwrap());
    assert!(!path.exists());
    assert!(!repo.delete(&target.id).await.unwrap());
}

#[tokio::test]
async fn test_update_message_content() {
    let (_dir, store) = seeded(1).await;
    let repo = store.messages();
    let mut message = repo.find_by_conversation_id("conv_1").await.unwrap().remove(0);

    message.content = json!({"text": "edited"});
    let updated = repo.update(message.clone()).await.unwrap();
    assert_eq!(updated.content["text"], "edited");

    let found = repo.find_by_id(&message.id).await.unwrap().unwrap();
    assert_eq!(found.content["text"], "edited");
}
