use std::sync::Arc;

use serde_json::json;

use relay_core::{
    DirectoryService, DocumentStore, InMemoryStore, RelayConfig, ViewerRole,
};

async fn seed(store: &InMemoryStore, id: &str, data: serde_json::Value) {
    store
        .create("conversations", Some(id), data)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_directory_resolves_all_observed_encodings() {
    let store = Arc::new(InMemoryStore::new());

    seed(
        &store,
        "chat_alice_johnson",
        json!({
            "participantNames": ["Sarah Connor (HR)", "Alice Johnson"],
            "lastMessage": "Hi",
            "lastMessageTimestamp": "2026-03-01T12:03:00Z"
        }),
    )
    .await;
    seed(
        &store,
        "chat_bob_miller",
        json!({
            "participantNames": "[\"Sarah Connor (HR)\", \"Bob Miller\"]",
            "lastMessage": "Hello",
            "lastMessageTimestamp": "2026-03-01T12:01:00Z"
        }),
    )
    .await;
    seed(
        &store,
        "chat_carol_danvers",
        json!({
            "participantNames": ["[\"Sarah Connor (HR)\", \"Carol Danvers\"]"],
            "lastMessage": "Hey",
            "lastMessageTimestamp": "2026-03-01T12:02:00Z"
        }),
    )
    .await;

    let service = DirectoryService::new(
        Arc::clone(&store),
        &RelayConfig::new(ViewerRole::Primary),
    );
    let entries = service.load().await.unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.display_name.as_str()).collect();
    assert_eq!(names, vec!["Alice Johnson", "Carol Danvers", "Bob Miller"]);
    assert!(entries.iter().all(|e| !e.display_name.contains('[')));
}

#[tokio::test]
async fn test_directory_keeps_unresolvable_conversations() {
    let store = Arc::new(InMemoryStore::new());

    // Roster unusable, slug id carries the name.
    seed(&store, "chat_dana_reyes", json!({ "participantNames": "[broken" })).await;
    // No roster at all, the greeting heuristic fires.
    seed(
        &store,
        "x1",
        json!({ "lastMessage": "Hello Frank, welcome to the team" }),
    )
    .await;
    // Nothing usable anywhere; id prefix becomes the label.
    seed(&store, "opaque-document-key", json!({ "lastMessage": "..." })).await;

    let service = DirectoryService::new(
        Arc::clone(&store),
        &RelayConfig::new(ViewerRole::Primary),
    );
    let entries = service.load().await.unwrap();

    assert_eq!(entries.len(), 3);
    let mut names: Vec<&str> = entries.iter().map(|e| e.display_name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Dana Reyes", "Frank", "opaque-d"]);
}

#[tokio::test]
async fn test_directory_sorts_descending_with_pending_last() {
    let store = Arc::new(InMemoryStore::new());

    seed(&store, "t3", json!({ "lastMessageTimestamp": "2026-03-01T03:00:00Z" })).await;
    seed(&store, "t1", json!({ "lastMessageTimestamp": "2026-03-01T01:00:00Z" })).await;
    seed(&store, "pending", json!({})).await;
    seed(&store, "t2", json!({ "lastMessageTimestamp": "2026-03-01T02:00:00Z" })).await;

    let service = DirectoryService::new(
        Arc::clone(&store),
        &RelayConfig::new(ViewerRole::Primary),
    );
    let entries = service.load().await.unwrap();

    let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t2", "t1", "pending"]);
}

#[tokio::test]
async fn test_custom_resolver_constants() {
    let store = Arc::new(InMemoryStore::new());
    seed(
        &store,
        "c1",
        json!({ "participantNames": ["Morgan Lee (Staff)"] }),
    )
    .await;

    let mut config = RelayConfig::new(ViewerRole::Primary);
    config.resolver.primary_marker = "(Staff)".to_string();

    let service = DirectoryService::new(Arc::clone(&store), &config);
    let entries = service.load().await.unwrap();
    // The lone roster entry is staff-side under the injected marker; the
    // directory falls through to the id placeholder instead of showing it.
    assert_eq!(entries[0].display_name, "c1");
}
