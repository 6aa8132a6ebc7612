use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::api::fallback_models;
use crate::core::config::DEFAULT_MODEL;
use crate::core::conversation::DEFAULT_TITLE;
use crate::core::conversation_store::{load_conversations, CONVERSATIONS_KEY};
use crate::core::message::Role;
use crate::core::storage::{MemoryStore, StorageResult};
use crate::utils::test_utils::{
    delta_record, test_client, test_config, unreachable_base_url, CannedResponse, MockServer,
};

type TestController = ChatController<Arc<MemoryStore>>;

fn controller(store: &Arc<MemoryStore>, config: ApiConfig) -> TestController {
    ChatController::load(Arc::clone(store), test_client()).with_config(config)
}

fn stream_of(parts: &[&str]) -> CannedResponse {
    let mut records: Vec<String> = parts.iter().map(|p| delta_record(p)).collect();
    records.push("data: [DONE]\n\n".to_string());
    CannedResponse::event_stream(records)
}

#[test]
fn loading_activates_most_recent_conversation() {
    let store = Arc::new(MemoryStore::new());
    let mut first = TestController::load(Arc::clone(&store), test_client());
    assert!(first.active_id().is_none());

    let older = first.new_chat().unwrap().id.clone();
    let newer = first.new_chat().unwrap().id.clone();
    std::thread::sleep(Duration::from_millis(5));
    first.select(&older).unwrap();
    first.rename(&older, "Bumped").unwrap();

    let reloaded = TestController::load(Arc::clone(&store), test_client());
    assert_eq!(reloaded.active_id(), Some(older.as_str()));
    let ids: Vec<&str> = reloaded.conversations().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![older.as_str(), newer.as_str()]);
}

#[tokio::test]
async fn streamed_reply_is_persisted_and_titles_the_conversation() {
    let server = MockServer::start(vec![stream_of(&["Hel", "lo"])]).await;
    let store = Arc::new(MemoryStore::new());
    let mut chat = controller(&store, server.config());

    let mut seen = Vec::new();
    let reply = chat
        .send("  What is Rust?  ", |fragment| seen.push(fragment.to_string()))
        .await
        .expect("send should succeed");

    assert_eq!(reply, "Hello");
    assert_eq!(seen, vec!["Hel", "lo"]);

    let id = chat.active_id().expect("conversation created").to_string();
    assert_eq!(chat.status(&id), RequestStatus::Idle);
    assert!(chat.last_error().is_none());

    let stored = load_conversations(store.as_ref());
    assert_eq!(stored.len(), 1);
    let conversation = &stored[0];
    assert_eq!(conversation.title, "What is Rust?");
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].role, Role::User);
    assert_eq!(conversation.messages[0].content, "What is Rust?");
    assert_eq!(conversation.messages[1].role, Role::Assistant);
    assert_eq!(conversation.messages[1].content, "Hello");

    let request = &server.requests().await[0];
    let body = request.json();
    assert_eq!(body["stream"], true);
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
}

/// Counts writes of the conversation collection.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    conversation_writes: AtomicUsize,
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if key == CONVERSATIONS_KEY {
            self.conversation_writes.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn long_stream_saves_in_batches() {
    let fragments: Vec<String> = (0..40).map(|i| format!("w{i} ")).collect();
    let parts: Vec<&str> = fragments.iter().map(String::as_str).collect();
    let mut response = stream_of(&parts);
    response.pause = Duration::ZERO;
    let server = MockServer::start(vec![response]).await;

    let store = Arc::new(CountingStore::default());
    let mut chat =
        ChatController::load(Arc::clone(&store), test_client()).with_config(server.config());
    let reply = chat.send("Count", |_| {}).await.expect("send should succeed");
    assert_eq!(reply, fragments.concat());

    // Create, user message with placeholder, two batches, completion.
    assert_eq!(store.conversation_writes.load(Ordering::SeqCst), 5);
    let stored = load_conversations(store.as_ref());
    assert_eq!(stored[0].messages[1].content, fragments.concat());
}

#[tokio::test]
async fn whole_reply_mode_sends_history() {
    let completion = |text: &str| {
        CannedResponse::json(
            "HTTP/1.1 200 OK",
            &serde_json::json!({"choices": [{"message": {"role": "assistant", "content": text}}]})
                .to_string(),
        )
    };
    let server = MockServer::start(vec![completion("first"), completion("second")]).await;
    let store = Arc::new(MemoryStore::new());
    let config = ApiConfig {
        stream: false,
        ..server.config()
    };
    let mut chat = controller(&store, config);

    let mut calls = 0;
    chat.send("one", |_| calls += 1).await.unwrap();
    let reply = chat.send("two", |_| calls += 1).await.unwrap();
    assert_eq!(reply, "second");
    assert_eq!(calls, 2);

    let requests = server.requests().await;
    let history = requests[1].json()["messages"].clone();
    let contents: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["one", "first", "two"]);
    assert_eq!(requests[1].json()["stream"], false);
}

#[tokio::test]
async fn failure_fills_placeholder_and_sets_last_error() {
    let server = MockServer::start(vec![CannedResponse::json(
        "HTTP/1.1 401 Unauthorized",
        "{}",
    )])
    .await;
    let store = Arc::new(MemoryStore::new());
    let mut chat = controller(&store, server.config());

    let result = chat.send("hello", |_| {}).await;
    assert!(matches!(result, Err(ChatError::Api(ApiError::Auth))));

    let id = chat.active_id().unwrap().to_string();
    assert_eq!(chat.status(&id), RequestStatus::Failed);
    let expected = ApiError::Auth.to_string();
    assert_eq!(chat.last_error(), Some(expected.as_str()));

    let conversation = chat.active().unwrap();
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(
        conversation.messages[1].content,
        format!("Error: {expected}")
    );

    chat.dismiss_error();
    assert!(chat.last_error().is_none());
}

#[tokio::test]
async fn partial_stream_is_kept_when_the_stream_stalls() {
    let server = MockServer::start(vec![CannedResponse::event_stream([delta_record("partial")])
        .hold_open(Duration::from_secs(5))])
    .await;
    let store = Arc::new(MemoryStore::new());
    let client = test_client().with_timeouts(Duration::from_millis(300), Duration::from_millis(300));
    let mut chat = ChatController::load(Arc::clone(&store), client).with_config(server.config());

    let result = chat.send("hello", |_| {}).await;
    assert!(matches!(result, Err(ChatError::Api(ApiError::Timeout(_)))));

    let stored = load_conversations(store.as_ref());
    let messages = &stored[0].messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "partial");
    assert!(messages[2].content.starts_with("Error: Request timed out"));
}

#[tokio::test]
async fn missing_key_fails_without_a_request() {
    let store = Arc::new(MemoryStore::new());
    let mut chat = TestController::load(Arc::clone(&store), test_client());
    assert_eq!(chat.config().model, DEFAULT_MODEL);

    let result = chat.send("hello", |_| {}).await;
    assert!(matches!(
        result,
        Err(ChatError::Api(ApiError::Config { .. }))
    ));
    assert!(chat
        .last_error()
        .is_some_and(|e| e.contains("api key")));
}

#[tokio::test]
async fn blank_input_is_rejected_before_anything_changes() {
    let store = Arc::new(MemoryStore::new());
    let mut chat = controller(&store, test_config(&unreachable_base_url().await));

    assert!(matches!(
        chat.send("   \n", |_| {}).await,
        Err(ChatError::EmptyInput)
    ));
    assert!(chat.conversations().is_empty());
    assert!(store.get("conversations").unwrap().is_none());
}

#[tokio::test]
async fn sending_conversation_refuses_overlapping_work() {
    let store = Arc::new(MemoryStore::new());
    let mut chat = controller(&store, test_config(&unreachable_base_url().await));
    let id = chat.new_chat().unwrap().id.clone();
    chat.set_status(&id, RequestStatus::Sending);

    assert!(matches!(chat.send("hi", |_| {}).await, Err(ChatError::Busy)));
    assert!(matches!(chat.new_chat(), Err(ChatError::Busy)));
    assert!(matches!(chat.delete(&id), Err(ChatError::Busy)));
    assert!(matches!(chat.clear(), Err(ChatError::Busy)));
    assert!(chat.active().unwrap().messages.is_empty());
}

#[test]
fn deleting_active_conversation_activates_next_most_recent() {
    let store = Arc::new(MemoryStore::new());
    let mut chat = TestController::load(Arc::clone(&store), test_client());
    let first = chat.new_chat().unwrap().id.clone();
    let second = chat.new_chat().unwrap().id.clone();
    assert_eq!(chat.active_id(), Some(second.as_str()));

    chat.delete(&second).unwrap();
    assert_eq!(chat.active_id(), Some(first.as_str()));

    chat.delete(&first).unwrap();
    assert!(chat.active_id().is_none());

    assert!(matches!(
        chat.delete("missing"),
        Err(ChatError::UnknownConversation(_))
    ));
    assert!(matches!(
        chat.select("missing"),
        Err(ChatError::UnknownConversation(_))
    ));
}

#[test]
fn rename_and_clear() {
    let store = Arc::new(MemoryStore::new());
    let mut chat = TestController::load(Arc::clone(&store), test_client());
    let id = chat.new_chat().unwrap().id.clone();
    assert_eq!(chat.active().unwrap().title, DEFAULT_TITLE);

    chat.rename(&id, "  Trip planning ").unwrap();
    assert_eq!(chat.conversation(&id).unwrap().title, "Trip planning");
    assert!(matches!(chat.rename(&id, "  "), Err(ChatError::EmptyInput)));

    chat.clear().unwrap();
    assert!(chat.conversations().is_empty());
    assert!(chat.active_id().is_none());
    assert!(store.get("conversations").unwrap().is_none());
}

#[test]
fn set_model_persists_only_the_model() {
    let store = Arc::new(MemoryStore::new());
    let session = ApiConfig {
        api_key: "sk-session-only".to_string(),
        ..ApiConfig::default()
    };
    let mut chat = controller(&store, session);

    chat.set_model("deepseek-coder").unwrap();
    assert_eq!(chat.config().model, "deepseek-coder");
    assert_eq!(chat.config().api_key, "sk-session-only");

    let saved = ConfigStore::new(Arc::clone(&store)).get();
    assert_eq!(saved.model, "deepseek-coder");
    assert_eq!(saved.api_key, "");

    assert!(matches!(chat.set_model(" "), Err(ChatError::EmptyInput)));
}

#[tokio::test]
async fn models_fall_back_without_credentials() {
    let store = Arc::new(MemoryStore::new());
    let chat = TestController::load(Arc::clone(&store), test_client());
    assert_eq!(chat.models().await, fallback_models());
}
