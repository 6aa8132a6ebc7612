//! Session orchestration: the active conversation, per-conversation request
//! status, and the send flow that turns a prompt into a persisted reply.

use std::collections::HashMap;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{to_chat_messages, ApiClient, ApiError, ChatMessage, Model};
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::config::{ApiConfig, ConfigStore};
use crate::core::conversation::Conversation;
use crate::core::conversation_store::ConversationStore;
use crate::core::message::Message;
use crate::core::storage::{KeyValueStore, StorageError};

/// A streamed reply is saved after this many fragments, and again once it
/// finishes or fails.
pub const FRAGMENTS_PER_SAVE: usize = 16;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("A request is already in progress for this conversation")]
    Busy,

    #[error("No conversation with id {0}")]
    UnknownConversation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to save: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Sending,
    Failed,
}

pub struct ChatController<S: KeyValueStore + Clone> {
    conversations: ConversationStore<S>,
    config_store: ConfigStore<S>,
    config: ApiConfig,
    client: ApiClient,
    active_id: Option<String>,
    statuses: HashMap<String, RequestStatus>,
    last_error: Option<String>,
    next_stream_id: u64,
}

impl<S: KeyValueStore + Clone> ChatController<S> {
    /// Load conversations and config from `store`. The most recently
    /// updated conversation becomes active.
    pub fn load(store: S, client: ApiClient) -> Self {
        let conversations = ConversationStore::load(store.clone());
        let config_store = ConfigStore::new(store);
        let config = config_store.get();
        let active_id = conversations.most_recent().map(|c| c.id.clone());
        Self {
            conversations,
            config_store,
            config,
            client,
            active_id,
            statuses: HashMap::new(),
            last_error: None,
            next_stream_id: 0,
        }
    }

    /// Use `config` for this session without saving it.
    pub fn with_config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn conversations(&self) -> Vec<&Conversation> {
        self.conversations.sorted_by_recent()
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id
            .as_deref()
            .and_then(|id| self.conversations.get(id))
    }

    pub fn status(&self, id: &str) -> RequestStatus {
        self.statuses.get(id).copied().unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    fn is_sending(&self, id: &str) -> bool {
        self.status(id) == RequestStatus::Sending
    }

    /// Create a conversation and make it active.
    pub fn new_chat(&mut self) -> Result<&Conversation, ChatError> {
        if self.active_id.as_deref().is_some_and(|id| self.is_sending(id)) {
            return Err(ChatError::Busy);
        }
        let conversation = self.conversations.create()?;
        debug!(id = %conversation.id, "Created conversation");
        self.active_id = Some(conversation.id.clone());
        self.conversations
            .get(&conversation.id)
            .ok_or(ChatError::UnknownConversation(conversation.id))
    }

    pub fn select(&mut self, id: &str) -> Result<&Conversation, ChatError> {
        if self.conversations.get(id).is_none() {
            return Err(ChatError::UnknownConversation(id.to_string()));
        }
        self.active_id = Some(id.to_string());
        self.conversations
            .get(id)
            .ok_or_else(|| ChatError::UnknownConversation(id.to_string()))
    }

    /// Delete `id`. When it was active, the next most recent conversation
    /// (if any) becomes active.
    pub fn delete(&mut self, id: &str) -> Result<(), ChatError> {
        if self.is_sending(id) {
            return Err(ChatError::Busy);
        }
        if !self.conversations.delete(id)? {
            return Err(ChatError::UnknownConversation(id.to_string()));
        }
        self.statuses.remove(id);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.conversations.most_recent().map(|c| c.id.clone());
        }
        Ok(())
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if !self.conversations.rename(id, title)? {
            return Err(ChatError::UnknownConversation(id.to_string()));
        }
        Ok(())
    }

    /// Remove every conversation.
    pub fn clear(&mut self) -> Result<(), ChatError> {
        if self.statuses.values().any(|s| *s == RequestStatus::Sending) {
            return Err(ChatError::Busy);
        }
        self.conversations.clear()?;
        self.statuses.clear();
        self.active_id = None;
        Ok(())
    }

    /// Switch the model and save it.
    pub fn set_model(&mut self, model: &str) -> Result<(), ChatError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        self.config_store
            .mutate(|config| config.model = model.to_string())?;
        self.config.model = model.to_string();
        Ok(())
    }

    pub async fn models(&self) -> Vec<Model> {
        self.client.get_models(&self.config).await
    }

    /// Send `input` in the active conversation, creating one if needed.
    ///
    /// `on_fragment` sees the reply as it arrives: each streamed fragment,
    /// or the whole reply at once when streaming is off. Returns the full
    /// reply text. On failure the error text is recorded in the
    /// conversation and in [`ChatController::last_error`].
    pub async fn send<F>(&mut self, input: &str, mut on_fragment: F) -> Result<String, ChatError>
    where
        F: FnMut(&str),
    {
        let input = input.trim();
        if input.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let id = match self.active().map(|c| c.id.clone()) {
            Some(id) => id,
            None => self.new_chat()?.id.clone(),
        };
        if self.is_sending(&id) {
            return Err(ChatError::Busy);
        }

        let mut messages = self
            .conversations
            .get(&id)
            .map(|c| c.messages.clone())
            .ok_or_else(|| ChatError::UnknownConversation(id.clone()))?;
        messages.push(Message::user(input));
        let request = to_chat_messages(&messages);
        messages.push(Message::assistant(""));
        self.conversations.update(&id, messages.clone())?;

        self.last_error = None;
        self.statuses.insert(id.clone(), RequestStatus::Sending);
        debug!(%id, stream = self.config.stream, "Sending message");

        let outcome = if self.config.stream {
            self.stream_reply(&id, &request, &mut messages, &mut on_fragment)
                .await
        } else {
            self.whole_reply(&request, &mut messages, &mut on_fragment)
                .await
        };

        match outcome {
            Ok(reply) => {
                self.statuses.insert(id.clone(), RequestStatus::Idle);
                self.conversations.update(&id, messages)?;
                Ok(reply)
            }
            Err(err) => {
                self.record_failure(&id, messages, &err);
                Err(ChatError::Api(err))
            }
        }
    }

    async fn whole_reply(
        &self,
        request: &[ChatMessage],
        messages: &mut [Message],
        on_fragment: &mut impl FnMut(&str),
    ) -> Result<String, ApiError> {
        let reply = self.client.send_message(request, &self.config).await?;
        if let Some(placeholder) = messages.last_mut() {
            placeholder.content.clone_from(&reply);
        }
        on_fragment(&reply);
        Ok(reply)
    }

    async fn stream_reply(
        &mut self,
        id: &str,
        request: &[ChatMessage],
        messages: &mut Vec<Message>,
        on_fragment: &mut impl FnMut(&str),
    ) -> Result<String, ApiError> {
        self.next_stream_id += 1;
        let stream_id = self.next_stream_id;
        let cancel_token = CancellationToken::new();
        // Stops the background read if this future is dropped mid-reply.
        let _cancel_on_drop = cancel_token.clone().drop_guard();

        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(StreamParams {
            client: self.client.clone(),
            config: self.config.clone(),
            messages: request.to_vec(),
            cancel_token,
            stream_id,
        });
        drop(service);
        debug!(stream_id, %id, "Streaming reply");

        let mut reply = String::new();
        let mut unsaved = 0;
        while let Some((message, _)) = rx.recv().await {
            match message {
                StreamMessage::Chunk(fragment) => {
                    reply.push_str(&fragment);
                    if let Some(placeholder) = messages.last_mut() {
                        placeholder.content.push_str(&fragment);
                    }
                    unsaved += 1;
                    if unsaved == FRAGMENTS_PER_SAVE {
                        unsaved = 0;
                        if let Err(err) = self.conversations.update(id, messages.clone()) {
                            warn!(error = %err, %id, "Failed to save streamed reply");
                        }
                    }
                    on_fragment(&fragment);
                }
                StreamMessage::Error(err) => return Err(err),
                StreamMessage::End => return Ok(reply),
            }
        }
        Err(ApiError::InvalidResponse(
            "stream stopped before completing".to_string(),
        ))
    }

    fn record_failure(&mut self, id: &str, mut messages: Vec<Message>, err: &ApiError) {
        let text = format!("Error: {err}");
        match messages.last_mut() {
            Some(last) if last.is_assistant() && last.content.is_empty() => last.content = text,
            _ => messages.push(Message::assistant(text)),
        }
        if let Err(storage_err) = self.conversations.update(id, messages) {
            warn!(error = %storage_err, %id, "Failed to save error message");
        }
        warn!(error = %err, %id, "Chat request failed");
        self.last_error = Some(err.to_string());
        self.statuses.insert(id.to_string(), RequestStatus::Failed);
    }

    #[cfg(test)]
    pub(crate) fn set_status(&mut self, id: &str, status: RequestStatus) {
        self.statuses.insert(id.to_string(), status);
    }
}

#[cfg(test)]
mod tests;
