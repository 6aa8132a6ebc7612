use tracing::{debug, warn};

use crate::core::conversation::{
    delete_conversation, most_recent, rename_conversation, sort_by_recent, update_conversation,
    Conversation,
};
use crate::core::message::Message;
use crate::core::storage::{KeyValueStore, StorageError, StorageResult};

pub const CONVERSATIONS_KEY: &str = "conversations";

/// Decode a stored collection. Missing or malformed data loads as empty.
pub fn load_conversations(store: &dyn KeyValueStore) -> Vec<Conversation> {
    let raw = match store.get(CONVERSATIONS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(error = %err, "Failed to read stored conversations");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Conversation>>(&raw) {
        Ok(conversations) => conversations,
        Err(err) => {
            warn!(error = %err, "Stored conversations are malformed; starting empty");
            Vec::new()
        }
    }
}

pub fn save_conversations(
    store: &dyn KeyValueStore,
    conversations: &[Conversation],
) -> StorageResult<()> {
    let json = serde_json::to_string(conversations).map_err(|source| {
        StorageError::Serialization {
            key: CONVERSATIONS_KEY.to_string(),
            source,
        }
    })?;
    store.set(CONVERSATIONS_KEY, &json)
}

/// The conversation collection, rewritten to storage in full after every
/// mutation.
pub struct ConversationStore<S: KeyValueStore> {
    store: S,
    conversations: Vec<Conversation>,
}

impl<S: KeyValueStore> ConversationStore<S> {
    pub fn load(store: S) -> Self {
        let conversations = load_conversations(&store);
        debug!(count = conversations.len(), "Loaded conversations");
        Self {
            store,
            conversations,
        }
    }

    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn sorted_by_recent(&self) -> Vec<&Conversation> {
        sort_by_recent(&self.conversations)
    }

    pub fn most_recent(&self) -> Option<&Conversation> {
        most_recent(&self.conversations)
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn create(&mut self) -> StorageResult<Conversation> {
        let conversation = Conversation::new();
        self.conversations.push(conversation.clone());
        self.persist()?;
        Ok(conversation)
    }

    /// Replace the messages of `id`. Returns `Ok(None)` when `id` is unknown,
    /// in which case nothing is written.
    pub fn update(&mut self, id: &str, messages: Vec<Message>) -> StorageResult<Option<&Conversation>> {
        if !update_conversation(&mut self.conversations, id, messages) {
            return Ok(None);
        }
        self.persist()?;
        Ok(self.get(id))
    }

    pub fn rename(&mut self, id: &str, title: &str) -> StorageResult<bool> {
        if !rename_conversation(&mut self.conversations, id, title) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: &str) -> StorageResult<bool> {
        let removed = delete_conversation(&mut self.conversations, id);
        self.persist()?;
        Ok(removed)
    }

    /// Drop every conversation and the stored key.
    pub fn clear(&mut self) -> StorageResult<()> {
        self.conversations.clear();
        self.store.remove(CONVERSATIONS_KEY)
    }

    fn persist(&self) -> StorageResult<()> {
        save_conversations(&self.store, &self.conversations)
    }
}
