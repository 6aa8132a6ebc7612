//! Conversation records and the pure functions that transform a collection
//! of them. [`crate::core::conversation_store::ConversationStore`] wraps these
//! with persistence.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::message::{Message, Role};
use crate::utils::time::{iso_millis, now_millis, strictly_after, Timestamp};

/// Placeholder title until the first user message names the conversation.
pub const DEFAULT_TITLE: &str = "New conversation";

/// Derived titles keep at most this many characters before the ellipsis.
pub const TITLE_MAX_CHARS: usize = 30;

const TITLE_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(with = "iso_millis")]
    pub created_at: Timestamp,
    #[serde(with = "iso_millis")]
    pub updated_at: Timestamp,
}

impl Conversation {
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: generate_id(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    fn touch(&mut self) {
        self.updated_at = strictly_after(self.updated_at);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Title derived from the first user message, or `None` when there is no
/// user message with visible content.
pub fn generate_title(messages: &[Message]) -> Option<String> {
    let first_user = messages.iter().find(|message| message.role == Role::User)?;
    let content = first_user.content.trim();
    if content.is_empty() {
        return None;
    }

    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{head}{TITLE_ELLIPSIS}"))
    } else {
        Some(head)
    }
}

/// Replace the messages of conversation `id`.
///
/// Returns whether a conversation matched. Other conversations are left
/// untouched.
pub fn update_conversation(
    conversations: &mut [Conversation],
    id: &str,
    messages: Vec<Message>,
) -> bool {
    let Some(conversation) = conversations.iter_mut().find(|c| c.id == id) else {
        return false;
    };

    if conversation.has_default_title() && !messages.is_empty() {
        if let Some(title) = generate_title(&messages) {
            conversation.title = title;
        }
    }
    conversation.messages = messages;
    conversation.touch();
    true
}

pub fn rename_conversation(conversations: &mut [Conversation], id: &str, title: &str) -> bool {
    let Some(conversation) = conversations.iter_mut().find(|c| c.id == id) else {
        return false;
    };
    conversation.title = title.to_string();
    conversation.touch();
    true
}

/// Remove conversation `id`, returning whether anything was removed.
pub fn delete_conversation(conversations: &mut Vec<Conversation>, id: &str) -> bool {
    let before = conversations.len();
    conversations.retain(|c| c.id != id);
    conversations.len() != before
}

/// Conversations ordered by `updated_at`, newest first.
pub fn sort_by_recent(conversations: &[Conversation]) -> Vec<&Conversation> {
    let mut sorted: Vec<&Conversation> = conversations.iter().collect();
    sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sorted
}

pub fn most_recent(conversations: &[Conversation]) -> Option<&Conversation> {
    conversations.iter().max_by_key(|c| c.updated_at)
}
