//! Listing and removing saved conversations.

use std::error::Error;

use crate::core::controller::{ChatController, ChatError};
use crate::core::conversation::Conversation;
use crate::core::storage::KeyValueStore;
use crate::utils::time::format_iso;

pub fn list_conversations<S: KeyValueStore + Clone>(controller: &ChatController<S>) {
    print_conversation_list(&controller.conversations(), controller.active_id());
}

pub fn print_conversation_list(conversations: &[&Conversation], active_id: Option<&str>) {
    if conversations.is_empty() {
        println!("No saved conversations.");
        return;
    }
    for conversation in conversations {
        println!("{}", describe_conversation(conversation, active_id));
    }
}

pub fn describe_conversation(conversation: &Conversation, active_id: Option<&str>) -> String {
    let marker = if active_id == Some(conversation.id.as_str()) {
        "*"
    } else {
        " "
    };
    format!(
        "{marker} {}  {}  ({} messages, updated {})",
        conversation.id,
        conversation.title,
        conversation.messages.len(),
        format_iso(&conversation.updated_at)
    )
}

pub fn delete_conversation<S: KeyValueStore + Clone>(
    controller: &mut ChatController<S>,
    id: &str,
) -> Result<(), Box<dyn Error>> {
    match controller.delete(id) {
        Ok(()) => {
            println!("🗑️  Deleted {id}");
            Ok(())
        }
        Err(ChatError::UnknownConversation(_)) => {
            eprintln!("❌ No conversation with id {id}. Run 'deepchat conversations' to list them.");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

pub fn clear_conversations<S: KeyValueStore + Clone>(
    controller: &mut ChatController<S>,
) -> Result<(), Box<dyn Error>> {
    let count = controller.conversations().len();
    controller.clear()?;
    println!("🗑️  Deleted {count} conversations");
    Ok(())
}
