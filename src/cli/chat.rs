//! Line-oriented interactive chat session.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::conversations::print_conversation_list;
use crate::cli::model_list::print_models;
use crate::commands::{help_text, process_input, CommandResult};
use crate::core::controller::{ChatController, ChatError};
use crate::core::message::Role;
use crate::core::storage::KeyValueStore;

/// What the loop should do after handling one line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Quit,
}

pub async fn run_chat<S: KeyValueStore + Clone>(
    mut controller: ChatController<S>,
) -> Result<(), Box<dyn Error>> {
    print_banner(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if handle_line(&mut controller, &line).await? == LineOutcome::Quit {
            break;
        }
    }

    Ok(())
}

fn print_banner<S: KeyValueStore + Clone>(controller: &ChatController<S>) {
    let config = controller.config();
    eprintln!("🚀 deepchat");
    eprintln!("📡 Using model: {}", config.model);
    eprintln!("🌐 API endpoint: {}", config.base_url);
    if !config.is_usable() {
        eprintln!(
            "⚠️  Missing {}. Run 'deepchat set api-key <key>' first.",
            config.missing_fields().join(", ")
        );
    }
    match controller.active() {
        Some(conversation) => {
            eprintln!("💬 Resuming: {}", conversation.title);
            for message in &conversation.messages {
                print_message(message.role, &message.content);
            }
        }
        None => eprintln!("💬 New conversation"),
    }
    eprintln!("💡 Type /help for commands, /quit to leave");
}

fn print_message(role: Role, content: &str) {
    match role {
        Role::User => println!("> {content}"),
        Role::Assistant => println!("{content}\n"),
        Role::System => println!("[system] {content}"),
    }
}

/// Handle one input line: a slash command or a message to send.
pub async fn handle_line<S: KeyValueStore + Clone>(
    controller: &mut ChatController<S>,
    line: &str,
) -> Result<LineOutcome, Box<dyn Error>> {
    if line.trim().is_empty() {
        return Ok(LineOutcome::Continue);
    }

    match process_input(line) {
        CommandResult::ProcessAsMessage(text) => send(controller, &text).await?,
        CommandResult::NewChat => match controller.new_chat() {
            Ok(_) => println!("💬 New conversation"),
            Err(err) => report(&err),
        },
        CommandResult::ListConversations => {
            print_conversation_list(&controller.conversations(), controller.active_id());
        }
        CommandResult::Switch(id) => match controller.select(&id) {
            Ok(conversation) => {
                println!("💬 {}", conversation.title);
                for message in &conversation.messages {
                    print_message(message.role, &message.content);
                }
            }
            Err(err) => report(&err),
        },
        CommandResult::Delete(id) => match controller.delete(&id) {
            Ok(()) => println!("🗑️  Deleted {id}"),
            Err(err) => report(&err),
        },
        CommandResult::Rename(title) => match controller.active_id().map(str::to_owned) {
            Some(id) => match controller.rename(&id, &title) {
                Ok(()) => println!("✏️  Renamed to: {}", title.trim()),
                Err(err) => report(&err),
            },
            None => eprintln!("⚠️  No active conversation to rename"),
        },
        CommandResult::ListModels => {
            let models = controller.models().await;
            print_models(&models, &controller.config().model);
        }
        CommandResult::SetModel(model) => match controller.set_model(&model) {
            Ok(()) => println!("✅ Using model: {}", controller.config().model),
            Err(err) => report(&err),
        },
        CommandResult::Help => println!("Commands:\n{}", help_text()),
        CommandResult::Quit => return Ok(LineOutcome::Quit),
        CommandResult::Usage(usage) => eprintln!("Usage: {usage}"),
    }

    Ok(LineOutcome::Continue)
}

async fn send<S: KeyValueStore + Clone>(
    controller: &mut ChatController<S>,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    let result = controller
        .send(text, |fragment| {
            let _ = write!(stdout, "{fragment}");
            let _ = stdout.flush();
        })
        .await;

    match result {
        Ok(_) => println!("\n"),
        Err(ChatError::Storage(err)) => return Err(err.into()),
        Err(err) => {
            println!();
            report(&err);
            controller.dismiss_error();
        }
    }
    Ok(())
}

fn report(err: &ChatError) {
    eprintln!("❌ {err}");
}
