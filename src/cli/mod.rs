//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod conversations;
pub mod model_list;
pub mod say;
pub mod settings;

use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::api::ApiClient;
use crate::cli::chat::run_chat;
use crate::cli::conversations::{clear_conversations, delete_conversation, list_conversations};
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::cli::settings::{SettingError, SettingRegistry};
use crate::core::config::ConfigStore;
use crate::core::controller::ChatController;
use crate::core::storage::{open_default_store, KeyValueStore};
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "deepchat")]
#[command(about = "A terminal chat client for DeepSeek and OpenAI-compatible APIs")]
#[command(
    long_about = "deepchat is a line-oriented chat client for DeepSeek and other \
OpenAI-compatible chat-completions APIs. Conversations and settings are saved \
between sessions.\n\n\
Setup:\n\
  deepchat set api-key <key>     Save your API key\n\
  deepchat set base-url <url>    Use another endpoint (default https://api.deepseek.com/v1)\n\n\
Environment Variables (override saved settings for one run):\n\
  DEEPCHAT_API_KEY    API key\n\
  DEEPCHAT_BASE_URL   API base URL\n\
  DEEPCHAT_MODEL      Model id\n\
  DEEPCHAT_LOG        Log filter, e.g. debug or deepchat=trace\n\n\
In a chat session, type /help to list commands."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this invocation
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Log filter (overrides DEEPCHAT_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// Send one prompt in a new conversation and print the reply
    Say {
        /// The prompt to send
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List available models
    Models,
    /// List saved conversations, most recent first
    Conversations,
    /// Delete a saved conversation
    Delete {
        /// Conversation id (see `deepchat conversations`)
        id: String,
    },
    /// Delete every saved conversation
    Clear,
    /// Show the saved configuration
    Config,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Restore a configuration value to its default
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub type SharedStore = Arc<dyn KeyValueStore>;

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let store: SharedStore = Arc::from(open_default_store());

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let controller = load_controller(store, args.model);
            run_chat(controller).await
        }
        Commands::Say { prompt } => {
            let controller = load_controller(store, args.model);
            run_say(controller, prompt).await
        }
        Commands::Models => {
            let controller = load_controller(store, args.model);
            list_models(&controller).await
        }
        Commands::Conversations => {
            let controller = load_controller(store, args.model);
            list_conversations(&controller);
            Ok(())
        }
        Commands::Delete { id } => {
            let mut controller = load_controller(store, args.model);
            delete_conversation(&mut controller, &id)
        }
        Commands::Clear => {
            let mut controller = load_controller(store, args.model);
            clear_conversations(&mut controller)
        }
        Commands::Config => {
            print_config(&ConfigStore::new(store));
            Ok(())
        }
        Commands::Set { key, value } => {
            let message = apply_setting(&ConfigStore::new(store), &key, &value, SetAction::Set)
                .unwrap_or_else(|err| exit_with(err));
            println!("{message}");
            Ok(())
        }
        Commands::Unset { key } => {
            let message = apply_setting(&ConfigStore::new(store), &key, &[], SetAction::Unset)
                .unwrap_or_else(|err| exit_with(err));
            println!("{message}");
            Ok(())
        }
    }
}

/// A controller over `store` whose session config layers the environment
/// and `-m` over the saved settings. The overrides are never saved.
pub fn load_controller(store: SharedStore, model: Option<String>) -> ChatController<SharedStore> {
    let controller = ChatController::load(store, ApiClient::new());
    let mut config = controller.config().clone().with_env_overrides();
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        config.model = model.trim().to_string();
    }
    controller.with_config(config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetAction {
    Set,
    Unset,
}

pub fn apply_setting<S: KeyValueStore>(
    store: &ConfigStore<S>,
    key: &str,
    args: &[String],
    action: SetAction,
) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;

    settings::helpers::mutate_config(store, |config| match action {
        SetAction::Set => handler.set(args, config),
        SetAction::Unset => Ok(handler.unset(config)),
    })
}

pub fn format_config<S: KeyValueStore>(store: &ConfigStore<S>) -> Vec<String> {
    let registry = SettingRegistry::new();
    let config = store.get();
    registry
        .keys_display_order()
        .iter()
        .filter_map(|key| registry.get(key))
        .map(|handler| handler.format(&config))
        .collect()
}

fn print_config<S: KeyValueStore>(store: &ConfigStore<S>) {
    println!("deepchat configuration");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for line in format_config(store) {
        println!("{line}");
    }
    if !store.get().is_usable() {
        println!();
        println!("💡 Run 'deepchat set api-key <key>' before chatting.");
    }
}

fn exit_with(err: SettingError) -> ! {
    err.print();
    std::process::exit(1);
}

#[cfg(test)]
mod tests;
