//! Slash commands for the interactive chat session.
//!
//! Input starting with `/` is looked up in the command registry; anything
//! else, including unknown commands, is sent as a chat message.

mod registry;

pub use registry::{all_commands, find_command, Command, CommandInvocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    NewChat,
    ListConversations,
    Switch(String),
    Delete(String),
    Rename(String),
    ListModels,
    SetModel(String),
    Help,
    Quit,
    /// A known command used with the wrong arguments.
    Usage(&'static str),
    ProcessAsMessage(String),
}

pub fn process_input(input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    match find_command(command_name) {
        Some(command) => (command.handler)(CommandInvocation {
            input: trimmed,
            args,
        }),
        None => CommandResult::ProcessAsMessage(input.to_string()),
    }
}

/// One line per command, for `/help`.
pub fn help_text() -> String {
    all_commands()
        .iter()
        .map(|command| format!("  {:<16} {}", command.usage, command.help))
        .collect::<Vec<_>>()
        .join("\n")
}

fn required_arg(
    invocation: CommandInvocation<'_>,
    usage: &'static str,
    build: fn(String) -> CommandResult,
) -> CommandResult {
    if invocation.args.is_empty() {
        CommandResult::Usage(usage)
    } else {
        build(invocation.args.to_string())
    }
}

pub(super) fn handle_new(_invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::NewChat
}

pub(super) fn handle_list(_invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::ListConversations
}

pub(super) fn handle_switch(invocation: CommandInvocation<'_>) -> CommandResult {
    required_arg(invocation, "/switch <id>", CommandResult::Switch)
}

pub(super) fn handle_delete(invocation: CommandInvocation<'_>) -> CommandResult {
    required_arg(invocation, "/delete <id>", CommandResult::Delete)
}

pub(super) fn handle_rename(invocation: CommandInvocation<'_>) -> CommandResult {
    required_arg(invocation, "/rename <title>", CommandResult::Rename)
}

pub(super) fn handle_models(_invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::ListModels
}

pub(super) fn handle_model(invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::ListModels;
    }
    CommandResult::SetModel(invocation.args.to_string())
}

pub(super) fn handle_help(_invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Help
}

pub(super) fn handle_quit(_invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
