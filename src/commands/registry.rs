use super::CommandResult;

pub type CommandHandler = fn(CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands().iter().find(|command| {
        command.name.eq_ignore_ascii_case(name)
            || command
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    })
}

const COMMANDS: &[Command] = &[
    Command {
        name: "new",
        aliases: &[],
        usage: "/new",
        help: "Start a new conversation.",
        handler: super::handle_new,
    },
    Command {
        name: "list",
        aliases: &["ls"],
        usage: "/list",
        help: "List conversations, most recent first.",
        handler: super::handle_list,
    },
    Command {
        name: "switch",
        aliases: &[],
        usage: "/switch <id>",
        help: "Make another conversation active.",
        handler: super::handle_switch,
    },
    Command {
        name: "delete",
        aliases: &[],
        usage: "/delete <id>",
        help: "Delete a conversation.",
        handler: super::handle_delete,
    },
    Command {
        name: "rename",
        aliases: &[],
        usage: "/rename <title>",
        help: "Rename the active conversation.",
        handler: super::handle_rename,
    },
    Command {
        name: "models",
        aliases: &[],
        usage: "/models",
        help: "List available models.",
        handler: super::handle_models,
    },
    Command {
        name: "model",
        aliases: &[],
        usage: "/model <id>",
        help: "Switch to another model and save it as the default.",
        handler: super::handle_model,
    },
    Command {
        name: "help",
        aliases: &["?"],
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "quit",
        aliases: &["exit", "q"],
        usage: "/quit",
        help: "Leave the session.",
        handler: super::handle_quit,
    },
];
