//! One-shot "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::core::controller::{ChatController, ChatError};
use crate::core::storage::KeyValueStore;

/// Send `prompt` in a fresh conversation and print the reply as it arrives.
/// The exchange is saved like any other conversation.
pub async fn run_say<S: KeyValueStore + Clone>(
    mut controller: ChatController<S>,
    prompt: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: deepchat say <prompt>");
        std::process::exit(1);
    }

    controller.new_chat()?;

    let mut stdout = io::stdout();
    let result = controller
        .send(&prompt, |fragment| {
            let _ = write!(stdout, "{fragment}");
            let _ = stdout.flush();
        })
        .await;

    match result {
        Ok(_) => {
            println!();
            Ok(())
        }
        Err(ChatError::Api(err)) => {
            eprintln!("\n❌ Error: {err}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
