//! deepchat is a terminal chat client for DeepSeek and other
//! OpenAI-compatible chat-completions APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversations, settings, persistence, the stream decoder
//!   and the [`core::controller::ChatController`] that ties them together.
//! - [`api`] defines the wire payloads, the error taxonomy and the HTTP
//!   client for chat completions and model listing.
//! - [`commands`] parses the slash commands of an interactive session.
//! - [`utils`] holds URL, auth-header, timestamp and logging helpers.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod utils;
