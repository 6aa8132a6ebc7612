pub mod chat_stream;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod conversation_store;
pub mod message;
pub mod network;
pub mod storage;
pub mod stream_decoder;
