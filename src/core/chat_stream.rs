//! Background streaming: replies are read on a spawned task and forwarded
//! over a channel, so a UI loop can keep polling input while text arrives.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ApiClient, ApiError, ChatMessage};
use crate::core::config::ApiConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(ApiError),
    End,
}

pub struct StreamParams {
    pub client: ApiClient,
    pub config: ApiConfig,
    pub messages: Vec<ChatMessage>,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Every stream ends with exactly one `End`, preceded by an `Error` when
    /// it failed. A cancelled stream sends nothing further.
    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                config,
                messages,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = forward_stream(&client, &config, &messages, &tx, stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "Stream cancelled");
                }
            }
        });
    }
}

async fn forward_stream(
    client: &ApiClient,
    config: &ApiConfig,
    messages: &[ChatMessage],
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    let mut stream = match client.open_stream(messages, config).await {
        Ok(stream) => stream,
        Err(err) => {
            let _ = tx.send((StreamMessage::Error(err), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    loop {
        match stream.next_fragment().await {
            Ok(Some(fragment)) => {
                if tx.send((StreamMessage::Chunk(fragment), stream_id)).is_err() {
                    // Receiver dropped; nobody is listening any more.
                    return;
                }
            }
            Ok(None) => break,
            Err(err) => {
                let _ = tx.send((StreamMessage::Error(err), stream_id));
                break;
            }
        }
    }
    let _ = tx.send((StreamMessage::End, stream_id));
}
