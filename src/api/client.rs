//! HTTP client for the chat-completions and models endpoints.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::api::models::{fallback_models, fetch_models, Model};
use crate::api::{ChatCompletion, ChatMessage, ChatRequest};
use crate::core::config::ApiConfig;
use crate::core::network::{AssumeOnline, NetworkMonitor};
use crate::core::stream_decoder::{StreamDecoder, StreamEvent};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// Budget for a chat request: the whole call when not streaming, and the
/// response headers plus each body read when streaming.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Budget for the models listing.
pub const MODELS_TIMEOUT: Duration = Duration::from_secs(10);

type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, reqwest::Error>> + Send>>;

fn body_stream(response: reqwest::Response) -> BodyStream {
    Box::pin(
        response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec())),
    )
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    network: Arc<dyn NetworkMonitor>,
    chat_timeout: Duration,
    models_timeout: Duration,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_network(Arc::new(AssumeOnline))
    }

    pub fn with_network(network: Arc<dyn NetworkMonitor>) -> Self {
        Self {
            http: reqwest::Client::new(),
            network,
            chat_timeout: CHAT_TIMEOUT,
            models_timeout: MODELS_TIMEOUT,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Override the request budgets. Tests use this to avoid waiting out the
    /// real ones.
    pub fn with_timeouts(mut self, chat: Duration, models: Duration) -> Self {
        self.chat_timeout = chat;
        self.models_timeout = models;
        self
    }

    fn check_preconditions(&self, config: &ApiConfig) -> Result<(), ApiError> {
        if !self.network.is_online() {
            return Err(ApiError::Offline);
        }
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(ApiError::Config { missing });
        }
        Ok(())
    }

    fn chat_request(
        &self,
        messages: &[ChatMessage],
        config: &ApiConfig,
        stream: bool,
    ) -> reqwest::RequestBuilder {
        let request = ChatRequest {
            model: &config.model,
            messages,
            stream,
        };
        let chat_url = construct_api_url(&config.base_url, "chat/completions");
        add_auth_headers(
            self.http
                .post(chat_url)
                .header("Content-Type", "application/json"),
            &config.api_key,
        )
        .json(&request)
    }

    /// Send the conversation and wait for the whole reply.
    pub async fn send_message(
        &self,
        messages: &[ChatMessage],
        config: &ApiConfig,
    ) -> Result<String, ApiError> {
        self.check_preconditions(config)?;
        debug!(model = %config.model, messages = messages.len(), "Sending chat request");

        let budget = self.chat_timeout;
        let response = self
            .chat_request(messages, config, false)
            .timeout(budget)
            .send()
            .await
            .map_err(|err| ApiError::from_transport(err, budget))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Chat request rejected");
            return Err(ApiError::from_status(status, &body));
        }

        let completion = response
            .json::<ChatCompletion>()
            .await
            .map_err(|err| ApiError::from_transport(err, budget))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ApiError::InvalidResponse("response has no message content".to_string()))
    }

    /// Start a streaming request. Errors before the body starts (offline,
    /// config, HTTP status, timeout) are returned here; the fragments are
    /// pulled from the returned [`ChatStream`].
    pub async fn open_stream(
        &self,
        messages: &[ChatMessage],
        config: &ApiConfig,
    ) -> Result<ChatStream, ApiError> {
        self.check_preconditions(config)?;
        debug!(model = %config.model, messages = messages.len(), "Opening chat stream");

        let budget = self.chat_timeout;
        let send = self.chat_request(messages, config, true).send();
        let response = match tokio::time::timeout(budget, send).await {
            Ok(result) => result.map_err(|err| ApiError::from_transport(err, budget))?,
            Err(_) => return Err(ApiError::Timeout(budget)),
        };

        let status = response.status();
        if !status.is_success() {
            // The header budget does not cover the body; bound the error read too.
            let body = match tokio::time::timeout(budget, response.text()).await {
                Ok(body) => body.unwrap_or_default(),
                Err(_) => {
                    warn!(%status, "Chat stream rejected; error body timed out");
                    return Err(ApiError::Timeout(budget));
                }
            };
            warn!(%status, "Chat stream rejected");
            return Err(ApiError::from_status(status, &body));
        }

        Ok(ChatStream::new(body_stream(response), budget))
    }

    /// Stream a reply through callbacks: `on_chunk` per fragment in arrival
    /// order, then `on_done` exactly once. On error `on_done` is not called.
    pub async fn send_message_stream<C, D>(
        &self,
        messages: &[ChatMessage],
        config: &ApiConfig,
        mut on_chunk: C,
        on_done: D,
    ) -> Result<(), ApiError>
    where
        C: FnMut(&str),
        D: FnOnce(),
    {
        let mut stream = self.open_stream(messages, config).await?;
        while let Some(fragment) = stream.next_fragment().await? {
            on_chunk(&fragment);
        }
        on_done();
        Ok(())
    }

    /// Available models, or the fallback catalogue when they cannot be
    /// fetched for any reason.
    pub async fn get_models(&self, config: &ApiConfig) -> Vec<Model> {
        if !self.network.is_online() {
            debug!("Offline; using fallback model catalogue");
            return fallback_models();
        }
        if !config.can_list_models() {
            debug!("Model listing needs an API key and base URL; using fallback catalogue");
            return fallback_models();
        }

        match fetch_models(&self.http, config, self.models_timeout).await {
            Ok(models) => models,
            Err(err) => {
                warn!(error = %err, "Failed to fetch models; using fallback catalogue");
                fallback_models()
            }
        }
    }
}

/// A streamed reply: a finite, non-restartable sequence of fragments.
///
/// [`ChatStream::next_fragment`] yields `Ok(Some(..))` per fragment and
/// `Ok(None)` once the server signalled completion or the body ended, and
/// keeps returning `Ok(None)` afterwards. A read that exceeds the budget
/// ends the stream with [`ApiError::Timeout`].
pub struct ChatStream {
    body: Option<BodyStream>,
    decoder: StreamDecoder,
    pending: VecDeque<String>,
    finished: bool,
    read_timeout: Duration,
}

impl ChatStream {
    fn new(body: BodyStream, read_timeout: Duration) -> Self {
        Self {
            body: Some(body),
            decoder: StreamDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
            read_timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_chunks(chunks: Vec<Result<Vec<u8>, reqwest::Error>>) -> Self {
        let body: BodyStream = Box::pin(futures_util::stream::iter(chunks));
        Self::new(body, CHAT_TIMEOUT)
    }

    pub async fn next_fragment(&mut self) -> Result<Option<String>, ApiError> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Ok(Some(fragment));
            }
            if self.finished {
                return Ok(None);
            }

            let Some(body) = self.body.as_mut() else {
                self.finished = true;
                continue;
            };

            let next = match tokio::time::timeout(self.read_timeout, body.next()).await {
                Ok(next) => next,
                Err(_) => {
                    self.close();
                    return Err(ApiError::Timeout(self.read_timeout));
                }
            };

            match next {
                Some(Ok(chunk)) => {
                    let events = self.decoder.feed(&chunk);
                    self.absorb(events);
                }
                Some(Err(err)) => {
                    let budget = self.read_timeout;
                    self.close();
                    return Err(ApiError::from_transport(err, budget));
                }
                None => {
                    self.body = None;
                    let events = self.decoder.finish();
                    self.absorb(events);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn collect_text(mut self) -> Result<String, ApiError> {
        let mut text = String::new();
        while let Some(fragment) = self.next_fragment().await? {
            text.push_str(&fragment);
        }
        Ok(text)
    }

    fn absorb(&mut self, events: Vec<StreamEvent>) {
        for event in events {
            match event {
                StreamEvent::Fragment(fragment) => self.pending.push_back(fragment),
                StreamEvent::Completed => {
                    self.finished = true;
                    // Completion arrived; the rest of the body is irrelevant.
                    self.body = None;
                }
            }
        }
    }

    fn close(&mut self) {
        self.body = None;
        self.finished = true;
        self.pending.clear();
    }
}
