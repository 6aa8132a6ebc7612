//! Test fixtures: an in-process HTTP server with canned responses and
//! helpers for building clients and configs that point at it.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::core::config::ApiConfig;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

/// One canned reply. `parts` are written in order with `pause` between
/// them; `hold_open` keeps the socket open afterwards instead of closing.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status_line: String,
    pub content_type: String,
    pub parts: Vec<Vec<u8>>,
    pub pause: Duration,
    pub hold_open: Option<Duration>,
    pub delay_headers: Option<Duration>,
}

impl CannedResponse {
    pub fn json(status_line: &str, body: &str) -> Self {
        Self {
            status_line: status_line.to_string(),
            content_type: "application/json".to_string(),
            parts: vec![body.as_bytes().to_vec()],
            pause: Duration::ZERO,
            hold_open: None,
            delay_headers: None,
        }
    }

    pub fn event_stream<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self {
            status_line: "HTTP/1.1 200 OK".to_string(),
            content_type: "text/event-stream".to_string(),
            parts: parts.into_iter().map(|p| p.as_ref().to_vec()).collect(),
            pause: Duration::from_millis(20),
            hold_open: None,
            delay_headers: None,
        }
    }

    pub fn status(mut self, status_line: &str) -> Self {
        self.status_line = status_line.to_string();
        self
    }

    pub fn hold_open(mut self, duration: Duration) -> Self {
        self.hold_open = Some(duration);
        self
    }

    pub fn delay_headers(mut self, duration: Duration) -> Self {
        self.delay_headers = Some(duration);
        self
    }
}

pub struct MockServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockServer {
    /// Serve `responses` to successive connections, one per connection.
    pub async fn start(responses: Vec<CannedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let captured = Arc::clone(&captured);
                tokio::spawn(async move {
                    if let Ok(request) = read_http_request(&mut stream).await {
                        captured.lock().await.push(request);
                    }
                    let _ = write_response(&mut stream, &response).await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            requests,
        }
    }

    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().await.clone()
    }

    pub fn config(&self) -> ApiConfig {
        test_config(&self.base_url)
    }
}

pub fn test_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        api_key: "sk-test".to_string(),
        base_url: base_url.to_string(),
        model: "deepseek-chat".to_string(),
        stream: true,
    }
}

/// A client that ignores proxy settings from the environment.
pub fn test_client() -> ApiClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("client should build");
    ApiClient::new().with_http_client(http)
}

/// A base URL on which nothing is listening.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    drop(listener);
    format!("http://{addr}/v1")
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    let header_end = loop {
        let read = stream.read(&mut chunk).await.map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("connection closed before headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let mut headers = Vec::new();
    let mut content_length = 0;
    for line in lines.filter(|line| !line.is_empty()) {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse::<usize>().map_err(|e| e.to_string())?;
            }
            headers.push((name.to_string(), value));
        }
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).await.map_err(|e| e.to_string())?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

async fn write_response(stream: &mut TcpStream, response: &CannedResponse) -> std::io::Result<()> {
    if let Some(delay) = response.delay_headers {
        tokio::time::sleep(delay).await;
    }

    let streaming = response.content_type == "text/event-stream";
    let head = if streaming {
        format!(
            "{}\r\ncontent-type: {}\r\ncache-control: no-cache\r\nconnection: close\r\n\r\n",
            response.status_line, response.content_type
        )
    } else {
        let length: usize = response.parts.iter().map(Vec::len).sum();
        format!(
            "{}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            response.status_line, response.content_type, length
        )
    };
    stream.write_all(head.as_bytes()).await?;
    stream.flush().await?;

    for part in &response.parts {
        stream.write_all(part).await?;
        stream.flush().await?;
        if !response.pause.is_zero() {
            tokio::time::sleep(response.pause).await;
        }
    }

    if let Some(hold) = response.hold_open {
        tokio::time::sleep(hold).await;
    }
    stream.shutdown().await
}

pub fn delta_record(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]})
    )
}
