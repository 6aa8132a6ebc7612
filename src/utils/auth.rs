//! Authentication helpers for API requests.

/// Attach the bearer-token `Authorization` header used by OpenAI-compatible
/// endpoints.
pub fn add_auth_headers(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    request.header("Authorization", format!("Bearer {api_key}"))
}
