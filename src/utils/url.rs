//! Endpoint URL construction.
//!
//! Users paste base URLs with and without trailing slashes, so every request
//! path is joined through [`construct_api_url`].

/// Strip trailing slashes from a configured base URL.
///
/// ```
/// use deepchat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.deepseek.com/v1/"), "https://api.deepseek.com/v1");
/// assert_eq!(normalize_base_url("https://api.deepseek.com/v1"), "https://api.deepseek.com/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim().trim_end_matches('/')
}

/// Join a base URL and an endpoint path with exactly one slash between them.
///
/// ```
/// use deepchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.deepseek.com/v1/", "/chat/completions"),
///     "https://api.deepseek.com/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}
