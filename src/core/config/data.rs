use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Connection settings for the chat-completions endpoint.
///
/// Stored as camelCase JSON so the on-disk shape stays
/// `{"apiKey":..,"baseUrl":..,"model":..,"stream":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub stream: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stream: true,
        }
    }
}

impl ApiConfig {
    /// Whether the API client can be used with this configuration.
    pub fn is_usable(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.trim().is_empty() {
            missing.push("api key");
        }
        if self.base_url.trim().is_empty() {
            missing.push("base URL");
        }
        if self.model.trim().is_empty() {
            missing.push("model");
        }
        missing
    }

    /// Listing models needs credentials and an endpoint but no model.
    pub fn can_list_models(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.base_url.trim().is_empty()
    }

    /// Overlay values from `DEEPCHAT_API_KEY`, `DEEPCHAT_BASE_URL` and
    /// `DEEPCHAT_MODEL` when they are set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    pub(crate) fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(api_key) = value("DEEPCHAT_API_KEY") {
            self.api_key = api_key;
        }
        if let Some(base_url) = value("DEEPCHAT_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(model) = value("DEEPCHAT_MODEL") {
            self.model = model;
        }
        self
    }

    /// The API key with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.is_empty() {
            return "(not set)".to_string();
        }
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}
