//! String setting handlers for text-based settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::success_set;
use crate::cli::settings::SettingHandler;
use crate::core::config::ApiConfig;
use crate::utils::url::normalize_base_url;

/// Data-driven handler for single-string settings.
pub struct StringHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    secret: bool,
    get: fn(&ApiConfig) -> &str,
    set_field: fn(&mut ApiConfig, String),
}

impl StringHandler {
    fn display(&self, config: &ApiConfig) -> String {
        if self.secret {
            config.masked_api_key()
        } else {
            (self.get)(config).to_string()
        }
    }
}

impl SettingHandler for StringHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut ApiConfig) -> Result<String, SettingError> {
        let value = args.join(" ").trim().to_string();
        if value.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        (self.set_field)(config, value);
        Ok(success_set(self.key, &self.display(config)))
    }

    fn unset(&self, config: &mut ApiConfig) -> String {
        let default = ApiConfig::default();
        (self.set_field)(config, (self.get)(&default).to_string());
        format!("✅ Unset {} (will use default)", self.key)
    }

    fn format(&self, config: &ApiConfig) -> String {
        let value = self.display(config);
        if value.is_empty() {
            format!("  {}: (unset)", self.key)
        } else {
            format!("  {}: {}", self.key, value)
        }
    }
}

/// Create a handler for the `api-key` setting. Displayed masked.
pub fn api_key_handler() -> StringHandler {
    StringHandler {
        key: "api-key",
        hint: "To set the API key, provide the key:",
        example: "deepchat set api-key sk-...",
        secret: true,
        get: |c| c.api_key.as_str(),
        set_field: |c, v| c.api_key = v,
    }
}

/// Create a handler for the `base-url` setting. Trailing slashes are dropped.
pub fn base_url_handler() -> StringHandler {
    StringHandler {
        key: "base-url",
        hint: "To set the base URL, provide the endpoint root:",
        example: "deepchat set base-url https://api.deepseek.com/v1",
        secret: false,
        get: |c| c.base_url.as_str(),
        set_field: |c, v| c.base_url = normalize_base_url(&v).to_string(),
    }
}

/// Create a handler for the `model` setting.
pub fn model_handler() -> StringHandler {
    StringHandler {
        key: "model",
        hint: "To set the model, provide its id:",
        example: "deepchat set model deepseek-chat",
        secret: false,
        get: |c| c.model.as_str(),
        set_field: |c, v| c.model = v,
    }
}
