//! Boolean setting handlers for on/off settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{format_bool, parse_bool, success_set};
use crate::cli::settings::SettingHandler;
use crate::core::config::ApiConfig;

/// Data-driven handler for boolean (on/off) settings.
pub struct BooleanHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    get: fn(&ApiConfig) -> bool,
    set_field: fn(&mut ApiConfig, bool),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut ApiConfig) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidBoolean(input))?;
        (self.set_field)(config, value);
        Ok(success_set(self.key, format_bool(value)))
    }

    fn unset(&self, config: &mut ApiConfig) -> String {
        let default = (self.get)(&ApiConfig::default());
        (self.set_field)(config, default);
        format!("✅ Unset {} (now: {})", self.key, format_bool(default))
    }

    fn format(&self, config: &ApiConfig) -> String {
        format!("  {}: {}", self.key, format_bool((self.get)(config)))
    }
}

/// Create a handler for the `stream` setting.
pub fn stream_handler() -> BooleanHandler {
    BooleanHandler {
        key: "stream",
        hint: "To set streaming, specify on or off:",
        example: "deepchat set stream off",
        get: |c| c.stream,
        set_field: |c, v| c.stream = v,
    }
}
