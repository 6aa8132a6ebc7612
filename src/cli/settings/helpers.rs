//! Helper functions for settings operations.

use crate::core::config::{ApiConfig, ConfigStore};
use crate::core::storage::KeyValueStore;

use super::error::SettingError;

/// Load the stored config, apply `f`, and save the result.
///
/// Nothing is written when `f` fails.
pub fn mutate_config<S, F>(store: &ConfigStore<S>, f: F) -> Result<String, SettingError>
where
    S: KeyValueStore,
    F: FnOnce(&mut ApiConfig) -> Result<String, SettingError>,
{
    let mut config = store.get();
    let message = f(&mut config)?;
    store
        .set(&config)
        .map_err(|e| SettingError::ConfigError(e.to_string()))?;
    Ok(message)
}

/// Parse a boolean value from user input.
///
/// Accepts: on/off, true/false, yes/no (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Format a boolean value for display.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub fn success_set(key: &str, display: &str) -> String {
    format!("✅ Set {key} to: {display}")
}
