//! Settings management for the CLI `set`, `unset` and `config` commands.
//!
//! Each configuration key has a handler that knows how to parse, reset and
//! display it:
//!
//! - String settings (`api-key`, `base-url`, `model`)
//! - Boolean settings (`stream`)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::ApiConfig;

/// Trait for handling a configuration setting.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Apply `args` to `config`, returning a success message.
    fn set(&self, args: &[String], config: &mut ApiConfig) -> Result<String, SettingError>;

    /// Restore the default value, returning a success message.
    fn unset(&self, config: &mut ApiConfig) -> String;

    /// Format the current value for display in `deepchat config` output.
    fn format(&self, config: &ApiConfig) -> String;
}
