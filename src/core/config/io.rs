use tracing::warn;

use crate::core::config::data::ApiConfig;
use crate::core::storage::{KeyValueStore, StorageError, StorageResult};

pub const CONFIG_KEY: &str = "deepseekConfig";

/// Loads and saves [`ApiConfig`] through a [`KeyValueStore`].
///
/// No validation happens here; see [`ApiConfig::is_usable`].
pub struct ConfigStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ConfigStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The stored configuration, or defaults when nothing usable is stored.
    pub fn get(&self) -> ApiConfig {
        let raw = match self.store.get(CONFIG_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ApiConfig::default(),
            Err(err) => {
                warn!(error = %err, "Failed to read saved config; using defaults");
                return ApiConfig::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "Failed to parse saved config; using defaults");
            ApiConfig::default()
        })
    }

    /// Overwrite the stored configuration wholesale.
    pub fn set(&self, config: &ApiConfig) -> StorageResult<()> {
        let json = serde_json::to_string(config).map_err(|source| StorageError::Serialization {
            key: CONFIG_KEY.to_string(),
            source,
        })?;
        self.store.set(CONFIG_KEY, &json)
    }

    /// Load, apply `mutator`, and save.
    pub fn mutate<F>(&self, mutator: F) -> StorageResult<ApiConfig>
    where
        F: FnOnce(&mut ApiConfig),
    {
        let mut working = self.get();
        mutator(&mut working);
        self.set(&working)?;
        Ok(working)
    }
}
