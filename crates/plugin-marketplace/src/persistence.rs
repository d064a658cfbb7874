//! Local persistence adapter — the two JSON blobs the marketplace keeps in
//! key-value storage: installations and user-submitted plugins.
//!
//! Blobs are read in full and rewritten in full. Reads never fail: a missing,
//! corrupt, or newer-schema blob yields an empty default so the service keeps
//! working on first run.

use crate::storage::KeyValueStorage;
use marketplace_core::config::StorageConfig;
use marketplace_core::types::PluginRecord;
use marketplace_core::MarketplaceResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

pub const SCHEMA_VERSION: u32 = 1;

/// workspace id -> project id -> installed plugin ids, in install order.
pub type InstallationMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a, T> {
    schema_version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    schema_version: u32,
    data: serde_json::Value,
}

pub struct LocalPersistence {
    storage: Arc<dyn KeyValueStorage>,
    plugins_key: String,
    installations_key: String,
}

impl LocalPersistence {
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: &StorageConfig) -> Self {
        Self {
            storage,
            plugins_key: config.plugins_key.clone(),
            installations_key: config.installations_key.clone(),
        }
    }

    pub fn load_installations(&self) -> InstallationMap {
        self.load_blob(&self.installations_key)
    }

    pub fn save_installations(&self, installations: &InstallationMap) -> MarketplaceResult<()> {
        self.save_blob(&self.installations_key, installations)
    }

    pub fn load_submitted_plugins(&self) -> Vec<PluginRecord> {
        self.load_blob(&self.plugins_key)
    }

    pub fn save_submitted_plugins(&self, plugins: &[PluginRecord]) -> MarketplaceResult<()> {
        self.save_blob(&self.plugins_key, &plugins)
    }

    fn load_blob<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let text = match self.storage.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!(key = key, error = %e, "Storage read failed, using empty default");
                return T::default();
            }
        };

        match decode(&text) {
            Ok(value) => value,
            Err(reason) => {
                warn!(key = key, reason = %reason, "Discarding unreadable blob");
                T::default()
            }
        }
    }

    fn save_blob<T: Serialize>(&self, key: &str, data: &T) -> MarketplaceResult<()> {
        let text = serde_json::to_string(&EnvelopeRef {
            schema_version: SCHEMA_VERSION,
            data,
        })?;
        self.storage.set(key, &text)
    }
}

/// Accepts the versioned envelope and the legacy bare blob.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;

    let is_envelope = value.get("schemaVersion").is_some() && value.get("data").is_some();
    if !is_envelope {
        return serde_json::from_value(value).map_err(|e| e.to_string());
    }

    let envelope: Envelope = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if envelope.schema_version > SCHEMA_VERSION {
        return Err(format!(
            "schema version {} is newer than supported {}",
            envelope.schema_version, SCHEMA_VERSION
        ));
    }
    serde_json::from_value(envelope.data).map_err(|e| e.to_string())
}
