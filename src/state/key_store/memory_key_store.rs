use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use itertools::Itertools;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;

use super::KeyInfo;
use super::KeyStore;

/// A key store held in memory, optionally loaded from and saved to a JSON
/// file containing an array of [`KeyInfo`] records.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, KeyInfo>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key_info`, replacing any key with the same id. Returns the
    /// replaced record.
    pub async fn put(&self, key_info: KeyInfo) -> Option<KeyInfo> {
        self.keys
            .write()
            .await
            .insert(key_info.id.clone(), key_info)
    }

    pub async fn remove(&self, key_id: &str) -> Option<KeyInfo> {
        self.keys.write().await.remove(key_id)
    }

    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }

    /// Read the store from `key_store_file`. A file that does not exist yields
    /// an empty store.
    pub async fn read_from_file(key_store_file: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(key_store_file).await? {
            info!(
                "No key store at {}, starting with an empty one",
                key_store_file.display()
            );
            return Ok(Self::new());
        }

        let content = tokio::fs::read_to_string(key_store_file)
            .await
            .with_context(|| {
                format!(
                    "Failed to read key store from {}",
                    key_store_file.to_string_lossy()
                )
            })?;
        let records: Vec<KeyInfo> = serde_json::from_str(&content).with_context(|| {
            format!(
                "Failed to decode key store from {}",
                key_store_file.to_string_lossy()
            )
        })?;
        debug!(
            "Read {} keys from {}",
            records.len(),
            key_store_file.display()
        );

        let keys = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Ok(Self {
            keys: RwLock::new(keys),
        })
    }

    /// Write all records to `key_store_file` as JSON, sorted by id.
    pub async fn save_to_disk(&self, key_store_file: &Path) -> Result<()> {
        let records = self
            .keys
            .read()
            .await
            .values()
            .sorted_by(|a, b| a.id.cmp(&b.id))
            .cloned()
            .collect_vec();
        let content = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(key_store_file, content)
            .await
            .with_context(|| {
                format!(
                    "Failed to write key store to {}",
                    key_store_file.to_string_lossy()
                )
            })
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get_info(&self, key_id: &str) -> Option<KeyInfo> {
        self.keys.read().await.get(key_id).cloned()
    }
}
