//! # Key-Value Storage Adapters
//!
//! Device-local storage behind the `KeyValueStorage` port: a JSON file on
//! disk for real use, plain memory for tests. The file holds a single flat
//! string-to-string map; the whole file is rewritten on every set.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use domains::error::{AppError, Result};
use domains::ports::KeyValueStorage;
use tokio::fs;
use tracing::warn;

pub struct FileKeyValueStorage {
    path: PathBuf,
}

impl FileKeyValueStorage {
    pub fn new(path: PathBuf) -> Self {
        FileKeyValueStorage { path }
    }

    /// A missing or unreadable file is treated as empty; a corrupt file is
    /// reset rather than surfaced.
    async fn read_map(&self) -> HashMap<String, String> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %self.path.display(), %err, "corrupt device storage file, resetting");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }
}

#[async_trait]
impl KeyValueStorage for FileKeyValueStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map().await.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map().await;
        map.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| AppError::Internal(format!("device storage mkdir: {err}")))?;
        }
        let encoded = serde_json::to_string_pretty(&map)?;
        fs::write(&self.path, encoded)
            .await
            .map_err(|err| AppError::Internal(format!("device storage write: {err}")))
    }
}

/// In-memory stand-in used by tests and the demo binary.
#[derive(Default)]
pub struct MemoryKeyValueStorage {
    items: DashMap<String, String>,
}

impl MemoryKeyValueStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryKeyValueStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).map(|v| v.clone()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
