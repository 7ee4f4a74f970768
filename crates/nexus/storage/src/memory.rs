//! In-memory key-value store.
//!
//! Deterministic and test-friendly; contents vanish with the process.

use crate::traits::KeyValueStore;
use crate::StorageResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> StorageResult<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
