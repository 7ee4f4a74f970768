use crate::StorageResult;
use async_trait::async_trait;

/// Durable string-valued key-value storage.
///
/// Values are opaque to the store; the snapshot layer writes JSON.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Create or overwrite a value.
    async fn put(&self, key: &str, value: String) -> StorageResult<()>;
}
