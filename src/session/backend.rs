use super::error::StoreError;
use super::record::SessionRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Longest session id accepted by the store
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Session ids double as storage keys (file names), so only a safe
/// character set is accepted
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Key-value storage for session records
///
/// Implementations:
/// - [`MemoryBackend`]: in-process map (the store's cache, and a fake for tests)
/// - [`super::FileBackend`]: one JSON file per session
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Load a record; `Ok(None)` if absent, `Err(Corrupt)` if unparsable
    async fn read(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Insert or replace a record
    async fn write(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Remove a record; returns whether anything was removed
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;

    /// Ids of every stored record, readable or not
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn insert(&self, record: SessionRecord) {
        self.records
            .write()
            .await
            .insert(record.session_id.clone(), record);
    }

    pub async fn evict(&self, id: &str) -> bool {
        self.records.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn read(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.get(id).await)
    }

    async fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.insert(record.clone()).await;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.evict(id).await)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records.read().await.keys().cloned().collect())
    }
}
