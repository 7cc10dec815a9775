use super::backend::{is_valid_session_id, MemoryBackend, SessionBackend};
use super::error::StoreError;
use super::file::FileBackend;
use super::record::{AnalysisEntry, Classification, ImageSource, SessionRecord};
use super::stats::{SessionStats, SessionSummary};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Session store backed by one JSON file per session
pub type FileSessionStore = SessionStore<FileBackend>;

/// Write-through session store.
///
/// The backend is the source of truth; the in-memory cache only saves a read
/// for sessions that were already seen by this process. Every
/// read-modify-write of one session runs under that session's lock, so
/// appends, touches and the expiration sweep never interleave on the same
/// record. Different sessions proceed in parallel.
pub struct SessionStore<B: SessionBackend> {
    cache: MemoryBackend,
    backend: B,
    locks: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<B: SessionBackend> SessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            cache: MemoryBackend::new(),
            backend,
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of sessions currently held in memory
    pub async fn cached_len(&self) -> usize {
        self.cache.len().await
    }

    /// Create a session, generating an id when none is given.
    ///
    /// An existing record with the same id is replaced by an empty one.
    pub async fn create(&self, id: Option<String>) -> Result<String, StoreError> {
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if !is_valid_session_id(&id) {
            return Err(StoreError::InvalidId(id));
        }

        let lock = self.lock_for(&id);
        let guard = lock.lock().await;

        let record = SessionRecord::new(id.clone());
        let written = self.backend.write(&record).await;
        if written.is_ok() {
            self.cache.insert(record).await;
        }

        drop(guard);
        drop(lock);
        self.release_lock(&id);

        match written {
            Ok(()) => {
                info!("Session created: {}", id);
                Ok(id)
            }
            Err(e) => {
                error!("Failed to create session {}: {}", id, e);
                Err(e)
            }
        }
    }

    /// Fetch a session, loading it into the cache on first access.
    ///
    /// Missing, invalid and unreadable sessions all yield `None`.
    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        if let Some(record) = self.cache.get(id).await {
            return Some(record);
        }
        if !is_valid_session_id(id) {
            return None;
        }

        let lock = self.lock_for(id);
        let guard = lock.lock().await;
        let record = self.load(id).await;

        drop(guard);
        drop(lock);
        self.release_lock(id);
        record
    }

    /// Mark a session as active now. Returns false if it does not exist or
    /// could not be saved.
    pub async fn touch(&self, id: &str) -> bool {
        self.update(id, "touch", SessionRecord::touch).await
    }

    /// Append one analysis to an existing session.
    ///
    /// Never creates the session: returns false if it does not exist, and
    /// also when the updated record could not be saved.
    pub async fn append_analysis(
        &self,
        id: &str,
        image: ImageSource,
        classification: &Classification,
        recommendation: String,
    ) -> bool {
        let entry = AnalysisEntry::new(image, classification, recommendation);
        let saved = self
            .update(id, "append analysis to", |record| record.push(entry))
            .await;

        if saved {
            info!(
                "Analysis added to session {}: {} ({})",
                id,
                classification.label,
                classification.confidence_percentage()
            );
        }
        saved
    }

    /// Remove sessions idle for longer than `retention_hours`; returns how
    /// many were removed.
    pub async fn sweep_expired(&self, retention_hours: u32) -> usize {
        match self
            .try_sweep_expired(Duration::hours(i64::from(retention_hours)))
            .await
        {
            Ok(removed) => removed.len(),
            Err(e) => {
                error!("Session sweep failed: {}", e);
                0
            }
        }
    }

    /// Remove sessions whose last activity is older than `retention`.
    ///
    /// Unreadable records count as expired. Returns the removed ids; fails
    /// only when the set of stored sessions cannot be listed.
    pub async fn try_sweep_expired(&self, retention: Duration) -> Result<Vec<String>, StoreError> {
        let cutoff = Utc::now() - retention;
        let ids = self.backend.list_ids().await?;
        let mut removed = Vec::new();

        for id in ids {
            let lock = self.lock_for(&id);
            let guard = lock.lock().await;

            let expired = match self.read_for_sweep(&id).await {
                Ok(Some(record)) => record.last_activity < cutoff,
                Ok(None) => {
                    // Removed since listing
                    self.cache.evict(&id).await;
                    false
                }
                Err(e) => {
                    warn!("Removing unreadable session {}: {}", id, e);
                    true
                }
            };

            if expired {
                match self.backend.remove(&id).await {
                    Ok(true) => {
                        info!("Session expired and removed: {}", id);
                        removed.push(id.clone());
                    }
                    Ok(false) => {}
                    Err(e) => error!("Failed to remove expired session {}: {}", id, e),
                }
                self.cache.evict(&id).await;
            }

            drop(guard);
            drop(lock);
            self.release_lock(&id);
        }

        if !removed.is_empty() {
            info!("Session sweep removed {} sessions", removed.len());
        }
        Ok(removed)
    }

    /// Count readable sessions and their analyses without touching the cache
    pub async fn stats(&self) -> SessionStats {
        self.summaries()
            .await
            .iter()
            .fold(SessionStats::default(), |mut stats, summary| {
                stats.active_sessions += 1;
                stats.total_analyses += summary.total_analyses;
                stats
            })
    }

    /// One summary per readable session
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let ids = match self.backend.list_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to list sessions for stats: {}", e);
                return Vec::new();
            }
        };

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            let record = match self.cache.get(&id).await {
                Some(record) => record,
                None => match self.backend.read(&id).await {
                    Ok(Some(record)) => record,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("Skipping session {} in stats: {}", id, e);
                        continue;
                    }
                },
            };

            summaries.push(SessionSummary {
                total_analyses: record.total_analyses(),
                session_id: record.session_id,
                created: record.created,
                last_activity: record.last_activity,
            });
        }
        summaries
    }

    /// Read-modify-persist one record under its lock. The cache is only
    /// updated once the backend write succeeded.
    async fn update(
        &self,
        id: &str,
        op: &'static str,
        mutate: impl FnOnce(&mut SessionRecord),
    ) -> bool {
        if !is_valid_session_id(id) {
            warn!("Cannot {} session with invalid id {:?}", op, id);
            return false;
        }

        let lock = self.lock_for(id);
        let guard = lock.lock().await;
        let saved = self.update_locked(id, op, mutate).await;

        drop(guard);
        drop(lock);
        self.release_lock(id);
        saved
    }

    async fn update_locked(
        &self,
        id: &str,
        op: &'static str,
        mutate: impl FnOnce(&mut SessionRecord),
    ) -> bool {
        let Some(mut record) = self.load(id).await else {
            warn!("Cannot {} session {}: not found", op, id);
            return false;
        };

        mutate(&mut record);

        if let Err(e) = self.backend.write(&record).await {
            error!("Failed to {} session {}: {}", op, id, e);
            return false;
        }
        self.cache.insert(record).await;
        true
    }

    /// Cache, then backend. Caller must hold the session lock.
    async fn load(&self, id: &str) -> Option<SessionRecord> {
        if let Some(record) = self.cache.get(id).await {
            return Some(record);
        }

        match self.backend.read(id).await {
            Ok(Some(record)) => {
                debug!("Loaded session {} into cache", id);
                self.cache.insert(record.clone()).await;
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Session {} could not be loaded: {}", id, e);
                None
            }
        }
    }

    /// Backend read for the sweep; I/O failures get one retry before the
    /// record is given up as unreadable
    async fn read_for_sweep(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        match self.backend.read(id).await {
            Err(StoreError::Io { source, .. }) => {
                debug!("Retrying read of session {} after: {}", id, source);
                self.backend.read(id).await
            }
            other => other,
        }
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    /// Drop the lock entry of `id` once nobody else holds or waits on it
    fn release_lock(&self, id: &str) {
        let mut locks = self.locks.lock();
        if locks.get(id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory backend whose first `failing_reads` reads fail with an I/O error
    struct FlakyReads {
        inner: MemoryBackend,
        failing_reads: usize,
        reads: AtomicUsize,
    }

    impl FlakyReads {
        fn new(inner: MemoryBackend, failing_reads: usize) -> Self {
            Self {
                inner,
                failing_reads,
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SessionBackend for FlakyReads {
        async fn read(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
            if self.reads.fetch_add(1, Ordering::SeqCst) < self.failing_reads {
                let busy = std::io::Error::new(std::io::ErrorKind::WouldBlock, "file busy");
                return Err(StoreError::io("read", id, busy));
            }
            self.inner.read(id).await
        }

        async fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
            self.inner.write(record).await
        }

        async fn remove(&self, id: &str) -> Result<bool, StoreError> {
            self.inner.remove(id).await
        }

        async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
            self.inner.list_ids().await
        }
    }

    fn upload(name: &str) -> ImageSource {
        ImageSource::Upload {
            filename: name.to_string(),
            stored_path: PathBuf::from(format!("uploads/{}", name)),
            public_path: format!("/static/uploads/{}", name),
        }
    }

    fn glass() -> Classification {
        Classification {
            label: Material::Glass,
            confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn test_create_caches_record() {
        let store = SessionStore::new(MemoryBackend::new());
        let id = store.create(None).await.unwrap();

        assert_eq!(store.cached_len().await, 1);
        assert!(store.backend().get(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_id() {
        let store = SessionStore::new(MemoryBackend::new());
        let result = store.create(Some("bad id!".to_string())).await;

        assert!(matches!(result, Err(StoreError::InvalidId(_))));
        assert!(store.backend().is_empty().await);
    }

    #[tokio::test]
    async fn test_get_loads_from_backend_on_cache_miss() {
        let backend = MemoryBackend::new();
        backend.insert(SessionRecord::new("known")).await;
        let store = SessionStore::new(backend);

        assert_eq!(store.cached_len().await, 0);
        assert!(store.get("known").await.is_some());
        assert_eq!(store.cached_len().await, 1);
    }

    #[tokio::test]
    async fn test_touch_missing_session() {
        let store = SessionStore::new(MemoryBackend::new());
        assert!(!store.touch("ghost").await);
        assert!(store.backend().is_empty().await);
    }

    #[tokio::test]
    async fn test_append_updates_backend_and_cache() {
        let store = SessionStore::new(MemoryBackend::new());
        let id = store.create(None).await.unwrap();

        assert!(
            store
                .append_analysis(&id, upload("a.jpg"), &glass(), "Rinse it".to_string())
                .await
        );

        let stored = store.backend().get(&id).await.unwrap();
        let cached = store.get(&id).await.unwrap();
        assert_eq!(stored, cached);
        assert_eq!(stored.total_analyses(), 1);
        assert_eq!(stored.history.analyses[0].recommendation, "Rinse it");
    }

    #[tokio::test]
    async fn test_locks_are_released_after_operations() {
        let store = SessionStore::new(MemoryBackend::new());
        let id = store.create(None).await.unwrap();
        store.touch(&id).await;
        store.get("unknown").await;

        assert!(store.locks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_retries_transient_read_error() {
        let inner = MemoryBackend::new();
        inner.insert(SessionRecord::new("busy")).await;
        let store = SessionStore::new(FlakyReads::new(inner, 1));

        assert_eq!(store.sweep_expired(1).await, 0);
        assert_eq!(store.backend().reads.load(Ordering::SeqCst), 2);
        assert!(store.backend().inner.get("busy").await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_removes_record_failing_twice() {
        let inner = MemoryBackend::new();
        inner.insert(SessionRecord::new("gone-bad")).await;
        let store = SessionStore::new(FlakyReads::new(inner, 2));

        assert_eq!(store.sweep_expired(1).await, 1);
        assert_eq!(store.backend().reads.load(Ordering::SeqCst), 2);
        assert!(store.backend().inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_locks_are_released_after_sweep() {
        let backend = MemoryBackend::new();
        backend
            .insert(SessionRecord::new_at("old", Utc::now() - Duration::hours(5)))
            .await;
        let store = SessionStore::new(backend);

        assert_eq!(store.sweep_expired(1).await, 1);
        assert!(store.locks.lock().is_empty());
    }
}
