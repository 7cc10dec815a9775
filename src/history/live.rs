use crate::session::{AnalysisEntry, History};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, warn};

const DESCRIPTION: &str = "Persistent history of live analyses, never cleared";

/// Global history of the live analysis feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveLedgerRecord {
    pub created: DateTime<Utc>,
    pub description: String,
    #[serde(flatten)]
    pub history: History,
}

impl LiveLedgerRecord {
    fn new() -> Self {
        Self {
            created: Utc::now(),
            description: DESCRIPTION.to_string(),
            history: History::default(),
        }
    }

    pub fn total_analyses(&self) -> usize {
        self.history.total_images_analyzed
    }
}

/// Single-file store for the live ledger.
///
/// The file is created on first use and never expired or reset.
pub struct LiveLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LiveLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the ledger file if it does not exist yet
    pub async fn init(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.init_locked().await
    }

    /// Append one analysis and persist the ledger
    pub async fn append(&self, entry: AnalysisEntry) -> Result<usize> {
        let _guard = self.lock.lock().await;
        self.init_locked().await?;

        let mut ledger = self
            .load()
            .await?
            .context("Live ledger disappeared after init")?;
        ledger.history.push(entry);
        self.save(&ledger).await?;

        Ok(ledger.total_analyses())
    }

    /// Current ledger, or `None` if it is missing or unreadable
    pub async fn read(&self) -> Option<LiveLedgerRecord> {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("Live ledger unreadable: {:#}", e);
                None
            }
        }
    }

    /// Number of live analyses recorded so far (0 if unavailable)
    pub async fn total(&self) -> usize {
        self.read().await.map_or(0, |l| l.total_analyses())
    }

    async fn init_locked(&self) -> Result<()> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        self.save(&LiveLedgerRecord::new()).await?;

        info!("Live ledger created at {}", self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Option<LiveLedgerRecord>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        let ledger = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(ledger))
    }

    async fn save(&self, ledger: &LiveLedgerRecord) -> Result<()> {
        let payload = serde_json::to_vec_pretty(ledger)?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, payload)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::session::{Classification, ImageSource};
    use tempfile::TempDir;

    fn entry() -> AnalysisEntry {
        AnalysisEntry::new(
            ImageSource::ExternalUrl {
                url: "https://example.com/can.png".to_string(),
                filename: "image_1.jpg".to_string(),
                stored_path: PathBuf::from("uploads/image_1.jpg"),
                public_path: "/static/uploads/image_1.jpg".to_string(),
            },
            &Classification {
                label: Material::Cans,
                confidence: 0.5,
            },
            "Squash it".to_string(),
        )
    }

    #[tokio::test]
    async fn test_append_creates_ledger_lazily() {
        let dir = TempDir::new().unwrap();
        let ledger = LiveLedger::new(dir.path().join("live.json"));

        assert!(ledger.read().await.is_none());
        assert_eq!(ledger.total().await, 0);

        assert_eq!(ledger.append(entry()).await.unwrap(), 1);
        assert_eq!(ledger.append(entry()).await.unwrap(), 2);

        let record = ledger.read().await.unwrap();
        assert_eq!(record.history.analyses.len(), 2);
        assert_eq!(record.description, DESCRIPTION);
    }

    #[tokio::test]
    async fn test_init_never_resets_existing_ledger() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live.json");

        let ledger = LiveLedger::new(&path);
        ledger.append(entry()).await.unwrap();
        let created = ledger.read().await.unwrap().created;

        // A fresh instance, as after a restart
        let restarted = LiveLedger::new(&path);
        restarted.init().await.unwrap();

        let record = restarted.read().await.unwrap();
        assert_eq!(record.created, created);
        assert_eq!(record.total_analyses(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_ledger_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live.json");
        std::fs::write(&path, "garbage").unwrap();

        let ledger = LiveLedger::new(&path);
        assert!(ledger.read().await.is_none());
        assert!(ledger.append(entry()).await.is_err());
    }
}
