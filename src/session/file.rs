use super::backend::{is_valid_session_id, SessionBackend};
use super::error::StoreError;
use super::record::SessionRecord;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const FILE_PREFIX: &str = "session_";
const FILE_SUFFIX: &str = ".json";

/// One pretty-printed JSON file per session: `<dir>/session_<id>.json`
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) the sessions directory
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io("create directory for", "*", e))?;

        info!("Session files stored in {}", dir.display());

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `id`
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}{}{}", FILE_PREFIX, id, FILE_SUFFIX))
    }

    fn checked_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if is_valid_session_id(id) {
            Ok(self.path_for(id))
        } else {
            Err(StoreError::InvalidId(id.to_string()))
        }
    }
}

#[async_trait]
impl SessionBackend for FileBackend {
    async fn read(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        if !is_valid_session_id(id) {
            return Ok(None);
        }

        let bytes = match fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io("read", id, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                id: id.to_string(),
                source,
            })
    }

    async fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let id = record.session_id.as_str();
        let path = self.checked_path(id)?;

        let payload =
            serde_json::to_vec_pretty(record).map_err(|source| StoreError::Serialize {
                id: id.to_string(),
                source,
            })?;

        // Write to a sibling temp file, then rename over the target
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, payload)
            .await
            .map_err(|e| StoreError::io("write", id, e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StoreError::io("replace", id, e))?;

        debug!("Wrote session file {}", path.display());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.checked_path(id)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("remove", id, e)),
        }
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(StoreError::List)?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(StoreError::List)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            if let Some(id) = name
                .strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            {
                if is_valid_session_id(id) {
                    ids.push(id.to_string());
                }
            }
        }

        Ok(ids)
    }
}
