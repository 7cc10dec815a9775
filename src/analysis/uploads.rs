use crate::session::ImageSource;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Directory where analyzed images are kept and served from
#[derive(Debug, Clone)]
pub struct UploadDir {
    dir: PathBuf,
    public_prefix: String,
}

impl UploadDir {
    /// `public_prefix` is the URL path the directory is served under,
    /// e.g. `/static/uploads`
    pub async fn open(dir: impl Into<PathBuf>, public_prefix: &str) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;

        Ok(Self {
            dir,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store a client upload under a unique, sanitized name
    pub async fn save_upload(&self, filename: &str, bytes: &[u8]) -> Result<ImageSource> {
        let name = format!("{}_{}", short_id(), sanitize_filename(filename));
        let (stored_path, public_path) = self.write(&name, bytes).await?;

        Ok(ImageSource::Upload {
            filename: filename.to_string(),
            stored_path,
            public_path,
        })
    }

    /// Store an image downloaded from `url`
    pub async fn save_fetched(&self, url: &str, bytes: &[u8]) -> Result<ImageSource> {
        let name = generated_name("jpg");
        let (stored_path, public_path) = self.write(&name, bytes).await?;

        Ok(ImageSource::ExternalUrl {
            url: url.to_string(),
            filename: name,
            stored_path,
            public_path,
        })
    }

    /// Copy an image that already exists on this machine
    pub async fn copy_local(&self, original: &Path) -> Result<ImageSource> {
        let extension = original
            .extension()
            .and_then(|e| e.to_str())
            .map(sanitize_filename)
            .unwrap_or_else(|| "jpg".to_string());
        let name = generated_name(&extension);
        let stored_path = self.dir.join(&name);

        fs::copy(original, &stored_path)
            .await
            .with_context(|| format!("Failed to copy {}", original.display()))?;

        Ok(ImageSource::LocalPath {
            original_path: original.to_path_buf(),
            public_path: self.public_path(&name),
            filename: name,
            stored_path,
        })
    }

    /// Delete a stored image that will not be recorded. Only files inside
    /// this directory are touched.
    pub async fn discard(&self, image: &ImageSource) {
        let path = image.stored_path();
        if path.parent() != Some(self.dir.as_path()) {
            warn!("Refusing to discard {} outside uploads", path.display());
            return;
        }
        if let Err(e) = fs::remove_file(path).await {
            warn!("Failed to discard {}: {}", path.display(), e);
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(PathBuf, String)> {
        let stored_path = self.dir.join(name);
        fs::write(&stored_path, bytes)
            .await
            .with_context(|| format!("Failed to save image {}", stored_path.display()))?;

        Ok((stored_path, self.public_path(name)))
    }

    fn public_path(&self, name: &str) -> String {
        format!("{}/{}", self.public_prefix, name)
    }
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn generated_name(extension: &str) -> String {
    format!(
        "image_{}_{}.{}",
        chrono::Utc::now().timestamp_millis(),
        short_id(),
        extension
    )
}

/// Keep only the final path component, restricted to a safe character set
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload.jpg".to_string()
    } else {
        cleaned.to_string()
    }
}
