use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub sessions: SessionsConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for sessions, uploads and the live ledger
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// Sessions idle for longer than this are removed by the sweep
    pub retention_hours: u32,

    /// Seconds between two automatic sweeps
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Executable of the external model runner
    pub command: String,

    /// Arguments passed before the image path
    #[serde(default)]
    pub args: Vec<String>,
}

impl StorageConfig {
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn live_ledger_file(&self) -> PathBuf {
        self.root.join("historial_live.json")
    }
}

impl Config {
    /// Load configuration from `path` (extension optional, file optional),
    /// then apply `RECYCLE__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "recycle-classifier")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 5000)?
            .set_default("storage.root", "static")?
            .set_default("sessions.retention_hours", 24)?
            .set_default("sessions.sweep_interval_secs", 3600)?
            .set_default("classifier.command", "python3")?
            .set_default("classifier.args", vec!["predict.py"])?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("RECYCLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let cfg: Self = settings.try_deserialize()?;
        if cfg.sessions.sweep_interval_secs == 0 {
            bail!("sessions.sweep_interval_secs must be greater than zero");
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load("does/not/exist").unwrap();

        assert_eq!(cfg.service.http.port, 5000);
        assert_eq!(cfg.sessions.retention_hours, 24);
        assert_eq!(cfg.sessions.sweep_interval_secs, 3600);
        assert_eq!(cfg.storage.sessions_dir(), PathBuf::from("static/sessions"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(
            &path,
            "[sessions]\nretention_hours = 2\nsweep_interval_secs = 60\n[storage]\nroot = \"/tmp/data\"\n",
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(cfg.sessions.retention_hours, 2);
        assert_eq!(cfg.sessions.sweep_interval_secs, 60);
        assert_eq!(
            cfg.storage.live_ledger_file(),
            PathBuf::from("/tmp/data/historial_live.json")
        );
        assert_eq!(cfg.classifier.command, "python3");
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(&path, "[sessions]\nsweep_interval_secs = 0\n").unwrap();

        let err = Config::load(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("sweep_interval_secs"));
    }
}
