use crate::material::Material;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where an analyzed image came from and where it was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Uploaded by the client
    Upload {
        filename: String,
        stored_path: PathBuf,
        public_path: String,
    },

    /// Downloaded from an http(s) URL
    ExternalUrl {
        url: String,
        filename: String,
        stored_path: PathBuf,
        public_path: String,
    },

    /// Read from a path on the server
    LocalPath {
        original_path: PathBuf,
        filename: String,
        stored_path: PathBuf,
        public_path: String,
    },
}

impl ImageSource {
    /// Where the image was saved on this machine
    pub fn stored_path(&self) -> &Path {
        match self {
            ImageSource::Upload { stored_path, .. }
            | ImageSource::ExternalUrl { stored_path, .. }
            | ImageSource::LocalPath { stored_path, .. } => stored_path,
        }
    }

    pub fn public_path(&self) -> &str {
        match self {
            ImageSource::Upload { public_path, .. }
            | ImageSource::ExternalUrl { public_path, .. }
            | ImageSource::LocalPath { public_path, .. } => public_path,
        }
    }
}

/// Output of the classification model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Material,

    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,
}

impl Classification {
    /// Confidence as a display percentage, e.g. `"87.5%"`
    pub fn confidence_percentage(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub label: Material,
    pub confidence: f32,
    pub confidence_percentage: String,
}

impl From<&Classification> for AnalysisResult {
    fn from(c: &Classification) -> Self {
        Self {
            label: c.label,
            confidence: c.confidence,
            confidence_percentage: c.confidence_percentage(),
        }
    }
}

/// A single analysis in a session or in the live ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub timestamp: DateTime<Utc>,
    pub image: ImageSource,
    pub result: AnalysisResult,
    pub recommendation: String,
}

impl AnalysisEntry {
    pub fn new(image: ImageSource, classification: &Classification, recommendation: String) -> Self {
        Self {
            timestamp: Utc::now(),
            image,
            result: AnalysisResult::from(classification),
            recommendation,
        }
    }
}

/// Ordered analyses plus their count.
///
/// The count is only changed through [`History::push`], so it always equals
/// `analyses.len()` for histories built by this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub total_images_analyzed: usize,
    pub analyses: Vec<AnalysisEntry>,
}

impl History {
    pub fn push(&mut self, entry: AnalysisEntry) {
        self.analyses.push(entry);
        self.total_images_analyzed = self.analyses.len();
    }
}

/// Persisted state of one user session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub created: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(flatten)]
    pub history: History,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self::new_at(session_id, Utc::now())
    }

    /// New empty record created (and last active) at `at`
    pub fn new_at(session_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            created: at,
            last_activity: at,
            history: History::default(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn push(&mut self, entry: AnalysisEntry) {
        self.history.push(entry);
        self.touch();
    }

    pub fn total_analyses(&self) -> usize {
        self.history.total_images_analyzed
    }
}
