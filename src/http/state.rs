use crate::analysis::{Classifier, ImageFetcher, UploadDir};
use crate::history::{AnalysisRecorder, LiveLedger};
use crate::recommendation::RecommendationRotator;
use crate::session::{FileBackend, FileSessionStore, SessionJanitor};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Per-user session histories
    pub sessions: Arc<FileSessionStore>,

    /// Global history of the live feed
    pub live: Arc<LiveLedger>,

    pub recorder: Arc<AnalysisRecorder<FileBackend>>,
    pub rotator: RecommendationRotator,

    /// Shared with the background cleanup scheduler
    pub janitor: Arc<SessionJanitor<FileBackend>>,

    pub classifier: Arc<dyn Classifier>,
    pub fetcher: Arc<dyn ImageFetcher>,

    /// Served under `/static/uploads`
    pub uploads: UploadDir,
}

impl AppState {
    pub fn new(
        sessions: Arc<FileSessionStore>,
        live: Arc<LiveLedger>,
        rotator: RecommendationRotator,
        classifier: Arc<dyn Classifier>,
        fetcher: Arc<dyn ImageFetcher>,
        uploads: UploadDir,
        retention_hours: u32,
    ) -> Self {
        let recorder = Arc::new(AnalysisRecorder::new(
            Arc::clone(&sessions),
            Arc::clone(&live),
        ));
        let janitor = Arc::new(SessionJanitor::new(
            Arc::clone(&sessions),
            rotator.clone(),
            retention_hours,
        ));

        Self {
            sessions,
            live,
            recorder,
            rotator,
            janitor,
            classifier,
            fetcher,
            uploads,
        }
    }
}
