use super::live::LiveLedger;
use crate::session::{AnalysisEntry, Classification, ImageSource, SessionBackend, SessionStore};
use std::sync::Arc;
use tracing::{error, info};

/// Routes finished analyses into a session's history or the live ledger.
///
/// Recording is best effort: failures are logged and reported as `false`,
/// never as errors, so the classification itself is still returned to the
/// client.
pub struct AnalysisRecorder<B: SessionBackend> {
    store: Arc<SessionStore<B>>,
    live: Arc<LiveLedger>,
}

impl<B: SessionBackend> AnalysisRecorder<B> {
    pub fn new(store: Arc<SessionStore<B>>, live: Arc<LiveLedger>) -> Self {
        Self { store, live }
    }

    /// Append to an existing session; the session is never created here
    pub async fn record_session(
        &self,
        session_id: &str,
        image: ImageSource,
        classification: &Classification,
        recommendation: &str,
    ) -> bool {
        let saved = self
            .store
            .append_analysis(session_id, image, classification, recommendation.to_string())
            .await;

        if !saved {
            error!(
                "Analysis for session {} was not recorded ({} {})",
                session_id,
                classification.label,
                classification.confidence_percentage()
            );
        }
        saved
    }

    /// Append to the global live ledger
    pub async fn record_live(
        &self,
        image: ImageSource,
        classification: &Classification,
        recommendation: &str,
    ) -> bool {
        let entry = AnalysisEntry::new(image, classification, recommendation.to_string());

        match self.live.append(entry).await {
            Ok(total) => {
                info!(
                    "Live analysis recorded: {} ({}), {} total",
                    classification.label,
                    classification.confidence_percentage(),
                    total
                );
                true
            }
            Err(e) => {
                error!("Failed to record live analysis: {:#}", e);
                false
            }
        }
    }
}
