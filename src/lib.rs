pub mod analysis;
pub mod config;
pub mod history;
pub mod http;
pub mod material;
pub mod recommendation;
pub mod session;

pub use analysis::{Classifier, CommandClassifier, HttpFetcher, ImageFetcher, UploadDir};
pub use config::Config;
pub use history::{AnalysisRecorder, LiveLedger, LiveLedgerRecord};
pub use http::{create_router, AppState};
pub use material::Material;
pub use recommendation::{RecommendationRotator, Scope, UsageStore};
pub use session::{
    AnalysisEntry, Classification, CleanupHandle, CleanupScheduler, FileBackend, FileSessionStore,
    ImageSource, SessionJanitor, SessionRecord, SessionStats, SessionStore, StoreError, Sweeper,
};
